//! Wire message schema for talking to the Master.
//!
//! Every message on the wire is one framed envelope:
//!
//! ```text
//! {"v": 1, "op": "<tag>", "payload": {...}}
//! ```
//!
//! Requests are a tagged union keyed by the operation tag (`client`, `filter`,
//! `fetchProducts`, `purchase`, `rate`); replies are a tagged union of the
//! three shapes the Master produces (store list, product list, status string).
//! A status string carrying a business rejection is still a successful reply;
//! callers distinguish it by inspecting the string.

use serde::{Deserialize, Serialize};

use crate::models::{FilterRequest, Product, Purchase, Store};

/// Version stamped into every envelope. Replies carrying a different version
/// are rejected as protocol errors.
pub const PROTOCOL_VERSION: u8 = 1;

/// Versioned envelope wrapping a request or reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub v: u8,
    #[serde(flatten)]
    pub msg: T,
}

impl<T> Envelope<T> {
    /// Wrap a message with the current protocol version.
    pub fn new(msg: T) -> Self {
        Self {
            v: PROTOCOL_VERSION,
            msg,
        }
    }
}

/// A request to the Master, discriminated by operation tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "payload")]
pub enum Request {
    /// Unfiltered nearby-store search.
    #[serde(rename = "client")]
    Client(FilterRequest),

    /// Filtered store search with user-supplied criteria.
    #[serde(rename = "filter")]
    Filter(FilterRequest),

    /// Catalog fetch for one store.
    #[serde(rename = "fetchProducts")]
    FetchProducts { store: String },

    /// Purchase submission: the order, then the store it targets.
    #[serde(rename = "purchase")]
    Purchase { order: Purchase, store: String },

    /// Rating submission for one store.
    #[serde(rename = "rate")]
    Rate { store: String, rating: u8 },
}

impl Request {
    /// The operation tag this request carries on the wire.
    pub fn op(&self) -> &'static str {
        match self {
            Request::Client(_) => "client",
            Request::Filter(_) => "filter",
            Request::FetchProducts { .. } => "fetchProducts",
            Request::Purchase { .. } => "purchase",
            Request::Rate { .. } => "rate",
        }
    }
}

/// A reply from the Master, discriminated by payload shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "payload")]
pub enum Reply {
    #[serde(rename = "stores")]
    Stores(Vec<Store>),

    #[serde(rename = "products")]
    Products(Vec<Product>),

    /// Human-readable status string. Business rejections ("out of stock")
    /// arrive here, not as a distinct error shape.
    #[serde(rename = "status")]
    Status(String),
}

impl Reply {
    /// Short label for error messages when a reply has the wrong shape.
    pub fn kind(&self) -> &'static str {
        match self {
            Reply::Stores(_) => "stores",
            Reply::Products(_) => "products",
            Reply::Status(_) => "status",
        }
    }
}

//! Network layer for communication with the Master.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐          TCP           ┌─────────────────┐
//! │  BiteFinder     │  ◄────────────────────►│     Master      │
//! │  (MasterClient) │  framed JSON envelopes │   (backend)     │
//! └─────────────────┘                        └─────────────────┘
//! ```
//!
//! Each operation opens its own connection, performs exactly one framed
//! request/response exchange, and closes the connection. Messages use
//! `Content-Length` framing around the versioned envelopes defined in
//! [`crate::protocol`].
//!
//! # Usage
//!
//! ```ignore
//! use bitefinder::config::ClientConfig;
//! use bitefinder::net::MasterClient;
//!
//! let client = MasterClient::new(&ClientConfig::from_env());
//! let stores = client.nearby_stores(37.98, 23.73).await?;
//! ```

mod client;
mod framing;

pub use client::{ClientError, MasterClient};
pub use framing::{read_frame, write_frame};

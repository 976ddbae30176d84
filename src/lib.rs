//! BiteFinder Client Library
//!
//! Async client for the BiteFinder store-locator and ordering service. The
//! backend ("the Master") performs geo-filtering, catalog lookup, purchasing
//! and rating behind a framed request/response protocol over TCP.
//!
//! - `config` - client configuration with environment overrides
//! - `models` - validated domain values (Store, Product, Purchase, FilterRequest)
//! - `protocol` - versioned, tagged message envelopes
//! - `net` - the per-operation connection client
//! - `runner` - off-thread execution with originating-thread completion delivery
//!
//! # Usage
//!
//! ```ignore
//! use bitefinder::config::ClientConfig;
//! use bitefinder::net::MasterClient;
//! use bitefinder::runner::TaskRunner;
//!
//! let config = ClientConfig::from_env();
//! let client = MasterClient::new(&config);
//! let runner = TaskRunner::new(&config)?;
//!
//! runner.submit(
//!     async move { client.nearby_stores(37.98, 23.73).await },
//!     |outcome| match outcome {
//!         Ok(stores) => render(stores),
//!         Err(e) => show_error(&e),
//!     },
//! )?;
//!
//! // Inside the UI loop:
//! runner.poll_completions();
//! ```

pub mod config;
pub mod models;
pub mod net;
pub mod protocol;
pub mod runner;

//! Connection client for the Master.
//!
//! `MasterClient` performs exactly one request/response exchange per TCP
//! connection: connect, write the framed request envelope, read the framed
//! reply, tear the connection down. Connections are never pooled or reused;
//! the churn is an explicit simplicity policy.

use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::config::ClientConfig;
use crate::models::{
    validate_rating, FilterRequest, Product, Purchase, Store, ValidationError,
};
use crate::net::framing::{read_frame, write_frame};
use crate::protocol::{Envelope, Reply, Request, PROTOCOL_VERSION};

/// Errors surfaced by the connection client.
///
/// Validation failures are raised before any socket is opened; transport and
/// protocol failures propagate verbatim, without retries.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The Master refused or dropped the connection attempt.
    #[error("Connection failed: {0}")]
    ConnectionFailed(#[source] std::io::Error),

    /// The exchange did not complete within the configured timeout.
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// The request could not be delivered (write/flush failed mid-exchange).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The reply was absent, undecodable, the wrong shape, or carried an
    /// unsupported protocol version.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Caller-supplied input was rejected before any network call.
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// The operation aborted before producing an outcome (it panicked or was
    /// cancelled on the runtime).
    #[error("Operation aborted: {0}")]
    Aborted(String),
}

/// Client for the Master's request/response protocol.
///
/// One method per operation; every call opens its own connection and closes
/// it when the reply has been read, on every exit path. Cheap to clone, so
/// operations submitted to the task runner can each own a handle.
///
/// # Example
///
/// ```ignore
/// let client = MasterClient::new(&ClientConfig::default());
/// let stores = client.nearby_stores(37.98, 23.73).await?;
/// ```
#[derive(Debug, Clone)]
pub struct MasterClient {
    addr: String,
    timeout: Duration,
}

impl MasterClient {
    /// Build a client from configuration.
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            addr: config.addr(),
            timeout: config.request_timeout,
        }
    }

    /// Build a client for an explicit `host:port` address with the default
    /// timeout.
    pub fn with_addr(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            timeout: ClientConfig::default().request_timeout,
        }
    }

    /// Set the per-exchange timeout.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Unfiltered nearby-store search within the default 5 km radius.
    pub async fn nearby_stores(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<Store>, ClientError> {
        let query = FilterRequest::nearby(latitude, longitude)?;
        tracing::debug!(latitude, longitude, "requesting nearby stores");
        match self.exchange(Request::Client(query)).await? {
            Reply::Stores(stores) => {
                tracing::debug!(count = stores.len(), "received store listing");
                Ok(stores)
            }
            other => Err(unexpected_reply("stores", &other)),
        }
    }

    /// Filtered store search with user-supplied criteria.
    pub async fn filtered_stores(
        &self,
        query: FilterRequest,
    ) -> Result<Vec<Store>, ClientError> {
        tracing::debug!(
            categories = ?query.categories(),
            min_stars = query.min_stars(),
            "requesting filtered stores"
        );
        match self.exchange(Request::Filter(query)).await? {
            Reply::Stores(stores) => {
                tracing::debug!(count = stores.len(), "received filtered listing");
                Ok(stores)
            }
            other => Err(unexpected_reply("stores", &other)),
        }
    }

    /// Fetch the product catalog of one store.
    pub async fn store_products(&self, store: &str) -> Result<Vec<Product>, ClientError> {
        if store.trim().is_empty() {
            return Err(ValidationError::EmptyField("store name").into());
        }
        tracing::debug!(store, "fetching products");
        let request = Request::FetchProducts {
            store: store.to_string(),
        };
        match self.exchange(request).await? {
            Reply::Products(products) => {
                tracing::debug!(count = products.len(), "received catalog");
                Ok(products)
            }
            other => Err(unexpected_reply("products", &other)),
        }
    }

    /// Submit a purchase to one store. The reply is the Master's status
    /// string, returned verbatim; a business rejection arrives here too.
    pub async fn submit_purchase(
        &self,
        order: Purchase,
        store: &str,
    ) -> Result<String, ClientError> {
        if store.trim().is_empty() {
            return Err(ValidationError::EmptyField("store name").into());
        }
        tracing::debug!(store, items = order.products.len(), "submitting purchase");
        let request = Request::Purchase {
            order,
            store: store.to_string(),
        };
        match self.exchange(request).await? {
            Reply::Status(status) => {
                tracing::debug!(%status, "purchase acknowledged");
                Ok(status)
            }
            other => Err(unexpected_reply("status", &other)),
        }
    }

    /// Submit a 1-5 star rating for one store. Out-of-range ratings are
    /// rejected client-side and never sent.
    pub async fn rate_store(&self, store: &str, rating: i32) -> Result<String, ClientError> {
        let rating = validate_rating(rating)?;
        if store.trim().is_empty() {
            return Err(ValidationError::EmptyField("store name").into());
        }
        tracing::debug!(store, rating, "submitting rating");
        let request = Request::Rate {
            store: store.to_string(),
            rating,
        };
        match self.exchange(request).await? {
            Reply::Status(status) => {
                tracing::debug!(%status, "rating acknowledged");
                Ok(status)
            }
            other => Err(unexpected_reply("status", &other)),
        }
    }

    /// Perform one connect / send / receive / teardown cycle.
    ///
    /// Teardown runs on every exit path and a failed close is logged and
    /// swallowed, so it can never mask the exchange's own outcome.
    async fn exchange(&self, request: Request) -> Result<Reply, ClientError> {
        let op = request.op();
        tracing::debug!(op, addr = %self.addr, "connecting to master");

        let stream = TcpStream::connect(&self.addr)
            .await
            .map_err(ClientError::ConnectionFailed)?;

        let (read_half, write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);
        let mut writer = write_half;

        // The whole exchange runs under one timeout
        let result = timeout(
            self.timeout,
            send_receive(&mut reader, &mut writer, &request),
        )
        .await;

        teardown(reader, writer, op).await;

        match result {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ClientError::Timeout(self.timeout.as_secs())),
        }
    }
}

/// Write the request envelope, then block for the single reply envelope.
async fn send_receive(
    reader: &mut BufReader<OwnedReadHalf>,
    writer: &mut OwnedWriteHalf,
    request: &Request,
) -> Result<Reply, ClientError> {
    let op = request.op();

    let body = serde_json::to_string(&Envelope::new(request.clone()))
        .map_err(|e| ClientError::Protocol(format!("Failed to encode {} request: {}", op, e)))?;

    write_frame(writer, &body)
        .await
        .map_err(|e| ClientError::Transport(format!("Failed to send {} request: {}", op, e)))?;

    tracing::debug!(op, "request on the wire, awaiting reply");

    let reply_json = read_frame(reader)
        .await
        .map_err(|e| ClientError::Protocol(format!("Failed to read {} reply: {}", op, e)))?;

    let envelope: Envelope<Reply> = serde_json::from_str(&reply_json)
        .map_err(|e| ClientError::Protocol(format!("Failed to decode {} reply: {}", op, e)))?;

    if envelope.v != PROTOCOL_VERSION {
        return Err(ClientError::Protocol(format!(
            "Unsupported protocol version {} (expected {})",
            envelope.v, PROTOCOL_VERSION
        )));
    }

    Ok(envelope.msg)
}

/// Close the connection, logging and swallowing any close failure.
async fn teardown(reader: BufReader<OwnedReadHalf>, mut writer: OwnedWriteHalf, op: &str) {
    if let Err(e) = writer.shutdown().await {
        tracing::debug!(op, "socket close failed (ignored): {}", e);
    }
    drop(reader);
    tracing::debug!(op, "disconnected from master");
}

fn unexpected_reply(expected: &str, got: &Reply) -> ClientError {
    ClientError::Protocol(format!(
        "Expected {} reply, got {}",
        expected,
        got.kind()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_display() {
        let timeout_err = ClientError::Timeout(30);
        assert_eq!(timeout_err.to_string(), "Request timed out after 30s");

        let protocol_err = ClientError::Protocol("Invalid JSON".to_string());
        assert_eq!(protocol_err.to_string(), "Protocol error: Invalid JSON");

        let invalid: ClientError = ValidationError::RatingOutOfRange(0).into();
        assert_eq!(invalid.to_string(), "Rating must be within 1-5, got 0");

        let aborted = ClientError::Aborted("operation blew up".to_string());
        assert_eq!(aborted.to_string(), "Operation aborted: operation blew up");
    }

    #[tokio::test]
    async fn test_connection_refused_surfaces_as_connection_failed() {
        // Grab a free port, then release it so nothing is listening
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = MasterClient::with_addr(addr.to_string());
        let err = client.nearby_stores(37.98, 23.73).await.unwrap_err();
        assert!(matches!(err, ClientError::ConnectionFailed(_)));
    }

    #[tokio::test]
    async fn test_rating_zero_rejected_before_any_socket() {
        // Address is unroutable on purpose: validation must fire first
        let client = MasterClient::with_addr("127.0.0.1:1");
        let err = client.rate_store("Corner Grill", 0).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Invalid(ValidationError::RatingOutOfRange(0))
        ));
    }

    #[tokio::test]
    async fn test_bad_coordinates_rejected_before_any_socket() {
        let client = MasterClient::with_addr("127.0.0.1:1");
        let err = client.nearby_stores(f64::NAN, 23.73).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Invalid(ValidationError::BadCoordinate("latitude"))
        ));
    }

    #[tokio::test]
    async fn test_empty_store_name_rejected_before_any_socket() {
        let client = MasterClient::with_addr("127.0.0.1:1");
        let err = client.store_products("  ").await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Invalid(ValidationError::EmptyField("store name"))
        ));
    }
}

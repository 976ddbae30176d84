//! Client-side configuration.
//!
//! Defaults match the deployment the client was written against (a Master
//! listening on localhost:4321) and can be overridden from the environment:
//!
//! - `BITEFINDER_MASTER_ADDR` - `host:port` of the Master
//! - `BITEFINDER_TIMEOUT_SECS` - per-request timeout in seconds
//! - `BITEFINDER_MAX_IN_FLIGHT` - cap on concurrently running operations

use std::time::Duration;

/// Default Master address.
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 4321;

/// Default per-request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default cap on concurrently in-flight operations.
const DEFAULT_MAX_IN_FLIGHT: usize = 8;

/// Configuration for [`crate::net::MasterClient`] and
/// [`crate::runner::TaskRunner`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    /// Budget for one full connect/send/receive exchange.
    pub request_timeout: Duration,
    /// Maximum operations allowed in flight at once; further submissions are
    /// rejected with a busy error instead of queuing without bound.
    pub max_in_flight: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

impl ClientConfig {
    /// Load configuration from the environment, falling back to defaults for
    /// anything unset or unparseable (a bad value is logged, not fatal).
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var("BITEFINDER_MASTER_ADDR").ok(),
            std::env::var("BITEFINDER_TIMEOUT_SECS").ok(),
            std::env::var("BITEFINDER_MAX_IN_FLIGHT").ok(),
        )
    }

    fn from_vars(
        addr: Option<String>,
        timeout_secs: Option<String>,
        max_in_flight: Option<String>,
    ) -> Self {
        let mut config = Self::default();

        if let Some(addr) = addr {
            match addr.rsplit_once(':').map(|(h, p)| (h, p.parse::<u16>())) {
                Some((host, Ok(port))) if !host.is_empty() => {
                    config.host = host.to_string();
                    config.port = port;
                }
                _ => tracing::warn!("Ignoring malformed BITEFINDER_MASTER_ADDR: {}", addr),
            }
        }

        if let Some(secs) = timeout_secs {
            match secs.parse::<u64>() {
                Ok(secs) if secs > 0 => config.request_timeout = Duration::from_secs(secs),
                _ => tracing::warn!("Ignoring malformed BITEFINDER_TIMEOUT_SECS: {}", secs),
            }
        }

        if let Some(cap) = max_in_flight {
            match cap.parse::<usize>() {
                Ok(cap) if cap > 0 => config.max_in_flight = cap,
                _ => tracing::warn!("Ignoring malformed BITEFINDER_MAX_IN_FLIGHT: {}", cap),
            }
        }

        config
    }

    /// The Master's `host:port` address.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

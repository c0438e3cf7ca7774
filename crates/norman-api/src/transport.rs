// Shared transport configuration for building the hub's reqwest::Client.
//
// The client carries no global request timeout: the notification
// long-poll must stay open indefinitely, so ordinary requests apply
// `request_timeout` per call instead.

use std::time::Duration;

use crate::error::Error;

/// TCP port the hub's local API listens on.
pub const DEFAULT_PORT: u16 = 10123;

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Total timeout for request/response endpoints. Default: 10s.
    pub request_timeout: Duration,
    /// Timeout for establishing the TCP connection, notification stream
    /// included. Default: 10s.
    pub connect_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .user_agent(concat!("norman-api/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::Transport)
    }
}

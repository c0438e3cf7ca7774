// ── Runtime hub configuration ──
//
// Describes how to reach one hub and how to pace the notification
// listener. Never touches disk: the CLI builds a `HubConfig` from its
// profile and hands it in.

use std::time::Duration;

use norman_api::{DEFAULT_PORT, SessionConfig, TransportConfig};

/// Configuration for connecting to a single hub.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Hub hostname or IP address.
    pub host: String,
    /// Hub API port. Default: 10123.
    pub port: u16,
    /// Timeout for request/response endpoints. Default: 10s.
    pub request_timeout: Duration,
    /// TCP connect timeout, notification stream included. Default: 10s.
    pub connect_timeout: Duration,
    /// Pause after a failed notification session. Default: 15s.
    pub reconnect_interval: Duration,
    /// Maximum lifetime of one notification connection. Default: 300s.
    pub session_max_duration: Duration,
    /// Bytes handed to the framer per step. Default: 1024.
    pub read_chunk_size: usize,
    /// Run the notification listener after connecting.
    pub notifications_enabled: bool,
}

impl HubConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            request_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(10),
            reconnect_interval: Duration::from_secs(15),
            session_max_duration: Duration::from_secs(300),
            read_chunk_size: 1024,
            notifications_enabled: true,
        }
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig {
            request_timeout: self.request_timeout,
            connect_timeout: self.connect_timeout,
        }
    }

    pub(crate) fn session(&self) -> SessionConfig {
        SessionConfig {
            max_duration: self.session_max_duration,
            read_chunk_size: self.read_chunk_size,
        }
    }

    pub(crate) fn listener(&self) -> ListenerConfig {
        ListenerConfig {
            reconnect_interval: self.reconnect_interval,
            session: self.session(),
        }
    }
}

/// Pacing for the notification listener.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    pub reconnect_interval: Duration,
    pub session: SessionConfig,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            reconnect_interval: Duration::from_secs(15),
            session: SessionConfig::default(),
        }
    }
}

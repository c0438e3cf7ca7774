// ── Core error types ──
//
// User-facing errors from norman-core. Consumers never see reqwest errors
// or raw JSON failures; `From<norman_api::Error>` sorts them into
// "could not reach the hub" and "the hub said no / said nonsense".

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to hub at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Hub request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Hub is not connected")]
    HubDisconnected,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Device not found: {id}")]
    DeviceNotFound { id: i64 },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Operation not supported: {operation} (requires {required})")]
    Unsupported { operation: String, required: String },

    #[error("Request rejected by hub: {message}")]
    Rejected { message: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── Protocol errors ──────────────────────────────────────────────
    #[error("Invalid response from hub: {message}")]
    Protocol { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// `true` for failures where the hub could not be reached at all.
    pub fn is_connection(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. } | Self::Timeout { .. } | Self::HubDisconnected
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<norman_api::Error> for CoreError {
    fn from(err: norman_api::Error) -> Self {
        match err {
            norman_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                }
            }
            norman_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid hub URL: {e}"),
            },
            norman_api::Error::Timeout { timeout_secs, .. } => CoreError::Timeout { timeout_secs },
            norman_api::Error::HttpStatus { endpoint, status } => CoreError::Protocol {
                message: format!("{endpoint} returned HTTP {status}"),
            },
            norman_api::Error::HubError { endpoint, code } => CoreError::Rejected {
                message: format!("{endpoint} returned error code {code}"),
            },
            norman_api::Error::HubStatus { endpoint, message } => CoreError::Rejected {
                message: format!("{endpoint}: {message}"),
            },
            norman_api::Error::Deserialization { message, body: _ } => {
                CoreError::Protocol { message }
            }
        }
    }
}

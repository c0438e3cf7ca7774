use thiserror::Error;

/// Top-level error type for the `norman-api` crate.
///
/// Splits into two families: transport failures (the hub could not be
/// reached or stopped answering) and protocol failures (the hub answered,
/// but with an error code, an HTTP error status, or a body we could not
/// parse). `norman-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, reset, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request exceeded the configured request timeout.
    #[error("Request to {endpoint} timed out after {timeout_secs}s")]
    Timeout {
        endpoint: &'static str,
        timeout_secs: u64,
    },

    // ── Hub ─────────────────────────────────────────────────────────
    /// The hub answered with a non-success HTTP status.
    #[error("Hub returned HTTP {status} for {endpoint}")]
    HttpStatus { endpoint: &'static str, status: u16 },

    /// The hub answered with a non-zero `Error` field.
    #[error("{endpoint} request failed with hub error code {code}")]
    HubError { endpoint: &'static str, code: i64 },

    /// The hub answered with a non-zero `status.code` and an error message.
    #[error("{endpoint} failed: {message}")]
    HubStatus {
        endpoint: &'static str,
        message: String,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` for network-level failures where the hub never
    /// produced a usable answer. These are worth retrying as-is.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout { .. })
    }

    /// Returns `true` when the hub answered but the answer was unusable.
    ///
    /// Re-fetching may help; replaying the same payload will not.
    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            Self::HttpStatus { .. }
                | Self::HubError { .. }
                | Self::HubStatus { .. }
                | Self::Deserialization { .. }
        )
    }

    /// Extract the hub's numeric error code, if available.
    pub fn hub_error_code(&self) -> Option<i64> {
        match self {
            Self::HubError { code, .. } => Some(*code),
            _ => None,
        }
    }
}

//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use norman_config::ConfigError;
use norman_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const REJECTED: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to hub at {url}")]
    #[diagnostic(
        code(norman::connection_failed),
        help(
            "Check that the hub is powered on and reachable on the local network.\n\
             Reason: {reason}\n\
             Try: norman check --host <address>"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Hub request timed out after {timeout_secs}s")]
    #[diagnostic(
        code(norman::timeout),
        help("Raise the request timeout with --timeout, or check the hub's network link.")
    )]
    Timeout { timeout_secs: u64 },

    #[error("Hub connection is closed")]
    #[diagnostic(code(norman::disconnected))]
    Disconnected,

    // ── Hub responses ────────────────────────────────────────────────
    #[error("Hub rejected the request: {message}")]
    #[diagnostic(code(norman::rejected))]
    Rejected { message: String },

    #[error("Unexpected response from hub: {message}")]
    #[diagnostic(
        code(norman::protocol),
        help("The hub firmware may speak a different API version. Re-run with -vv for details.")
    )]
    Protocol { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(norman::not_found),
        help("Run: norman devices list")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    #[error("Cannot {operation}: device lacks {required}")]
    #[diagnostic(code(norman::unsupported))]
    Unsupported { operation: String, required: String },

    // ── Input ────────────────────────────────────────────────────────
    #[error("Invalid {field}: {reason}")]
    #[diagnostic(code(norman::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("No hub configured")]
    #[diagnostic(
        code(norman::no_config),
        help(
            "Pass --host <address>, or save a profile with:\n\
             norman config init --host <address>\n\
             Config path: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Profile '{name}' not found")]
    #[diagnostic(
        code(norman::profile_not_found),
        help("Available profiles: {available}")
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(norman::config))]
    Config(ConfigError),

    // ── Output ───────────────────────────────────────────────────────
    #[error("Failed to render output: {0}")]
    #[diagnostic(code(norman::render))]
    Render(String),

    #[error(transparent)]
    #[diagnostic(code(norman::io))]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Disconnected => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Rejected { .. } => exit_code::REJECTED,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Unsupported { .. } | Self::Validation { .. } | Self::NoConfig { .. } => {
                exit_code::USAGE
            }
            Self::Protocol { .. } | Self::Config(_) | Self::Render(_) | Self::Io(_) => {
                exit_code::GENERAL
            }
        }
    }
}

// ── Conversions ──────────────────────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::Timeout { timeout_secs } => Self::Timeout { timeout_secs },
            CoreError::HubDisconnected => Self::Disconnected,
            CoreError::DeviceNotFound { id } => Self::NotFound {
                resource_type: "Device".into(),
                identifier: id.to_string(),
            },
            CoreError::Unsupported {
                operation,
                required,
            } => Self::Unsupported {
                operation,
                required,
            },
            CoreError::Rejected { message } => Self::Rejected { message },
            CoreError::ValidationFailed { message } => Self::Validation {
                field: "command".into(),
                reason: message,
            },
            CoreError::Protocol { message } => Self::Protocol { message },
            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config(other),
        }
    }
}

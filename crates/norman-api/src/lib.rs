// norman-api: Async Rust client for the Norman hub's local HTTP API

pub mod client;
pub mod error;
pub mod models;
pub mod notification;
pub mod transport;

pub use client::HubClient;
pub use error::Error;
pub use notification::{
    Notification, NotificationSession, SessionConfig, SessionEnd, SessionEvent, StreamFramer,
};
pub use transport::{DEFAULT_PORT, TransportConfig};

// norman-core: Device snapshot, refresh coordination and notification
// listener between norman-api and consumers.

pub mod command;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod hub;
pub mod hub_api;
pub mod listener;
pub mod merge;
pub mod model;
pub mod stream;

#[cfg(test)]
mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{CommandResult, CoverCommand, RailTarget};
pub use config::{HubConfig, ListenerConfig};
pub use coordinator::{DataCoordinator, RefreshHealth};
pub use error::CoreError;
pub use hub::Hub;
pub use hub_api::{HubApi, NotificationSource};
pub use listener::{ConnectionState, ReconnectLoop};
pub use merge::merge;
pub use model::{Capability, DeviceSnapshot, DeviceType, PeripheralId, PeripheralRecord};
pub use stream::SnapshotStream;

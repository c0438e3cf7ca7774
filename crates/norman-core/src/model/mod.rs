// ── Domain model ──

pub mod peripheral;

pub use peripheral::{Capability, DeviceSnapshot, DeviceType, PeripheralId, PeripheralRecord};

// ── Peripheral domain types ──

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

// ── PeripheralId ────────────────────────────────────────────────────

/// Integer identifier of one peripheral, stable across refreshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeripheralId(pub i64);

impl PeripheralId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for PeripheralId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for PeripheralId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl FromStr for PeripheralId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

// ── DeviceType / Capability ─────────────────────────────────────────

/// Kind of window covering. The hub does not report it; every
/// peripheral is currently a SmartDrape.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeviceType {
    #[default]
    SmartDrape,
}

/// Something a device type can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Capability {
    /// Open, close or move the bottom rail.
    Position,
    /// Re-send the current position to halt movement.
    Stop,
    /// Move the middle rail.
    Tilt,
}

impl DeviceType {
    pub fn capabilities(self) -> &'static [Capability] {
        match self {
            Self::SmartDrape => &[Capability::Position, Capability::Stop, Capability::Tilt],
        }
    }

    pub fn supports(self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

// ── PeripheralRecord ────────────────────────────────────────────────

/// Merged catalog + status view of one peripheral.
///
/// Rebuilt from scratch on every merge; never patched in place.
/// Positions run 0 (closed) to 100 (open) and are passed through
/// exactly as the hub reports them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeripheralRecord {
    pub id: PeripheralId,
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    pub room_id: Option<i64>,
    pub room_name: Option<String>,
    pub group_id: Option<i64>,
    pub group_name: Option<String>,
    pub module_type: Option<i64>,
    pub module_detail: Option<i64>,
    pub bottom_rail_position: Option<i64>,
    pub middle_rail_position: Option<i64>,
    pub target_bottom_rail_position: Option<i64>,
    pub target_middle_rail_position: Option<i64>,
    pub battery_level: Option<f64>,
    pub firmware_version: Option<String>,
    /// Hub timestamp token, never reinterpreted.
    pub last_update: Option<Value>,
}

impl PeripheralRecord {
    /// A record carrying only an identifier and the default name and type.
    pub fn minimal(id: PeripheralId) -> Self {
        Self {
            id,
            name: default_name(id),
            device_type: DeviceType::default(),
            room_id: None,
            room_name: None,
            group_id: None,
            group_name: None,
            module_type: None,
            module_detail: None,
            bottom_rail_position: None,
            middle_rail_position: None,
            target_bottom_rail_position: None,
            target_middle_rail_position: None,
            battery_level: None,
            firmware_version: None,
            last_update: None,
        }
    }

    /// Cover position: the bottom rail.
    pub fn position(&self) -> Option<i64> {
        self.bottom_rail_position
    }

    /// Tilt position: the middle rail.
    pub fn tilt(&self) -> Option<i64> {
        self.middle_rail_position
    }

    /// `None` when the position is unknown.
    pub fn is_closed(&self) -> Option<bool> {
        self.position().map(|p| p == 0)
    }
}

pub(crate) fn default_name(id: PeripheralId) -> String {
    format!("Norman {id}")
}

// ── DeviceSnapshot ──────────────────────────────────────────────────

/// Every known peripheral at one point in time, keyed by ID.
///
/// Published behind an `Arc` and replaced wholesale on each refresh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceSnapshot {
    devices: BTreeMap<PeripheralId, PeripheralRecord>,
}

impl DeviceSnapshot {
    pub fn get(&self, id: PeripheralId) -> Option<&PeripheralRecord> {
        self.devices.get(&id)
    }

    pub fn contains(&self, id: PeripheralId) -> bool {
        self.devices.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = PeripheralId> + '_ {
        self.devices.keys().copied()
    }

    /// Records in ascending ID order.
    pub fn iter(&self) -> impl Iterator<Item = &PeripheralRecord> {
        self.devices.values()
    }
}

impl FromIterator<PeripheralRecord> for DeviceSnapshot {
    fn from_iter<I: IntoIterator<Item = PeripheralRecord>>(iter: I) -> Self {
        Self {
            devices: iter.into_iter().map(|r| (r.id, r)).collect(),
        }
    }
}

impl From<BTreeMap<PeripheralId, PeripheralRecord>> for DeviceSnapshot {
    fn from(devices: BTreeMap<PeripheralId, PeripheralRecord>) -> Self {
        Self { devices }
    }
}

impl<'a> IntoIterator for &'a DeviceSnapshot {
    type Item = &'a PeripheralRecord;
    type IntoIter = std::collections::btree_map::Values<'a, PeripheralId, PeripheralRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.devices.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_type_round_trips_through_strings() {
        assert_eq!(DeviceType::SmartDrape.to_string(), "smartdrape");
        assert_eq!(
            "smartdrape".parse::<DeviceType>().ok(),
            Some(DeviceType::SmartDrape)
        );
        assert_eq!(
            serde_json::to_value(DeviceType::SmartDrape).ok(),
            Some(serde_json::json!("smartdrape"))
        );
    }

    #[test]
    fn smartdrape_supports_everything() {
        for capability in [Capability::Position, Capability::Stop, Capability::Tilt] {
            assert!(DeviceType::SmartDrape.supports(capability));
        }
    }

    #[test]
    fn minimal_record_uses_default_name() {
        let record = PeripheralRecord::minimal(PeripheralId(12));
        assert_eq!(record.name, "Norman 12");
        assert_eq!(record.device_type, DeviceType::SmartDrape);
        assert_eq!(record.is_closed(), None);
    }

    #[test]
    fn peripheral_id_parses_trimmed() {
        assert_eq!(" 42 ".parse::<PeripheralId>().ok(), Some(PeripheralId(42)));
        assert!("blind".parse::<PeripheralId>().is_err());
    }
}

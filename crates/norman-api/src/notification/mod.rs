//! Notification long-poll: framing and session lifetime.
//!
//! `POST /NM/v1/notification` answers with a body that never ends on its
//! own. The hub writes one JSON object per state change, with no
//! delimiters, interleaved with bare acknowledgement objects.
//! [`StreamFramer`] turns raw chunks into [`Notification`]s and
//! [`NotificationSession`] bounds how long one connection is kept.

mod framer;
mod session;

pub use framer::StreamFramer;
pub use session::{NotificationSession, SessionConfig, SessionEnd, SessionEvent};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::parse_uid;

/// Top-level key that distinguishes a device-state notification from an
/// acknowledgement.
pub const NOTIFICATION_MARKER: &str = "PeripheralList";

/// One device-state notification pushed by the hub.
///
/// The payload is kept loosely typed: it only ever acts as a refresh
/// trigger, and its inner shape varies across firmware versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "PeripheralList")]
    pub peripheral_list: Value,

    /// All remaining top-level fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Notification {
    pub(crate) fn from_map(mut map: Map<String, Value>) -> Self {
        let peripheral_list = map.remove(NOTIFICATION_MARKER).unwrap_or(Value::Null);
        Self {
            peripheral_list,
            extra: map,
        }
    }

    /// Identifiers of the peripherals this notification mentions.
    ///
    /// Entries may be bare identifiers or objects with a `PeripheralUID`;
    /// anything unrecognized is skipped.
    pub fn peripheral_ids(&self) -> Vec<i64> {
        let Some(entries) = self.peripheral_list.as_array() else {
            return Vec::new();
        };

        entries
            .iter()
            .filter_map(|entry| match entry {
                Value::Object(obj) => obj.get("PeripheralUID").and_then(parse_uid),
                other => parse_uid(other),
            })
            .collect()
    }
}

// ── Cover commands ──
//
// Every movement is a single control request carrying both rails. A
// command names the rail it moves; the other rail keeps its current
// value, or 100 when the hub has never reported one.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::model::{Capability, PeripheralRecord};

/// Rail value used when the current position is unknown.
const UNKNOWN_RAIL_DEFAULT: i64 = 100;

/// A user-level cover operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverCommand {
    /// Bottom rail to 100.
    Open,
    /// Bottom rail to 0.
    Close,
    /// Re-send the current bottom rail position.
    Stop,
    /// Bottom rail to the given position.
    SetPosition(i64),
    /// Middle rail to 100.
    OpenTilt,
    /// Middle rail to 0.
    CloseTilt,
    /// Middle rail to the given position.
    SetTilt(i64),
}

/// Both rail positions of one control request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RailTarget {
    pub bottom: i64,
    pub middle: i64,
}

/// Outcome of executing a [`CoverCommand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CommandResult {
    /// A control request was sent.
    Sent { target: RailTarget },
    /// Nothing to send: a stop with no known position.
    Skipped,
}

impl CoverCommand {
    pub fn required_capability(self) -> Capability {
        match self {
            Self::Open | Self::Close | Self::SetPosition(_) => Capability::Position,
            Self::Stop => Capability::Stop,
            Self::OpenTilt | Self::CloseTilt | Self::SetTilt(_) => Capability::Tilt,
        }
    }

    /// Short human-readable name, used in errors and logs.
    pub fn action(self) -> &'static str {
        match self {
            Self::Open => "open cover",
            Self::Close => "close cover",
            Self::Stop => "stop cover",
            Self::SetPosition(_) => "set position",
            Self::OpenTilt => "open tilt",
            Self::CloseTilt => "close tilt",
            Self::SetTilt(_) => "set tilt position",
        }
    }

    /// Reject requested positions outside 0..=100.
    pub fn validate(self) -> Result<(), CoreError> {
        match self {
            Self::SetPosition(p) | Self::SetTilt(p) if !(0..=100).contains(&p) => {
                Err(CoreError::ValidationFailed {
                    message: format!("{}: position {p} is outside 0..=100", self.action()),
                })
            }
            _ => Ok(()),
        }
    }

    /// Compute the rail positions to send, or `None` when there is nothing
    /// to do.
    pub fn resolve(self, record: &PeripheralRecord) -> Option<RailTarget> {
        let bottom = record.bottom_rail_position.unwrap_or(UNKNOWN_RAIL_DEFAULT);
        let middle = record.middle_rail_position.unwrap_or(UNKNOWN_RAIL_DEFAULT);

        let target = match self {
            Self::Open => RailTarget { bottom: 100, middle },
            Self::Close => RailTarget { bottom: 0, middle },
            Self::SetPosition(p) => RailTarget { bottom: p, middle },
            Self::Stop => RailTarget {
                bottom: record.bottom_rail_position?,
                middle,
            },
            Self::OpenTilt => RailTarget { bottom, middle: 100 },
            Self::CloseTilt => RailTarget { bottom, middle: 0 },
            Self::SetTilt(p) => RailTarget { bottom, middle: p },
        };
        Some(target)
    }
}

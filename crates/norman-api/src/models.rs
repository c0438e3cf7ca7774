// Hub API request and response types
//
// Every endpoint takes and returns PascalCase JSON. Response fields use
// `#[serde(default)]` liberally because the hub omits fields freely
// across firmware versions. Peripheral identifiers stay loosely typed
// until `uid()` is asked for them: the catalog has been seen to carry
// identifiers that are not integers, and those must be skipped rather
// than fail the whole response. Other scalar fields go through `lenient`:
// a value of an unexpected type becomes `None` for that field only.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ── Requests ─────────────────────────────────────────────────────────

/// Body of `POST /NM/v1/registration` and `POST /NM/v1/status`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TimestampRequest {
    pub timestamp: i64,
}

/// Body of `POST /NM/v1/GetAllPeripheral`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CatalogRequest {
    pub thing_name: Option<String>,
    #[serde(rename = "TaskID")]
    pub task_id: i64,
    pub timestamp: i64,
}

/// Body of `POST /NM/v1/control`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ControlRequest {
    #[serde(rename = "PeripheralUID")]
    pub peripheral_uid: i64,
    pub timestamp: i64,
    #[serde(rename = "TaskID")]
    pub task_id: i64,
    pub bottom_rail_position: i64,
    pub middle_rail_position: i64,
}

// ── Registration ─────────────────────────────────────────────────────

/// Response of `POST /NM/v1/registration`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RegistrationResponse {
    #[serde(default)]
    pub thing_name: Option<String>,
    #[serde(default)]
    pub error: i64,
}

/// Response of `POST /NM/v1/control`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ControlResponse {
    #[serde(default)]
    pub error: i64,
}

// ── Catalog (GetAllPeripheral) ───────────────────────────────────────

/// Response of `POST /NM/v1/GetAllPeripheral`: the room → group →
/// peripheral hierarchy.
///
/// ```json
/// { "status": { "code": 0, "error": "" },
///   "results": { "RoomList": [ { "RoomID": 1, "GroupList": [ ... ] } ] } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogResponse {
    #[serde(default)]
    pub status: CatalogStatus,
    #[serde(default)]
    pub results: Option<CatalogResults>,
}

impl CatalogResponse {
    /// All rooms, or an empty slice when the hub sent no `results`.
    pub fn rooms(&self) -> &[Room] {
        self.results.as_ref().map_or(&[], |r| r.rooms.as_slice())
    }

    /// Total number of peripherals across every room and group.
    pub fn peripheral_count(&self) -> usize {
        self.rooms()
            .iter()
            .flat_map(|room| &room.groups)
            .map(|group| group.peripherals.len())
            .sum()
    }
}

/// Application-level status block of the catalog response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogStatus {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogResults {
    #[serde(rename = "RoomList", default)]
    pub rooms: Vec<Room>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Room {
    #[serde(rename = "RoomID", default, deserialize_with = "lenient::int")]
    pub id: Option<i64>,
    #[serde(rename = "RoomName", default, deserialize_with = "lenient::string")]
    pub name: Option<String>,
    #[serde(rename = "GroupList", default)]
    pub groups: Vec<Group>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Group {
    #[serde(rename = "GroupID", default, deserialize_with = "lenient::int")]
    pub id: Option<i64>,
    #[serde(rename = "GroupName", default, deserialize_with = "lenient::string")]
    pub name: Option<String>,
    #[serde(rename = "PeripheralList", default)]
    pub peripherals: Vec<CatalogPeripheral>,
}

/// One peripheral as listed in the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogPeripheral {
    #[serde(rename = "PeripheralUID", default)]
    pub uid: Option<Value>,
    #[serde(rename = "PeripheralName", default, deserialize_with = "lenient::string")]
    pub name: Option<String>,
    #[serde(rename = "ModuleType", default, deserialize_with = "lenient::int")]
    pub module_type: Option<i64>,
    #[serde(rename = "ModuleDetail", default, deserialize_with = "lenient::int")]
    pub module_detail: Option<i64>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl CatalogPeripheral {
    /// The peripheral's integer identifier, if it has a usable one.
    pub fn uid(&self) -> Option<i64> {
        self.uid.as_ref().and_then(parse_uid)
    }
}

// ── Status ───────────────────────────────────────────────────────────

/// Response of `POST /NM/v1/status`: a flat list of live peripheral state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatusResponse {
    #[serde(default)]
    pub error: i64,
    #[serde(default)]
    pub peripherals: Vec<PeripheralStatus>,
}

/// Live state of one peripheral.
///
/// Rail positions run 0 (closed) to 100 (open). They are carried as the
/// hub reports them, without range checks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PeripheralStatus {
    #[serde(rename = "PeripheralUID", default)]
    pub uid: Option<Value>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub bottom_rail_position: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub middle_rail_position: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub target_bottom_rail_position: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub target_middle_rail_position: Option<i64>,
    #[serde(default, deserialize_with = "lenient::float")]
    pub battery_voltage: Option<f64>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub firmware_version: Option<String>,
    /// Opaque hub timestamp token, kept exactly as received.
    #[serde(default)]
    pub timestamp: Option<Value>,
}

impl PeripheralStatus {
    /// The peripheral's integer identifier, if it has a usable one.
    pub fn uid(&self) -> Option<i64> {
        self.uid.as_ref().and_then(parse_uid)
    }
}

// ── Identifier parsing ───────────────────────────────────────────────

/// Interpret a `PeripheralUID` value as an integer.
///
/// Accepts JSON integers, integral floats (`5.0`), and strings holding an
/// integer (`"5"`, surrounding whitespace allowed). Everything else,
/// including `null`, fractional numbers and non-numeric strings, is `None`.
pub fn parse_uid(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            let f = n.as_f64()?;
            #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
            let truncated = f as i64;
            (f.fract() == 0.0 && f.is_finite()).then_some(truncated)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// ── Lenient scalar fields ────────────────────────────────────────────

/// `deserialize_with` helpers that never fail on a type mismatch.
mod lenient {
    use super::{Deserialize, Deserializer, Value, parse_uid};

    /// Integers, integral floats and numeric strings; otherwise `None`.
    pub fn int<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        Ok(Option::<Value>::deserialize(d)?.as_ref().and_then(parse_uid))
    }

    /// Any JSON number or numeric string; otherwise `None`.
    pub fn float<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        })
    }

    /// Strings as-is, numbers rendered as text; otherwise `None`.
    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_uid_accepts_integers_and_numeric_strings() {
        assert_eq!(parse_uid(&json!(5)), Some(5));
        assert_eq!(parse_uid(&json!("42")), Some(42));
        assert_eq!(parse_uid(&json!(" 7 ")), Some(7));
        assert_eq!(parse_uid(&json!(9.0)), Some(9));
    }

    #[test]
    fn parse_uid_rejects_everything_else() {
        assert_eq!(parse_uid(&json!(null)), None);
        assert_eq!(parse_uid(&json!("blind-3")), None);
        assert_eq!(parse_uid(&json!(2.5)), None);
        assert_eq!(parse_uid(&json!({"id": 1})), None);
        assert_eq!(parse_uid(&json!([1])), None);
    }

    #[test]
    fn deserialize_catalog() {
        let raw = json!({
            "status": { "code": 0, "error": "" },
            "results": {
                "RoomList": [{
                    "RoomID": 1,
                    "RoomName": "Den",
                    "GroupList": [{
                        "GroupID": 4,
                        "GroupName": "Main",
                        "PeripheralList": [
                            { "PeripheralUID": 5, "PeripheralName": "Blind", "ModuleType": 2, "ModuleDetail": 7, "Serial": "abc" },
                            { "PeripheralUID": "bogus" }
                        ]
                    }]
                }]
            }
        });

        let catalog: CatalogResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(catalog.rooms().len(), 1);
        assert_eq!(catalog.peripheral_count(), 2);

        let room = &catalog.rooms()[0];
        assert_eq!(room.id, Some(1));
        assert_eq!(room.name.as_deref(), Some("Den"));

        let first = &room.groups[0].peripherals[0];
        assert_eq!(first.uid(), Some(5));
        assert_eq!(first.module_type, Some(2));
        assert_eq!(first.extra["Serial"], "abc");
        assert_eq!(room.groups[0].peripherals[1].uid(), None);
    }

    #[test]
    fn deserialize_catalog_without_results() {
        let catalog: CatalogResponse =
            serde_json::from_value(json!({ "status": { "code": 0 } })).unwrap();
        assert!(catalog.rooms().is_empty());
        assert_eq!(catalog.peripheral_count(), 0);
    }

    #[test]
    fn deserialize_status_with_nulls() {
        let raw = json!({
            "Error": 0,
            "Peripherals": [{
                "PeripheralUID": 5,
                "BottomRailPosition": 40,
                "MiddleRailPosition": null,
                "BatteryVoltage": 3.9,
                "FirmwareVersion": "1.2.3",
                "Timestamp": 1_700_000_000
            }]
        });

        let status: StatusResponse = serde_json::from_value(raw).unwrap();
        let entry = &status.peripherals[0];
        assert_eq!(entry.uid(), Some(5));
        assert_eq!(entry.bottom_rail_position, Some(40));
        assert_eq!(entry.middle_rail_position, None);
        assert_eq!(entry.target_bottom_rail_position, None);
        assert_eq!(entry.battery_voltage, Some(3.9));
        assert_eq!(entry.timestamp, Some(json!(1_700_000_000)));
    }

    #[test]
    fn mistyped_status_fields_do_not_fail_the_response() {
        let raw = json!({
            "Error": 0,
            "Peripherals": [
                { "PeripheralUID": 5, "BottomRailPosition": 40, "FirmwareVersion": "1.2" },
                {
                    "PeripheralUID": 6,
                    "BottomRailPosition": 40.0,
                    "MiddleRailPosition": "55",
                    "TargetBottomRailPosition": true,
                    "BatteryVoltage": "3.7",
                    "FirmwareVersion": 12
                }
            ]
        });

        let status: StatusResponse = serde_json::from_value(raw).unwrap();
        let (good, odd) = (&status.peripherals[0], &status.peripherals[1]);
        assert_eq!(good.bottom_rail_position, Some(40));
        assert_eq!(good.firmware_version.as_deref(), Some("1.2"));
        assert_eq!(odd.bottom_rail_position, Some(40));
        assert_eq!(odd.middle_rail_position, Some(55));
        assert_eq!(odd.target_bottom_rail_position, None);
        assert_eq!(odd.battery_voltage, Some(3.7));
        assert_eq!(odd.firmware_version.as_deref(), Some("12"));
    }

    #[test]
    fn mistyped_catalog_fields_do_not_fail_the_response() {
        let raw = json!({
            "status": { "code": 0 },
            "results": { "RoomList": [{
                "RoomID": "1",
                "RoomName": 7,
                "GroupList": [{
                    "GroupID": [2],
                    "PeripheralList": [
                        { "PeripheralUID": 5, "PeripheralName": "Blind", "ModuleType": 3 },
                        { "PeripheralUID": 6, "PeripheralName": 42, "ModuleType": "A1", "ModuleDetail": 4.5 }
                    ]
                }]
            }]}
        });

        let catalog: CatalogResponse = serde_json::from_value(raw).unwrap();
        let room = &catalog.rooms()[0];
        assert_eq!(room.id, Some(1));
        assert_eq!(room.name.as_deref(), Some("7"));
        assert_eq!(room.groups[0].id, None);

        let peripherals = &room.groups[0].peripherals;
        assert_eq!(peripherals[0].module_type, Some(3));
        assert_eq!(peripherals[1].uid(), Some(6));
        assert_eq!(peripherals[1].name.as_deref(), Some("42"));
        assert_eq!(peripherals[1].module_type, None);
        assert_eq!(peripherals[1].module_detail, None);
    }

    #[test]
    fn serialize_control_request_uses_hub_field_names() {
        let body = ControlRequest {
            peripheral_uid: 5,
            timestamp: 1_700_000_000,
            task_id: 1234,
            bottom_rail_position: 0,
            middle_rail_position: 100,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            json!({
                "PeripheralUID": 5,
                "Timestamp": 1_700_000_000,
                "TaskID": 1234,
                "BottomRailPosition": 0,
                "MiddleRailPosition": 100
            })
        );
    }
}

// ── Catalog + status merge ──
//
// Pure function: no I/O, no shared state. The catalog contributes
// identity and placement, the status list contributes live state.

use std::collections::BTreeMap;

use norman_api::models::{CatalogResponse, StatusResponse};

use crate::model::peripheral::default_name;
use crate::model::{DeviceSnapshot, DeviceType, PeripheralId, PeripheralRecord};

/// Combine a catalog and a status response into one snapshot.
///
/// - Every catalog peripheral with an integer ID becomes a record with its
///   room, group and module metadata. Entries without a usable ID are
///   skipped.
/// - Every status entry with an integer ID overwrites the live fields of
///   its record (absent or `null` fields clear them). IDs the catalog does
///   not know get a minimal record first.
/// - When an ID repeats within one input, the later entry wins.
pub fn merge(catalog: &CatalogResponse, status: &StatusResponse) -> DeviceSnapshot {
    let mut devices: BTreeMap<PeripheralId, PeripheralRecord> = BTreeMap::new();

    for room in catalog.rooms() {
        for group in &room.groups {
            for peripheral in &group.peripherals {
                let Some(id) = peripheral.uid().map(PeripheralId) else {
                    continue;
                };

                devices.insert(
                    id,
                    PeripheralRecord {
                        name: peripheral.name.clone().unwrap_or_else(|| default_name(id)),
                        device_type: DeviceType::SmartDrape,
                        room_id: room.id,
                        room_name: room.name.clone(),
                        group_id: group.id,
                        group_name: group.name.clone(),
                        module_type: peripheral.module_type,
                        module_detail: peripheral.module_detail,
                        ..PeripheralRecord::minimal(id)
                    },
                );
            }
        }
    }

    for entry in &status.peripherals {
        let Some(id) = entry.uid().map(PeripheralId) else {
            continue;
        };

        let record = devices
            .entry(id)
            .or_insert_with(|| PeripheralRecord::minimal(id));

        record.bottom_rail_position = entry.bottom_rail_position;
        record.middle_rail_position = entry.middle_rail_position;
        record.target_bottom_rail_position = entry.target_bottom_rail_position;
        record.target_middle_rail_position = entry.target_middle_rail_position;
        record.battery_level = entry.battery_voltage;
        record.firmware_version.clone_from(&entry.firmware_version);
        record.last_update.clone_from(&entry.timestamp);
    }

    DeviceSnapshot::from(devices)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    fn catalog(value: Value) -> CatalogResponse {
        serde_json::from_value(value).unwrap()
    }

    fn status(value: Value) -> StatusResponse {
        serde_json::from_value(value).unwrap()
    }

    fn den_catalog() -> CatalogResponse {
        catalog(json!({
            "status": { "code": 0 },
            "results": { "RoomList": [{
                "RoomID": 1,
                "RoomName": "Den",
                "GroupList": [{
                    "GroupID": 2,
                    "GroupName": "G",
                    "PeripheralList": [{
                        "PeripheralUID": 5,
                        "PeripheralName": "Blind",
                        "ModuleType": 3,
                        "ModuleDetail": 4
                    }]
                }]
            }]}
        }))
    }

    #[test]
    fn den_blind_end_to_end() {
        let status = status(json!({
            "Peripherals": [{
                "PeripheralUID": 5,
                "BottomRailPosition": 40,
                "MiddleRailPosition": 60,
                "BatteryVoltage": 3.8,
                "FirmwareVersion": "2.1",
                "Timestamp": "1700000000"
            }]
        }));

        let snapshot = merge(&den_catalog(), &status);

        assert_eq!(snapshot.len(), 1);
        let blind = snapshot.get(PeripheralId(5)).unwrap();
        assert_eq!(
            blind,
            &PeripheralRecord {
                id: PeripheralId(5),
                name: "Blind".into(),
                device_type: DeviceType::SmartDrape,
                room_id: Some(1),
                room_name: Some("Den".into()),
                group_id: Some(2),
                group_name: Some("G".into()),
                module_type: Some(3),
                module_detail: Some(4),
                bottom_rail_position: Some(40),
                middle_rail_position: Some(60),
                target_bottom_rail_position: None,
                target_middle_rail_position: None,
                battery_level: Some(3.8),
                firmware_version: Some("2.1".into()),
                last_update: Some(json!("1700000000")),
            }
        );
    }

    #[test]
    fn status_only_id_gets_minimal_record() {
        let status = status(json!({
            "Peripherals": [{ "PeripheralUID": "9", "BottomRailPosition": 0 }]
        }));

        let snapshot = merge(&CatalogResponse::default(), &status);
        let record = snapshot.get(PeripheralId(9)).unwrap();

        assert_eq!(record.name, "Norman 9");
        assert_eq!(record.device_type, DeviceType::SmartDrape);
        assert_eq!(record.room_id, None);
        assert_eq!(record.bottom_rail_position, Some(0));
        assert_eq!(record.is_closed(), Some(true));
    }

    #[test]
    fn odd_field_types_only_affect_their_own_record() {
        let catalog = catalog(json!({
            "results": { "RoomList": [{ "RoomName": "Den", "GroupList": [{ "PeripheralList": [
                { "PeripheralUID": 5, "PeripheralName": "Blind", "ModuleType": 3 },
                { "PeripheralUID": 6, "PeripheralName": "Sheer", "ModuleType": "A1" }
            ]}]}]}
        }));
        let status = status(json!({
            "Peripherals": [
                { "PeripheralUID": 5, "BottomRailPosition": 40, "FirmwareVersion": "2.1" },
                { "PeripheralUID": 6, "BottomRailPosition": 40.0, "FirmwareVersion": 12 }
            ]
        }));

        let snapshot = merge(&catalog, &status);
        assert_eq!(snapshot.len(), 2);

        let blind = snapshot.get(PeripheralId(5)).unwrap();
        assert_eq!(blind.module_type, Some(3));
        assert_eq!(blind.position(), Some(40));
        assert_eq!(blind.firmware_version.as_deref(), Some("2.1"));

        let sheer = snapshot.get(PeripheralId(6)).unwrap();
        assert_eq!(sheer.room_name.as_deref(), Some("Den"));
        assert_eq!(sheer.module_type, None);
        assert_eq!(sheer.position(), Some(40));
        assert_eq!(sheer.firmware_version.as_deref(), Some("12"));
    }

    #[test]
    fn catalog_only_id_has_no_live_state() {
        let snapshot = merge(&den_catalog(), &StatusResponse::default());
        let record = snapshot.get(PeripheralId(5)).unwrap();

        assert_eq!(record.room_name.as_deref(), Some("Den"));
        assert_eq!(record.bottom_rail_position, None);
        assert_eq!(record.last_update, None);
    }

    #[test]
    fn non_integer_catalog_ids_are_skipped() {
        let catalog = catalog(json!({
            "results": { "RoomList": [{ "GroupList": [{ "PeripheralList": [
                { "PeripheralUID": "abc", "PeripheralName": "Bad" },
                { "PeripheralName": "Missing" },
                { "PeripheralUID": null },
                { "PeripheralUID": "7" }
            ]}]}]}
        }));

        let snapshot = merge(&catalog, &StatusResponse::default());

        assert_eq!(snapshot.ids().collect::<Vec<_>>(), vec![PeripheralId(7)]);
        assert_eq!(snapshot.get(PeripheralId(7)).unwrap().name, "Norman 7");
    }

    #[test]
    fn null_status_fields_clear_previous_values() {
        let status = status(json!({
            "Peripherals": [{ "PeripheralUID": 5, "BottomRailPosition": null }]
        }));

        let record = merge(&den_catalog(), &status)
            .get(PeripheralId(5))
            .cloned()
            .unwrap();

        assert_eq!(record.bottom_rail_position, None);
        assert_eq!(record.name, "Blind");
    }

    #[test]
    fn every_id_appears_exactly_once() {
        let status = status(json!({
            "Peripherals": [
                { "PeripheralUID": 5, "BottomRailPosition": 10 },
                { "PeripheralUID": 6 },
                { "PeripheralUID": 5, "BottomRailPosition": 20 }
            ]
        }));

        let snapshot = merge(&den_catalog(), &status);

        assert_eq!(
            snapshot.ids().collect::<Vec<_>>(),
            vec![PeripheralId(5), PeripheralId(6)]
        );
        assert_eq!(snapshot.get(PeripheralId(5)).unwrap().position(), Some(20));
    }

    #[test]
    fn merge_is_idempotent() {
        let status = status(json!({ "Peripherals": [{ "PeripheralUID": 5, "MiddleRailPosition": 30 }] }));
        let catalog = den_catalog();
        assert_eq!(merge(&catalog, &status), merge(&catalog, &status));
    }

    #[test]
    fn merge_ignores_input_order_for_unique_ids() {
        let forward = catalog(json!({
            "results": { "RoomList": [
                { "RoomID": 1, "GroupList": [{ "PeripheralList": [{ "PeripheralUID": 1 }, { "PeripheralUID": 2 }] }] },
                { "RoomID": 2, "GroupList": [{ "PeripheralList": [{ "PeripheralUID": 3 }] }] }
            ]}
        }));
        let reversed = catalog(json!({
            "results": { "RoomList": [
                { "RoomID": 2, "GroupList": [{ "PeripheralList": [{ "PeripheralUID": 3 }] }] },
                { "RoomID": 1, "GroupList": [{ "PeripheralList": [{ "PeripheralUID": 2 }, { "PeripheralUID": 1 }] }] }
            ]}
        }));
        let status_a = status(json!({ "Peripherals": [
            { "PeripheralUID": 1, "BottomRailPosition": 10 },
            { "PeripheralUID": 4, "BottomRailPosition": 40 }
        ]}));
        let status_b = status(json!({ "Peripherals": [
            { "PeripheralUID": 4, "BottomRailPosition": 40 },
            { "PeripheralUID": 1, "BottomRailPosition": 10 }
        ]}));

        assert_eq!(merge(&forward, &status_a), merge(&reversed, &status_b));
    }
}

//! Device command handlers.

use tabled::Tabled;

use norman_core::{CoreError, Hub, HubConfig, PeripheralId, PeripheralRecord};

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Room")]
    room: String,
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Position")]
    position: String,
    #[tabled(rename = "Tilt")]
    tilt: String,
    #[tabled(rename = "Battery")]
    battery: String,
}

impl From<&PeripheralRecord> for DeviceRow {
    fn from(d: &PeripheralRecord) -> Self {
        Self {
            id: d.id.to_string(),
            name: d.name.clone(),
            room: d.room_name.clone().unwrap_or_default(),
            group: d.group_name.clone().unwrap_or_default(),
            position: output::position_label(d.position(), false),
            tilt: d.tilt().map(|t| format!("{t}%")).unwrap_or_default(),
            battery: d.battery_level.map(|b| format!("{b:.0}%")).unwrap_or_default(),
        }
    }
}

fn or_dash(value: Option<impl ToString>) -> String {
    value.map_or_else(|| "-".into(), |v| v.to_string())
}

pub(crate) fn detail(d: &PeripheralRecord, color: bool) -> String {
    let mut lines = vec![
        format!("ID:        {}", d.id),
        format!("Name:      {}", d.name),
        format!("Type:      {}", d.device_type),
        format!(
            "Room:      {}",
            d.room_name.as_deref().unwrap_or("-")
        ),
        format!(
            "Group:     {}",
            d.group_name.as_deref().unwrap_or("-")
        ),
        format!("Position:  {}", output::position_label(d.position(), color)),
        format!("Tilt:      {}", or_dash(d.tilt())),
    ];
    if let (Some(bottom), Some(middle)) = (
        d.target_bottom_rail_position,
        d.target_middle_rail_position,
    ) {
        lines.push(format!("Target:    {bottom} / {middle}"));
    }
    lines.push(format!(
        "Battery:   {}",
        d.battery_level
            .map_or_else(|| "-".into(), |b| format!("{b:.0}%"))
    ));
    lines.push(format!(
        "Firmware:  {}",
        d.firmware_version.as_deref().unwrap_or("-")
    ));
    if let Some(module) = d.module_type {
        lines.push(format!(
            "Module:    {module} / {}",
            or_dash(d.module_detail)
        ));
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    config: HubConfig,
    args: DevicesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let snapshot = Hub::oneshot(config, |hub| async move { Ok(hub.snapshot()) }).await?;
    let color = output::should_color(&global.color);

    let out = match args.command {
        DevicesCommand::List => {
            let devices: Vec<PeripheralRecord> = snapshot.iter().cloned().collect();
            output::render_list(
                &global.output,
                &devices,
                |d| DeviceRow::from(d),
                |d| d.id.to_string(),
            )?
        }
        DevicesCommand::Get { id } => {
            let device = snapshot
                .get(PeripheralId(id))
                .ok_or(CoreError::DeviceNotFound { id })?;
            output::render_single(
                &global.output,
                device,
                |d| detail(d, color),
                |d| d.id.to_string(),
            )?
        }
    };

    output::print_output(&out, global.quiet);
    Ok(())
}

//! Live view of the hub's notification stream.
//!
//! Prints the initial snapshot, then one line per peripheral whose record
//! changed in each published snapshot, until Ctrl-C.

use std::sync::Arc;

use chrono::Local;

use norman_core::{DeviceSnapshot, Hub, HubConfig, PeripheralId, PeripheralRecord};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

/// Records in `next` that are new or differ from `previous`.
fn changed_records<'a>(
    previous: &DeviceSnapshot,
    next: &'a DeviceSnapshot,
    filter: Option<PeripheralId>,
) -> Vec<&'a PeripheralRecord> {
    next.iter()
        .filter(|record| filter.is_none_or(|id| record.id == id))
        .filter(|record| previous.get(record.id) != Some(*record))
        .collect()
}

fn line(record: &PeripheralRecord, format: &OutputFormat, color: bool) -> Result<String, CliError> {
    match format {
        OutputFormat::Json | OutputFormat::JsonCompact => {
            serde_json::to_string(record).map_err(|e| CliError::Render(e.to_string()))
        }
        OutputFormat::Yaml => {
            serde_yaml::to_string(&[record]).map_err(|e| CliError::Render(e.to_string()))
        }
        OutputFormat::Plain => Ok(record.id.to_string()),
        OutputFormat::Table => Ok(format!(
            "{}  {:>4}  {:<20}  {:<8}  tilt {}",
            Local::now().format("%H:%M:%S"),
            record.id,
            record.name,
            output::position_label(record.position(), color),
            record
                .tilt()
                .map_or_else(|| "-".into(), |t| format!("{t}%")),
        )),
    }
}

fn print_changes(
    previous: &DeviceSnapshot,
    next: &DeviceSnapshot,
    filter: Option<PeripheralId>,
    global: &GlobalOpts,
    color: bool,
) -> Result<(), CliError> {
    for record in changed_records(previous, next, filter) {
        output::print_output(&line(record, &global.output, color)?, global.quiet);
    }
    Ok(())
}

pub async fn handle(
    mut config: HubConfig,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    config.notifications_enabled = true;
    if let Some(interval) = args.reconnect_interval {
        config.reconnect_interval = interval;
    }
    let filter = args.device.map(PeripheralId);
    let color = output::should_color(&global.color);

    let hub = Hub::connect(config).await?;
    if let Some(id) = filter {
        if !hub.is_available(id) {
            hub.shutdown().await;
            return Err(CliError::NotFound {
                resource_type: "Device".into(),
                identifier: id.to_string(),
            });
        }
    }

    let mut snapshots = hub.subscribe();
    let mut state = hub.connection_state();
    let initial = print_changes(
        &DeviceSnapshot::default(),
        snapshots.current(),
        filter,
        global,
        color,
    );
    let mut previous = Arc::clone(snapshots.current());

    if !global.quiet {
        eprintln!("Watching {} device(s), Ctrl-C to stop", hub.snapshot().len());
    }

    let result = match initial {
        Err(e) => Err(e),
        Ok(()) => loop {
            tokio::select! {
                biased;
                _ = tokio::signal::ctrl_c() => break Ok(()),
                changed = state.changed() => {
                    if changed.is_err() {
                        break Ok(());
                    }
                    let current = *state.borrow_and_update();
                    tracing::info!(state = %current, "notification listener state changed");
                }
                next = snapshots.changed() => {
                    let Some(next) = next else { break Ok(()) };
                    if let Err(e) = print_changes(&previous, &next, filter, global, color) {
                        break Err(e);
                    }
                    previous = next;
                }
            }
        },
    };

    hub.shutdown().await;
    result
}

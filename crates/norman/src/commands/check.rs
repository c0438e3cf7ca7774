//! Hub connectivity check.

use serde::Serialize;

use norman_core::{Hub, HubConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct CheckReport {
    host: String,
    port: u16,
    thing_name: Option<String>,
    devices: usize,
}

fn detail(report: &CheckReport, color: bool) -> String {
    [
        output::success("Hub reachable", color),
        format!("Host:       {}:{}", report.host, report.port),
        format!(
            "Thing name: {}",
            report.thing_name.as_deref().unwrap_or("-")
        ),
        format!("Devices:    {}", report.devices),
    ]
    .join("\n")
}

pub async fn handle(config: HubConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let host = config.host.clone();
    let port = config.port;

    let report = Hub::oneshot(config, |hub| async move {
        Ok(CheckReport {
            host,
            port,
            thing_name: hub.coordinator().api().thing_name(),
            devices: hub.snapshot().len(),
        })
    })
    .await?;

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &report,
        |r| detail(r, color),
        |r| r.thing_name.clone().unwrap_or_default(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

//! Resolves the hub to talk to from the config file, the selected
//! profile and the global flags. Flags win over the profile, the profile
//! wins over `[defaults]`.

use std::time::Duration;

use norman_config::{Config, Profile};
use norman_core::HubConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Build a `HubConfig` for a command that needs the hub.
pub fn resolve_hub_config(global: &GlobalOpts) -> Result<HubConfig, CliError> {
    let cfg = norman_config::load_config()?;
    hub_config_from(&cfg, global)
}

pub(crate) fn hub_config_from(cfg: &Config, global: &GlobalOpts) -> Result<HubConfig, CliError> {
    let mut profile = select_profile(cfg, global)?;

    if let Some(host) = &global.host {
        profile.host.clone_from(host);
    }
    if global.port.is_some() {
        profile.port = global.port;
    }

    let mut hub = norman_config::profile_to_hub_config(&profile, &cfg.defaults)?;
    if let Some(secs) = global.timeout {
        hub.request_timeout = Duration::from_secs(secs);
    }

    tracing::debug!(host = %hub.host, port = hub.port, "resolved hub config");
    Ok(hub)
}

/// The named or default profile, or a bare one when `--host` is given
/// and no profile applies.
fn select_profile(cfg: &Config, global: &GlobalOpts) -> Result<Profile, CliError> {
    match cfg.profile(global.profile.as_deref()) {
        Ok((_, profile)) => Ok(profile.clone()),
        Err(_) if global.profile.is_some() => {
            let name = global.profile.clone().unwrap_or_default();
            Err(CliError::ProfileNotFound {
                name,
                available: available_profiles(cfg),
            })
        }
        Err(_) => match &global.host {
            Some(host) => Ok(Profile::new(host.clone())),
            None => Err(CliError::NoConfig {
                path: norman_config::config_path().display().to_string(),
            }),
        },
    }
}

fn available_profiles(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        return "(none)".into();
    }
    cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
}

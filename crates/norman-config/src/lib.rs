//! Shared configuration for the Norman CLI.
//!
//! TOML hub profiles with environment overrides, and translation to
//! `norman_core::HubConfig`. The CLI layers its `GlobalOpts` flags on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use norman_core::HubConfig;

/// Prefix for environment overrides, e.g. `NORMAN_DEFAULTS__TIMEOUT=5`.
pub const ENV_PREFIX: &str = "NORMAN_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found in config")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named hub profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Look up a profile, falling back to `default_profile`.
    pub fn profile(&self, name: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Seconds to wait after a failed notification session.
    #[serde(default = "default_reconnect_interval")]
    pub reconnect_interval: u64,

    /// Maximum lifetime of one notification connection, in seconds.
    #[serde(default = "default_session_max_duration")]
    pub session_max_duration: u64,

    /// Bytes handed to the notification framer per step.
    #[serde(default = "default_read_chunk_size")]
    pub read_chunk_size: usize,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            reconnect_interval: default_reconnect_interval(),
            session_max_duration: default_session_max_duration(),
            read_chunk_size: default_read_chunk_size(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    10
}
fn default_reconnect_interval() -> u64 {
    15
}
fn default_session_max_duration() -> u64 {
    300
}
fn default_read_chunk_size() -> usize {
    1024
}

/// A named hub profile.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// Hub hostname or IP address.
    pub host: String,

    /// Override the hub API port (default 10123).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Override the request timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Override the reconnect interval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconnect_interval: Option<u64>,
}

impl Profile {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            timeout: None,
            reconnect_interval: None,
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("", "", "norman").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("norman");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from a specific file, then layer `NORMAN_*` env vars on top.
///
/// A missing file is not an error: defaults apply.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(&path, cfg)?;
    Ok(path)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a `HubConfig` from a profile and the global defaults.
pub fn profile_to_hub_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<HubConfig, ConfigError> {
    let host = profile.host.trim();
    if host.is_empty() {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: "must not be empty".into(),
        });
    }
    if defaults.read_chunk_size == 0 {
        return Err(ConfigError::Validation {
            field: "read_chunk_size".into(),
            reason: "must be at least 1".into(),
        });
    }
    if defaults.session_max_duration == 0 {
        return Err(ConfigError::Validation {
            field: "session_max_duration".into(),
            reason: "must be at least 1 second".into(),
        });
    }

    let mut config = HubConfig::new(host);
    if let Some(port) = profile.port {
        config.port = port;
    }
    config.request_timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.reconnect_interval = Duration::from_secs(
        profile
            .reconnect_interval
            .unwrap_or(defaults.reconnect_interval),
    );
    config.session_max_duration = Duration::from_secs(defaults.session_max_duration);
    config.read_chunk_size = defaults.read_chunk_size;
    Ok(config)
}

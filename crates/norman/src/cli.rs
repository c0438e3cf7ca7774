//! Clap derive structures for the `norman` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// norman -- control Norman window coverings from the command line
#[derive(Debug, Parser)]
#[command(
    name = "norman",
    version,
    about = "Control Norman window-covering hubs from the command line",
    long_about = "Reads device state from a Norman hub over its local HTTP API,\n\
        moves shades and their tilt rails, and follows the hub's\n\
        notification stream to watch state change live.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Hub profile to use
    #[arg(long, short = 'p', env = "NORMAN_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Hub hostname or IP address (overrides profile)
    #[arg(long, short = 'H', env = "NORMAN_HOST", global = true)]
    pub host: Option<String>,

    /// Hub API port (overrides profile)
    #[arg(long, env = "NORMAN_PORT", global = true)]
    pub port: Option<u16>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "NORMAN_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "NORMAN_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check that the hub is reachable and accepts registration
    Check,

    /// Inspect window coverings known to the hub
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Move a window covering
    #[command(alias = "c")]
    Cover(CoverArgs),

    /// Follow the hub's notification stream and print state changes
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Manage CLI configuration and hub profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List every peripheral with its current position
    #[command(alias = "ls")]
    List,

    /// Show one peripheral in detail
    Get {
        /// Peripheral ID
        id: i64,
    },
}

// ── Cover ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CoverArgs {
    /// Peripheral ID
    pub id: i64,

    #[command(subcommand)]
    pub action: CoverAction,
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum CoverAction {
    /// Raise the bottom rail fully
    Open,
    /// Lower the bottom rail fully
    Close,
    /// Hold the bottom rail where it is
    Stop,
    /// Move the bottom rail to a position (0 closed, 100 open)
    Position {
        #[arg(value_parser = clap::value_parser!(i64).range(0..=100))]
        value: i64,
    },
    /// Move the middle rail to a position (0 closed, 100 open)
    Tilt {
        #[arg(value_parser = clap::value_parser!(i64).range(0..=100))]
        value: i64,
    },
    /// Raise the middle rail fully
    OpenTilt,
    /// Lower the middle rail fully
    CloseTilt,
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Only report this peripheral
    #[arg(long, short = 'd')]
    pub device: Option<i64>,

    /// Pause after a failed notification session (e.g. "15s", "1m")
    #[arg(long, value_parser = humantime::parse_duration)]
    pub reconnect_interval: Option<Duration>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Show the resolved configuration
    Show,

    /// Save --host/--port as a hub profile and write the config file
    Init {
        /// Profile name
        #[arg(long, default_value = "default")]
        name: String,

        /// Replace an existing profile of the same name
        #[arg(long)]
        force: bool,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

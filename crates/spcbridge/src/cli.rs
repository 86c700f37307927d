//! Clap derive structures for the `spcbridge` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use spcbridge_core::EntityKind;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// spcbridge -- inspect and control an SPC panel through SPC Bridge
#[derive(Debug, Parser)]
#[command(
    name = "spcbridge",
    version,
    about = "Inspect and control Vanderbilt SPC panels through an SPC Bridge gateway",
    long_about = "Reads panel, area, zone, output, door and user state from an SPC Bridge\n\
        gateway, streams live changes over its push channel, and sends commands.",
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
    /// Gateway profile to use
    #[arg(long, short = 'p', env = "SPCBRIDGE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Gateway address (overrides profile)
    #[arg(long, short = 'g', env = "SPCBRIDGE_GATEWAY", global = true)]
    pub gateway: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "SPCBRIDGE_OUTPUT",
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

    /// HTTP request timeout in seconds (overrides profile)
    #[arg(long, env = "SPCBRIDGE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
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

#[derive(Debug, Clone, Copy, ValueEnum)]
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
    /// Panel summary and sync status
    #[command(alias = "st")]
    Status,

    /// List areas
    Areas(ListArgs),

    /// List zones
    #[command(alias = "z")]
    Zones(ZonesArgs),

    /// List outputs
    Outputs(ListArgs),

    /// List doors
    Doors(ListArgs),

    /// List SPC users
    Users,

    /// Send a command to a panel, area, zone, output or door
    #[command(alias = "cmd")]
    Command(CommandArgs),

    /// Show why areas would refuse to arm
    ArmStatus(ArmStatusArgs),

    /// Stream changes and sync-state transitions until Ctrl-C
    Watch,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Listing ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Include entities excluded in the profile
    #[arg(long, short = 'a')]
    pub all: bool,
}

#[derive(Debug, Args)]
pub struct ZonesArgs {
    #[command(flatten)]
    pub list: ListArgs,

    /// Only zones of this area
    #[arg(long)]
    pub area: Option<u32>,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CommandArgs {
    /// Entity kind: panel, area, zone, output, door
    pub kind: EntityKind,

    /// Entity id (the panel is always 1)
    pub id: u32,

    /// Action, e.g. set, set_a, unset, inhibit, on, open
    pub action: String,

    /// User code; translated through the keypad map when the profile uses `by_map`
    #[arg(long, short = 'c', env = "SPCBRIDGE_CODE", hide_env_values = true)]
    pub code: Option<String>,
}

#[derive(Debug, Args)]
pub struct ArmStatusArgs {
    /// Arm mode: set, set_a, set_b, unset
    pub mode: String,

    /// Only this area
    #[arg(long)]
    pub area: Option<u32>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a profile for --gateway
    Init(InitArgs),

    /// Print the configuration, secrets redacted
    Show,

    /// Print the config file path
    Path,

    /// Probe the gateway and print the panel serial
    Test,
}

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Use HTTPS when the gateway address has no scheme
    #[arg(long)]
    pub secure: bool,

    /// Password of the get (read) user
    #[arg(long)]
    pub get_password: Option<String>,

    /// Password of the put (command) user
    #[arg(long)]
    pub put_password: Option<String>,

    /// Password of the ws (push channel) user
    #[arg(long)]
    pub ws_password: Option<String>,

    /// Store passwords in the system keyring instead of the config file
    #[arg(long)]
    pub keyring: bool,

    /// Replace an existing profile of the same name
    #[arg(long, short = 'f')]
    pub force: bool,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}

//! Clap derive structures for the `adoptly` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.
//! Also compiled by `build.rs` for man pages, so it may only depend on
//! clap and clap_complete.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// adoptly -- provision hotspot devices from adoption payloads
#[derive(Debug, Parser)]
#[command(
    name = "adoptly",
    version,
    about = "Provision OpenWrt hotspot devices from JSON adoption payloads",
    long_about = "Translates a hotspot provisioning document (WLAN groups, WLANs,\n\
        RADIUS servers, guest portals) into UCI configuration packages and\n\
        commits them. Payloads come from a file or from an MQTT topic named\n\
        after the device's MAC address.",
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
    /// Directory holding the UCI packages [default: /etc/config]
    #[arg(long, env = "ADOPTLY_CONFIG_DIR", global = true, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Captive-portal backend to reconcile alongside wireless [default: chilli]
    #[arg(long, env = "ADOPTLY_HOTSPOT_BACKEND", global = true)]
    pub hotspot_backend: Option<HotspotBackend>,

    /// Keep going after a backend fails, rolling back only that package
    #[arg(long, global = true)]
    pub isolate: bool,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "ADOPTLY_OUTPUT",
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
}

// ── Value Enums ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HotspotBackend {
    /// Rebuild the dedicated `hotspot` package
    Hotspot,
    /// Update the stock `chilli` package in place
    Chilli,
    /// Only reconcile `wireless`
    None,
}

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
    /// Plain text (scripting)
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
    /// Apply a payload file to the configuration store
    Apply(ApplyArgs),

    /// Subscribe to this device's adoption topic and apply every payload
    Listen(ListenArgs),

    /// Summarize the WLANs a payload describes, without touching the store
    Inspect(InspectArgs),

    /// Print a package, section or option from the configuration store
    Show(ShowArgs),

    /// Print the adoption topic for a network interface
    Topic(TopicArgs),

    /// Manage the adoptly configuration file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Command Arguments ────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Payload file, or `-` for stdin
    pub file: PathBuf,

    /// Stage and print the resulting packages without committing
    #[arg(long)]
    pub dry_run: bool,
}

/// Interface selection shared by `listen` and `topic`.
#[derive(Debug, Args)]
pub struct IfaceArgs {
    /// Network interface whose MAC address names the device topic
    #[arg(long, short = 'n', value_name = "IFACE")]
    pub iface: String,

    /// Root of the sysfs tree used for MAC lookup
    #[arg(long, env = "ADOPTLY_SYSFS_ROOT", hide = true)]
    pub sysfs_root: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ListenArgs {
    #[command(flatten)]
    pub iface: IfaceArgs,

    /// Broker username [default: guest]
    #[arg(long)]
    pub username: Option<String>,

    /// Broker password [default: guest]
    #[arg(long, env = "ADOPTLY_BROKER_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Broker host [default: localhost]
    #[arg(long)]
    pub host: Option<String>,

    /// Broker port [default: 1883]
    #[arg(long)]
    pub port: Option<u16>,
}

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Payload file, or `-` for stdin
    pub file: PathBuf,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// `<package>[.<section>[.<option>]]`, sections by name or `@type[index]`
    pub selector: String,
}

#[derive(Debug, Args)]
pub struct TopicArgs {
    #[command(flatten)]
    pub iface: IfaceArgs,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a config file populated with the defaults
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Display the resolved configuration
    Show,

    /// Print the config file location
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

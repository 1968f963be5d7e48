//! CLI argument definitions
//!
//! All Clap derive structs for `confdefine` command-line parsing.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::observability::LogFormat;

// ============================================================================
// Root CLI
// ============================================================================

/// Expand `$name` / `${name}` definitions in directive-style configuration.
#[derive(Parser, Debug)]
#[command(name = "confdefine", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output, diagnostics included.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "CONFDEFINE_COLOR")]
    pub color: ColorChoice,

    /// Log record format on stderr.
    #[arg(long, default_value = "human", global = true, env = "CONFDEFINE_LOG_FORMAT")]
    pub log_format: LogFormat,
}

// ============================================================================
// Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the configuration with every definition substituted.
    Expand(ExpandArgs),

    /// List the definitions registered while reading a configuration.
    Defines(DefinesArgs),

    /// Report references that cannot be resolved, without printing the
    /// configuration.
    Check(CheckArgs),

    /// Display version information.
    Version(VersionArgs),
}

/// Arguments shared by commands that load a configuration.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Path to the configuration file.
    #[arg(env = "CONFDEFINE_CONFIG")]
    pub file: PathBuf,

    /// Define NAME=VALUE in every file of the configuration (repeatable).
    #[arg(short = 'D', long = "define", value_name = "NAME=VALUE", value_parser = parse_define)]
    pub defines: Vec<(String, String)>,
}

/// Arguments for `expand`.
#[derive(Args, Debug)]
pub struct ExpandArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,

    /// Fail with a non-zero exit code if any reference could not be expanded.
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for `defines`.
#[derive(Args, Debug)]
pub struct DefinesArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,

    /// Include the built-in `mod_define::*` entries.
    #[arg(long)]
    pub all: bool,
}

/// Arguments for `check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for version display.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Output format for structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

/// Parses a `NAME=VALUE` pair for `-D`.
///
/// # Errors
///
/// Returns a message if `=` is missing or the name is empty.
pub fn parse_define(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        Some(_) => Err("definition name must not be empty".to_string()),
        None => Err(format!("expected NAME=VALUE, got '{raw}'")),
    }
}

//! Logging setup for `confdefine`.
//!
//! Everything goes to stderr so `expand` output on stdout stays clean.
//! `CONFDEFINE_LOG_LEVEL` accepts any `EnvFilter` directive and overrides
//! `-v`; `--quiet` turns logging off regardless.

use std::io::IsTerminal;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::cli::args::ColorChoice;

/// Environment variable holding a filter directive.
pub const LOG_LEVEL_ENV: &str = "CONFDEFINE_LOG_LEVEL";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    /// Plain text, colored when the terminal allows it.
    #[default]
    Human,
    /// One JSON object per line.
    Json,
}

/// Resolved logging options for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogSettings {
    pub format: LogFormat,
    /// Level used when `CONFDEFINE_LOG_LEVEL` is unset.
    pub level: LevelFilter,
    pub ansi: bool,
    /// Ignore `CONFDEFINE_LOG_LEVEL` and log nothing.
    pub quiet: bool,
}

impl LogSettings {
    /// Builds settings from command-line flags.
    ///
    /// Substitution diagnostics are logged at `error`, so they show at the
    /// default verbosity.
    #[must_use]
    pub fn new(format: LogFormat, verbosity: u8, quiet: bool, color: ColorChoice) -> Self {
        Self {
            format,
            level: level_for(verbosity),
            ansi: ansi_enabled(
                color,
                std::io::stderr().is_terminal(),
                std::env::var_os("NO_COLOR").is_some(),
            ),
            quiet,
        }
    }

    fn filter(&self) -> EnvFilter {
        if self.quiet {
            return EnvFilter::new("off");
        }
        EnvFilter::builder()
            .with_default_directive(self.level.into())
            .with_env_var(LOG_LEVEL_ENV)
            .from_env_lossy()
    }
}

/// `-v` count to default level: warn, info, debug, then trace.
#[must_use]
pub const fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Whether to emit ANSI escapes. `auto` needs a terminal and no `NO_COLOR`.
#[must_use]
pub const fn ansi_enabled(color: ColorChoice, is_terminal: bool, no_color: bool) -> bool {
    match color {
        ColorChoice::Auto => is_terminal && !no_color,
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    }
}

/// Installs the global subscriber. A second call is a no-op.
pub fn init_logging(settings: &LogSettings) {
    // module paths only help when digging into debug output
    let show_target = settings.level >= LevelFilter::DEBUG;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(settings.filter())
        .with_target(show_target)
        .with_writer(std::io::stderr);

    let installed = match settings.format {
        LogFormat::Human => builder.with_ansi(settings.ansi).try_init(),
        LogFormat::Json => builder.json().with_ansi(false).try_init(),
    };
    if installed.is_err() {
        tracing::debug!("logging already initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_level() {
        assert_eq!(level_for(0), LevelFilter::WARN);
        assert_eq!(level_for(1), LevelFilter::INFO);
        assert_eq!(level_for(2), LevelFilter::DEBUG);
        assert_eq!(level_for(9), LevelFilter::TRACE);
    }

    #[test]
    fn auto_color_needs_terminal_and_no_opt_out() {
        assert!(ansi_enabled(ColorChoice::Auto, true, false));
        assert!(!ansi_enabled(ColorChoice::Auto, false, false));
        assert!(!ansi_enabled(ColorChoice::Auto, true, true));
        assert!(ansi_enabled(ColorChoice::Always, false, true));
        assert!(!ansi_enabled(ColorChoice::Never, true, false));
    }

    #[test]
    fn quiet_filter_is_off() {
        let settings = LogSettings::new(LogFormat::Human, 3, true, ColorChoice::Never);
        assert_eq!(settings.filter().to_string(), "off");
    }

    #[test]
    fn repeated_init_is_harmless() {
        let human = LogSettings::new(LogFormat::Human, 0, false, ColorChoice::Never);
        let json = LogSettings::new(LogFormat::Json, 2, false, ColorChoice::Never);
        init_logging(&human);
        init_logging(&json);
    }
}

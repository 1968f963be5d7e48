//! Error types for `confdefine`
//!
//! Host-side failures (reading and parsing configuration files) are
//! `ConfigError`s and abort the load. Substitution failures are
//! `SubstitutionError`s: they never abort anything, they are attached to a
//! [`Diagnostic`](crate::define::Diagnostic) and logged.

use std::path::{Path, PathBuf};
use thiserror::Error;

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `confdefine` CLI operations.
///
/// These codes follow Unix conventions.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Configuration error (unbalanced section, bad directive, include cycle)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Substitution produced diagnostics in strict mode
    pub const SUBSTITUTION_ERROR: i32 = 4;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `confdefine` operations.
///
/// Aggregates the domain errors and maps each one to an exit code.
#[derive(Debug, Error)]
pub enum ConfDefineError {
    /// Configuration loading error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Substitution left diagnostics behind and strict mode was requested
    #[error("{count} substitution diagnostic(s) reported")]
    Strict {
        /// Number of diagnostics produced by the walk
        count: usize,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfDefineError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(ConfigError::MissingFile { .. }) | Self::Io(_) => ExitCode::IO_ERROR,
            Self::Config(_) => ExitCode::CONFIG_ERROR,
            Self::Strict { .. } => ExitCode::SUBSTITUTION_ERROR,
            Self::Json(_) => ExitCode::ERROR,
        }
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Configuration loading errors.
///
/// Raised by the directive parser while reading configuration files and
/// executing `Define`/`Include` on read.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Malformed line in a configuration file
    #[error("parse error in {}: {message}", location(.path, .line.as_ref()))]
    ParseError {
        /// Path to the configuration file
        path: PathBuf,
        /// Line number where the error occurred (if available)
        line: Option<usize>,
        /// What went wrong
        message: String,
    },

    /// Section opened without a matching close, or closed without an open
    #[error("unbalanced section <{name}> in {path} at line {line}")]
    UnbalancedSection {
        /// Path to the configuration file
        path: PathBuf,
        /// Line of the offending section tag
        line: usize,
        /// Section name as written
        name: String,
    },

    /// Circular include detected in configuration files
    #[error("circular include detected: {cycle:?}")]
    CircularInclude {
        /// The cycle of file paths that form the circular reference
        cycle: Vec<PathBuf>,
    },

    /// Referenced configuration file not found
    #[error("file not found: {path}")]
    MissingFile {
        /// Path to the missing file
        path: PathBuf,
    },

    /// Directive or limit has an invalid value
    #[error("invalid value for '{field}': got '{value}', expected {expected}")]
    InvalidValue {
        /// Name of the directive or limit
        field: String,
        /// The actual value provided
        value: String,
        /// Description of what was expected
        expected: String,
    },

    /// Reading a configuration file failed
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path being read
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

// ============================================================================
// Substitution Errors
// ============================================================================

/// Reasons a single directive's arguments could not be (fully) expanded.
///
/// These are reported, not returned: the walk logs them and moves on to the
/// next node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubstitutionError {
    /// Reference resolved to nothing in the table or the environment
    #[error("Variable '{name}' not defined{}", suggestion_suffix(.suggestion.as_deref()))]
    UndefinedVariable {
        /// Name as written inside the reference
        name: String,
        /// Closest defined name in the same scope, if any
        suggestion: Option<String>,
    },

    /// Braced reference contains a character that cannot appear in a name
    #[error("Illegal character '{ch}' in identifier")]
    IllegalCharacter {
        /// The offending character
        ch: char,
    },

    /// Braced reference runs to the end of the line without a close brace
    #[error("Unterminated reference: missing closing '{close}'")]
    UnterminatedReference {
        /// The close-brace character that was expected
        close: char,
    },

    /// Expanded line grew beyond the configured maximum
    #[error("Expanded line exceeds {limit} bytes")]
    LineTooLong {
        /// Configured maximum line length
        limit: usize,
    },

    /// Too many substitutions on a single line, likely a self-reference
    #[error("More than {limit} substitutions on one line")]
    TooManySubstitutions {
        /// Configured maximum substitution count
        limit: usize,
    },

    /// Splice span does not lie on character boundaries within the buffer
    #[error("Invalid splice span {offset}..{end} for buffer of {len} bytes")]
    InvalidSpan {
        /// Start of the span
        offset: usize,
        /// End of the span
        end: usize,
        /// Buffer length
        len: usize,
    },
}

fn location(path: &Path, line: Option<&usize>) -> String {
    match line {
        Some(line) => format!("{}:{line}", path.display()),
        None => path.display().to_string(),
    }
}

fn suggestion_suffix(suggestion: Option<&str>) -> String {
    suggestion.map_or_else(String::new, |s| format!(" (did you mean '{s}'?)"))
}

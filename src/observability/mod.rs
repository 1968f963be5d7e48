//! Observability
//!
//! Structured logging for configuration loading and substitution.

pub mod logging;

pub use logging::{LogFormat, LogSettings, init_logging};

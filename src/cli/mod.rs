//! Command-line interface
//!
//! Argument definitions and command handlers for the `confdefine` binary.

pub mod args;
pub mod commands;

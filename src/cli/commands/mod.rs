//! CLI command dispatch and handlers
//!
//! Routes parsed CLI arguments to the appropriate command handler.

pub mod check;
pub mod defines;
pub mod expand;
pub mod version;

use crate::cli::args::{Cli, Commands, SourceArgs};
use crate::config::{ConfigCycle, DirectiveTree};
use crate::error::ConfDefineError;

/// Dispatch a parsed CLI invocation to the appropriate command handler.
///
/// # Errors
///
/// Returns an error if the dispatched command handler fails.
pub fn dispatch(cli: Cli) -> Result<(), ConfDefineError> {
    match cli.command {
        Commands::Expand(args) => expand::run(&args),
        Commands::Defines(args) => defines::run(&args),
        Commands::Check(args) => check::run(&args),
        Commands::Version(args) => {
            version::run(&args);
            Ok(())
        }
    }
}

/// Parses the configuration named by `source` and applies `-D` definitions.
fn load(source: &SourceArgs) -> Result<(ConfigCycle, DirectiveTree), ConfDefineError> {
    tracing::info!(config = %source.file.display(), "loading configuration");
    let mut cycle = ConfigCycle::new();
    let tree = cycle.load(&source.file)?;
    for (name, value) in &source.defines {
        cycle.define_everywhere(name, value, &tree);
    }
    Ok((cycle, tree))
}

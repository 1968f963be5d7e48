//! `defines` command
//!
//! Lists the definition table built while reading a configuration.

use indexmap::IndexMap;

use crate::cli::args::{DefinesArgs, OutputFormat};
use crate::define::{RESERVED_SCOPE, SCOPE_SEPARATOR};
use crate::error::ConfDefineError;

/// Print every registered definition, in registration order.
///
/// # Errors
///
/// Returns a config error if the file cannot be parsed.
pub fn run(args: &DefinesArgs) -> Result<(), ConfDefineError> {
    let (mut cycle, _tree) = super::load(&args.source)?;
    {
        let reserved = format!("{RESERVED_SCOPE}{SCOPE_SEPARATOR}");

        let entries: IndexMap<&str, &str> = cycle
            .table()
            .iter()
            .filter(|(key, _)| args.all || !key.starts_with(&reserved))
            .collect();

        match args.format {
            OutputFormat::Human => {
                for (key, value) in &entries {
                    println!("{key} = {value}");
                }
            }
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        }
    }
    cycle.finish();
    Ok(())
}

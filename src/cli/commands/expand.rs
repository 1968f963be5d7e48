//! `expand` command
//!
//! Prints the configuration with every resolvable reference substituted.

use serde_json::json;

use crate::cli::args::{ExpandArgs, OutputFormat};
use crate::error::ConfDefineError;

/// Load, substitute and print the configuration.
///
/// # Errors
///
/// Returns a config error if the file cannot be parsed, or
/// [`ConfDefineError::Strict`] when `--strict` is set and any reference
/// was left unexpanded.
pub fn run(args: &ExpandArgs) -> Result<(), ConfDefineError> {
    let (mut cycle, mut tree) = super::load(&args.source)?;
    let report = cycle.substitute(&mut tree);

    match args.format {
        OutputFormat::Human => print!("{}", tree.render()),
        OutputFormat::Json => {
            let out = json!({
                "directives": tree.to_view(),
                "report": report,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }
    cycle.finish();

    if args.strict && !report.is_clean() {
        return Err(ConfDefineError::Strict {
            count: report.diagnostics.len(),
        });
    }
    Ok(())
}

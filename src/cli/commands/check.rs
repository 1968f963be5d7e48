//! `check` command
//!
//! Runs substitution and reports every directive that could not be
//! expanded.

use crate::cli::args::{CheckArgs, OutputFormat};
use crate::error::ConfDefineError;

/// Load and substitute the configuration, printing diagnostics.
///
/// # Errors
///
/// Returns [`ConfDefineError::Strict`] if any diagnostic was produced.
pub fn run(args: &CheckArgs) -> Result<(), ConfDefineError> {
    let (mut cycle, mut tree) = super::load(&args.source)?;
    let report = cycle.substitute(&mut tree);
    cycle.finish();

    match args.format {
        OutputFormat::Human => {
            for diag in &report.diagnostics {
                println!("{}:{}: {}", diag.file, diag.line, diag.error);
            }
            if report.skipped {
                println!("no definitions, nothing to substitute");
            } else {
                println!(
                    "{} directive(s), {} rewritten, {} problem(s)",
                    report.visited,
                    report.rewritten,
                    report.diagnostics.len()
                );
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if report.is_clean() {
        Ok(())
    } else {
        Err(ConfDefineError::Strict {
            count: report.diagnostics.len(),
        })
    }
}

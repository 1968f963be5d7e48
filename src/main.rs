//! `confdefine` - expand definitions in configuration files

use clap::Parser;

use confdefine::cli::args::Cli;
use confdefine::cli::commands;
use confdefine::error::ExitCode;
use confdefine::observability::{LogSettings, init_logging};

fn main() {
    let cli = Cli::parse();

    init_logging(&LogSettings::new(
        cli.log_format,
        cli.verbose,
        cli.quiet,
        cli.color,
    ));

    match commands::dispatch(cli) {
        Ok(()) => std::process::exit(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}

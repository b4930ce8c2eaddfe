//! `confstack`: load, validate and inspect layered YAML configuration.

use clap::Parser;
use confstack::cli::{self, Cli};
use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli::run(&cli, &mut io::stdout().lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let _ = cli::report_error(&err, &mut io::stderr().lock());
            ExitCode::from(cli::exit_code(&err))
        }
    }
}

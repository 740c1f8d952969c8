use clap::Parser;
use sortdir::cli::{Args, run_cli};
use sortdir::logging;
use sortdir::output::OutputFormatter;
use std::process::ExitCode;

fn main() -> ExitCode {
    logging::init_logger();

    let args = Args::parse();

    match run_cli(&args) {
        Ok(status) if status.has_failures() => ExitCode::from(1),
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&format!("Error: {}", e));
            ExitCode::from(2)
        }
    }
}

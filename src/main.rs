//! Basil compiler CLI entry point.

use clap::Parser;
use std::process;
use tracing::{error, Level};
use tracing_subscriber::{fmt, EnvFilter};

use basil::cli::Cli;

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        3 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let env_filter = EnvFilter::from_default_env()
        .add_directive(format!("basil={log_level}").parse().expect("valid directive"));

    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cli.run() {
        error!("{e}");
        for cause in e.chain().skip(1) {
            error!("  caused by: {cause}");
        }
        process::exit(1);
    }
}

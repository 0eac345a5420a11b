//! Options bundle CLI
//!
//! Builds the compiler options bundle from a properties directory and prints
//! it (or its hash) to stdout.

mod cli;
mod commands;
mod config;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;

use cli::Cli;
use commands::{Output, run_build};
use config::Settings;
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let settings = Settings::from_cli(&cli)?;
    tracing::debug!(?settings, "Resolved runtime settings");

    let output = if cli.hash_only {
        Output::HashOnly
    } else if cli.pretty {
        Output::PrettyJson
    } else {
        Output::Json
    };

    let runtime = tokio::runtime::Runtime::new()?;
    let rendered = runtime.block_on(run_build(
        &settings,
        cli.compilers.as_deref(),
        output,
        cli.verbose,
    ))?;
    println!("{rendered}");
    Ok(())
}

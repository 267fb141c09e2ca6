//! Schema-driven record export tool.
//!
//! Exports, searches and imports records held in a JSON store, using a
//! schema descriptor file for field whitelists and export naming.

use admin_export::Cli;
use admin_export_core::{init_logging, initialize_descriptor_validator};
use clap::Parser;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.global.verbose, cli.global.quiet)?;

    // Initialize descriptor validator
    initialize_descriptor_validator()?;

    let mut stdout = std::io::stdout().lock();
    let succeeded = admin_export::execute(&cli, &mut stdout).await?;

    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

//! Binary crate for the `cityweather` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration
//! - Human-friendly output formatting

use clap::Parser;

mod cli;
mod render;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cityweather_core=info,cityweather_cli=info".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}

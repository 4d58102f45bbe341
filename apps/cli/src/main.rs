//! postcrew CLI: multi-agent technical blog post generator.
//!
//! Runs a research, writing, fact-checking, editing and illustration
//! pipeline against a language model and keeps the resulting posts in a
//! local output directory.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}

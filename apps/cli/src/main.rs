//! Crammese CLI: learn a language while you play.
//!
//! Builds a bilingual resource pack language file from the game's own
//! translations and those of installed modules, optionally prefixing nouns
//! with their grammatical article.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}

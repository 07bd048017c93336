//! Leafwiki CLI Binary Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use leafwiki_core::{open_storage, PageStore, WikiConfig};

mod cli;
mod commands;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = cli::Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            WikiConfig::from_yaml(&content)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => WikiConfig::default(),
    };
    if let Some(db) = cli.db {
        config.storage.path = db;
    }

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    let storage = open_storage(&config.storage)
        .await
        .context("opening page storage")?;
    let store = PageStore::new(storage);

    let mut out = std::io::stdout().lock();
    commands::exec(&store, cli.cmd, &mut out).await
}

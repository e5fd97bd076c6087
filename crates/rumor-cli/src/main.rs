//! Rumor CLI - Command-line interface for the rumor engine.

use clap::Parser;
use rumor_cli::commands;
use rumor_cli::{Cli, Command, Config, Formatter};
use rumor_engine::{RumorService, TracingPublisher};
use rumor_store::SqliteStore;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize tracing (log to stderr so command output stays clean)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run().await {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run() -> rumor_cli::Result<String> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(Path::new(path))?,
        None => Config::load()?,
    };

    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    let db_path = config.database_path(cli.database.as_deref())?;
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    tracing::debug!(database = %db_path.display(), "Opening rumor database");

    let store = SqliteStore::new(&db_path)?;
    let service = Arc::new(
        RumorService::new(store, config.engine.clone())?.with_publisher(Arc::new(TracingPublisher)),
    );

    match cli.command {
        Command::Create(args) => commands::execute_create(args, &service, &formatter),
        Command::Import(args) => commands::execute_import(args, &service, &formatter),
        Command::Show(args) => commands::execute_show(args, &service, &formatter),
        Command::List(args) => commands::execute_list(args, &service, &formatter),
        Command::Spread(args) => commands::execute_spread(args, &service, &formatter),
        Command::Believe(args) => commands::execute_believe(args, &service, &formatter),
        Command::Decay(args) => commands::execute_decay(args, &service, &formatter),
        Command::Delete(args) => commands::execute_delete(args, &service, &formatter),
        Command::Known(args) => commands::execute_known(args, &service, &formatter),
        Command::Lineage(args) => commands::execute_lineage(args, &service, &formatter),
        Command::Stats => commands::execute_stats(&service, &formatter),
        Command::Worker(args) => commands::execute_worker(args, service, &formatter).await,
    }
}

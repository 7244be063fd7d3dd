use clap::Parser;
use tracing_subscriber::EnvFilter;

mod args;
mod commands;

use args::{Cli, Command};

#[tokio::main]
async fn main() {
    // Load .env file if present, before clap reads DATABASE_URL
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // RUST_LOG wins; otherwise --verbose raises the default level to debug
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match &cli.command {
        Command::Fill(args) => commands::fill::run(args).await,
        Command::Introspect(args) => commands::introspect::run(args).await,
        Command::Plan(args) => commands::plan::run(args).await,
        Command::Graph(args) => commands::graph::run(args).await,
        Command::Preview(args) => commands::preview::run(args).await,
    };

    if let Err(err) = result {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use store::StateStore;

mod aggregate;
mod catalog;
mod cli;
mod commands;
mod engine;
mod feedback;
mod models;
mod store;
mod timer;
mod types;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let db_path = "./formcoach.db";

    let store = Arc::new(StateStore::open(db_path).await?);

    match cli.cmd {
        Commands::Workout(cmd) => commands::workout::handle(cmd, cli.json)?,
        Commands::Session(cmd) => commands::session::handle(cmd, store).await?,
        Commands::Progress(cmd) => commands::progress::handle(cmd, cli.json, &store).await?,
        Commands::Feedback { score } => commands::feedback::handle(score, cli.json)?,
        Commands::Config(cmd) => commands::config::handle(cmd).await?,
    }

    Ok(())
}

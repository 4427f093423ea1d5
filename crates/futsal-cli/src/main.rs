//! Futsal dashboard CLI.
//!
//! A command-line front-end for the ICE Futsal Fest tournament server:
//! standings, results and fixtures for everyone, record editing for the
//! tournament admin.

mod app;
mod cli;
mod commands;
mod logging;
mod output;

use anyhow::Result;
use clap::Parser;
use futsal_core::Config;
use tracing::info;

use app::App;
use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = Config::load()?;

    let log_file = cli.log_file.clone().or_else(|| config.log_file.clone());
    let _guard = logging::init_tracing(log_file.as_deref())?;
    info!("futsal starting");

    let app = App::new(config)?;
    commands::run(&app, cli.command).await
}

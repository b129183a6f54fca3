//! Kuba - hot-seat terminal game
//!
//! Plays one game, and any rematches, between two players sharing a
//! terminal.

#![warn(missing_docs)]

mod cli;
mod terminal;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use kuba_game::GameConfig;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Play {
            config,
            time_control_secs,
            first_move_secs,
            win_threshold,
            json,
        } => {
            let config = load_config(config, time_control_secs, first_move_secs, win_threshold)?;
            terminal::play(config, json).await
        }
        Command::CheckConfig { path } => check_config(path),
    }
}

/// Builds the game config from an optional file plus command-line overrides.
#[instrument]
fn load_config(
    path: Option<PathBuf>,
    time_control_secs: Option<u64>,
    first_move_secs: Option<u64>,
    win_threshold: Option<u32>,
) -> Result<GameConfig> {
    let mut config = match path {
        Some(path) => GameConfig::from_file(path)?,
        None => GameConfig::default(),
    };
    if let Some(secs) = time_control_secs {
        config = config.with_time_control(Duration::from_secs(secs));
    }
    if let Some(secs) = first_move_secs {
        config = config.with_first_move_timeout(Duration::from_secs(secs));
    }
    if let Some(threshold) = win_threshold {
        config = config.with_win_threshold(threshold);
    }
    config.validate()?;
    Ok(config)
}

/// Validates a config file and prints the result
fn check_config(path: PathBuf) -> Result<()> {
    let config = GameConfig::from_file(&path)?;
    info!(path = %path.display(), "Config is valid");
    println!("{}", toml::to_string(&config)?);
    Ok(())
}

//! Command-line interface for the kuba binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Kuba - marble-pushing game engine with a hot-seat terminal front end
#[derive(Parser, Debug)]
#[command(name = "kuba")]
#[command(about = "Play Kuba in the terminal", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play a hot-seat game on this terminal
    Play {
        /// Path to a TOML game config
        #[arg(short, long, env = "KUBA_CONFIG")]
        config: Option<PathBuf>,

        /// Thinking time per player, in seconds
        #[arg(long)]
        time_control_secs: Option<u64>,

        /// Time allowed for the first move, in seconds
        #[arg(long)]
        first_move_secs: Option<u64>,

        /// Red marbles needed to win
        #[arg(long)]
        win_threshold: Option<u32>,

        /// Print the client view as JSON instead of the board
        #[arg(long)]
        json: bool,
    },

    /// Load a config file and report whether it is valid
    CheckConfig {
        /// Path to the TOML game config
        path: PathBuf,
    },
}

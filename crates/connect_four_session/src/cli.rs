//! Command-line interface for the Connect Four client.

use clap::{Parser, Subcommand};
use connect_four_session::Difficulty;
use std::path::PathBuf;

/// Connect Four - play against a remote opponent
#[derive(Parser, Debug)]
#[command(name = "connect_four")]
#[command(about = "Play Connect Four against a move-resolution service", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the client configuration file
    #[arg(short, long, global = true, default_value = "connect_four.toml")]
    pub config: PathBuf,

    /// Override the resolution service URL
    #[arg(long, global = true)]
    pub server_url: Option<String>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play an interactive game on stdin/stdout
    Play {
        /// Opponent strength (easy, medium, hard); defaults to the config value
        #[arg(short, long)]
        difficulty: Option<Difficulty>,
    },

    /// Print the effective configuration as TOML
    Config,
}

//! Connect Four - terminal client
//!
//! Line-oriented front end over [`SessionController`].

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use connect_four_session::{
    ClientConfig, Difficulty, MoveResolver, PlayerInput, SessionController, SessionError,
    ViewSnapshot,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, instrument, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,connect_four_session=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::load(&cli.config)?;
    if let Some(url) = cli.server_url {
        config = config.with_base_url(url);
    }
    config.validate()?;

    match cli.command {
        Command::Play { difficulty } => {
            let difficulty = difficulty.unwrap_or(*config.difficulty());
            run_play(&config, difficulty).await
        }
        Command::Config => {
            let text = toml::to_string_pretty(&config).context("Failed to render config")?;
            print!("{}", text);
            Ok(())
        }
    }
}

/// Runs an interactive game until `q` or end of input.
#[instrument(skip(config), fields(base_url = %config.base_url()))]
async fn run_play(config: &ClientConfig, difficulty: Difficulty) -> Result<()> {
    let controller = SessionController::from_config(config)?;
    info!("Starting game");

    report(&controller, controller.start(difficulty).await);
    println!(
        "Enter a column (0-{}), c to continue after an error, r to restart, q to quit.",
        config.columns() - 1
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let result = match line.parse::<PlayerInput>() {
            Ok(PlayerInput::Quit) => break,
            Ok(PlayerInput::Restart) => {
                controller.reset();
                controller.start(difficulty).await
            }
            Ok(PlayerInput::Continue) => controller.resume().await,
            Ok(PlayerInput::Column(column)) => controller.play(column).await,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };
        report(&controller, result);
    }

    info!("Leaving game");
    Ok(())
}

fn report<R: MoveResolver>(
    controller: &SessionController<R>,
    result: Result<ViewSnapshot, SessionError>,
) {
    match result {
        Ok(snapshot) => {
            print!("{}", snapshot.board);
            if let Some(column) = snapshot.last_opponent_column {
                println!("Opponent played column {}", column);
            }
            println!("{}", snapshot.status_line());
        }
        Err(e) => {
            warn!(error = %e, "Command failed");
            println!("{}", e);
            if controller.snapshot().awaiting_resume() {
                println!("The opponent has not replied. Type c to ask again.");
            } else if e.is_recoverable() {
                println!("Try again.");
            }
        }
    }
}

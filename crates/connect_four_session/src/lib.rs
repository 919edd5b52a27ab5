//! Connect Four session orchestrator.
//!
//! The player's opponent lives behind a network boundary. This crate owns the
//! client side of that arrangement: it keeps the board snapshot, sequences
//! player and opponent turns, rejects illegal moves before they are sent, and
//! folds the service's verdicts into a single [`ViewSnapshot`] that any
//! presentation layer can poll or subscribe to.
//!
//! # Architecture
//!
//! - **Machine**: [`SessionMachine`] owns the [`Session`] and its transitions
//! - **Resolution**: [`MoveResolver`] is the service boundary;
//!   [`HttpResolutionClient`] speaks its JSON over HTTP
//! - **Controller**: [`SessionController`] runs `start`/`play`/`reset`
//!
//! # Example
//!
//! ```no_run
//! use connect_four_session::{ClientConfig, Difficulty, SessionController};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ClientConfig::new("http://127.0.0.1:8000");
//! let controller = SessionController::from_config(&config)?;
//!
//! controller.start(Difficulty::Medium).await?;
//! let snapshot = controller.play(3).await?;
//! println!("{}\n{}", snapshot.board, snapshot.status_line());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod controller;
mod difficulty;
mod error;
mod input;
mod machine;
mod outcome;
mod resolution;
mod view;

// Crate-level exports - Configuration
pub use config::{ClientConfig, ConfigError, Endpoints, RetryPolicy, SERVER_URL_ENV};

// Crate-level exports - Session controller
pub use controller::SessionController;

// Crate-level exports - Errors
pub use error::{MalformedResponse, ResolutionError, SessionError};

// Crate-level exports - State machine
pub use machine::{Folded, Pending, Phase, RequestKind, Session, SessionMachine, Ticket};

// Crate-level exports - Resolution client
pub use resolution::wire;
pub use resolution::{HttpResolutionClient, MoveResolver, Resolution};

// Crate-level exports - Text input
pub use input::{PlayerInput, UnknownInput};

// Crate-level exports - Domain types
pub use difficulty::Difficulty;
pub use outcome::Outcome;
pub use view::ViewSnapshot;

// Board model re-exports
pub use connect_four::{Board, Cell, Coord, Dimensions, IllegalMove, Owner};

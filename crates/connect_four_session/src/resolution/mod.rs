//! Typed boundary to the external move-resolution service.
//!
//! The service is the only authority on legality, win detection and the
//! opponent's choice of column. Everything it sends is parsed into a
//! [`Resolution`] before the session ever sees it.

mod http;
mod validate;
pub mod wire;

pub use http::HttpResolutionClient;

use crate::difficulty::Difficulty;
use crate::error::{MalformedResponse, ResolutionError};
use crate::outcome::Outcome;
use connect_four::{Board, Coord, Dimensions, Owner};
use derive_getters::Getters;
use std::collections::BTreeSet;
use wire::WireSnapshot;

/// A service verdict that passed schema validation.
///
/// Only [`Resolution::from_wire`] constructs one, so holding a `Resolution`
/// means the board has the session's dimensions, every cell is in range, and
/// the winning line belongs to the winner.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct Resolution {
    /// Authoritative board.
    board: Board,
    /// Who moves next.
    turn: Owner,
    /// Game classification.
    outcome: Outcome,
    /// Winning cells; empty unless the game was won.
    winning_line: Vec<Coord>,
    /// Columns accepting a piece; empty once the game is over.
    legal_columns: BTreeSet<usize>,
    /// Column the opponent played in this verdict, when reported.
    opponent_column: Option<usize>,
}

impl Resolution {
    /// Validates a raw snapshot against the session's board size.
    pub fn from_wire(
        snapshot: WireSnapshot,
        dimensions: Dimensions,
    ) -> Result<Self, MalformedResponse> {
        validate::validate_snapshot(snapshot, dimensions)
    }
}

/// Client side of the move-resolution service.
///
/// Implementations validate every response into a [`Resolution`] and never
/// retry on their own; retry policy belongs to the controller.
#[async_trait::async_trait]
pub trait MoveResolver: Send + Sync {
    /// Opens a session, letting the opponent move first when asked.
    async fn new_session(
        &self,
        difficulty: Difficulty,
        opponent_starts_first: bool,
    ) -> Result<Resolution, ResolutionError>;

    /// Submits the player's column against `board`.
    async fn request_move(
        &self,
        board: &Board,
        column: usize,
        difficulty: Difficulty,
    ) -> Result<Resolution, ResolutionError>;

    /// Asks for the opponent's reply to `board`.
    async fn request_opponent_reply(
        &self,
        board: &Board,
        difficulty: Difficulty,
    ) -> Result<Resolution, ResolutionError>;
}

#[async_trait::async_trait]
impl<R: MoveResolver + ?Sized> MoveResolver for std::sync::Arc<R> {
    async fn new_session(
        &self,
        difficulty: Difficulty,
        opponent_starts_first: bool,
    ) -> Result<Resolution, ResolutionError> {
        (**self).new_session(difficulty, opponent_starts_first).await
    }

    async fn request_move(
        &self,
        board: &Board,
        column: usize,
        difficulty: Difficulty,
    ) -> Result<Resolution, ResolutionError> {
        (**self).request_move(board, column, difficulty).await
    }

    async fn request_opponent_reply(
        &self,
        board: &Board,
        difficulty: Difficulty,
    ) -> Result<Resolution, ResolutionError> {
        (**self).request_opponent_reply(board, difficulty).await
    }
}

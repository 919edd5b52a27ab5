//! Read-only snapshot for presentation layers.

use crate::difficulty::Difficulty;
use crate::machine::{Phase, SessionMachine};
use crate::outcome::Outcome;
use connect_four::{Board, Coord, Owner};
use serde::Serialize;
use std::collections::BTreeSet;

/// Everything a view needs to draw the game and enable input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewSnapshot {
    /// Session phase.
    pub phase: Phase,
    /// Board to draw.
    pub board: Board,
    /// Whose move is awaited.
    pub turn_owner: Option<Owner>,
    /// Game classification.
    pub outcome: Outcome,
    /// Cells to highlight.
    pub winning_cells: Vec<Coord>,
    /// Columns that accept a piece.
    pub legal_columns: BTreeSet<usize>,
    /// Difficulty of the running session.
    pub difficulty: Option<Difficulty>,
    /// True while a command is being processed.
    pub busy: bool,
    /// Column the opponent played last, when the service reported it.
    pub last_opponent_column: Option<usize>,
}

impl ViewSnapshot {
    /// Captures the machine's state.
    pub fn capture(machine: &SessionMachine, busy: bool) -> Self {
        let session = machine.session();
        Self {
            phase: session.phase(),
            board: session.board().clone(),
            turn_owner: session.turn(),
            outcome: session.outcome(),
            winning_cells: session.winning_line().to_vec(),
            legal_columns: session.legal_columns().clone(),
            difficulty: session.difficulty(),
            busy: busy || machine.is_pending(),
            last_opponent_column: session.last_opponent_column(),
        }
    }

    /// Whether input should be enabled at all.
    pub fn can_play(&self) -> bool {
        self.phase == Phase::AwaitingPlayer && !self.busy
    }

    /// Whether the button for `column` should be enabled.
    pub fn column_enabled(&self, column: usize) -> bool {
        self.can_play() && self.legal_columns.contains(&column)
    }

    /// True when the opponent is to move but no request is outstanding,
    /// so a failed reply has to be resumed before play can continue.
    pub fn awaiting_resume(&self) -> bool {
        self.phase == Phase::AwaitingOpponentReply && !self.busy
    }

    /// Whether `coord` is part of the winning line.
    pub fn is_winning_cell(&self, coord: Coord) -> bool {
        self.winning_cells.contains(&coord)
    }

    /// One-line status for the user.
    pub fn status_line(&self) -> &'static str {
        match (self.phase, self.outcome) {
            (_, Outcome::PlayerWon) => "You win!",
            (_, Outcome::OpponentWon) => "Opponent wins!",
            (_, Outcome::Drawn) => "Draw!",
            (Phase::Uninitialized, _) => "Press start",
            (Phase::AwaitingResolution, _) => "Waiting for the server…",
            (Phase::AwaitingOpponentReply, _) => "Opponent is thinking…",
            (Phase::AwaitingPlayer, _) if self.busy => "Waiting for the server…",
            (Phase::AwaitingPlayer, _) => "Your move",
            (Phase::Terminal, _) => "Game over",
        }
    }
}

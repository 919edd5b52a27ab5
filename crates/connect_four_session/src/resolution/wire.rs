//! JSON shapes exchanged with the resolution service.
//!
//! Response fields are decoded loosely (plain integers and strings) so that
//! range violations surface as a specific [`crate::MalformedResponse`] from
//! validation instead of an opaque decode failure.

use crate::difficulty::Difficulty;
use serde::{Deserialize, Serialize};

/// Turn value for the player.
pub const TURN_PLAYER: &str = "player";
/// Turn value for the opponent.
pub const TURN_OPPONENT: &str = "ai";
/// Winner code for an opponent win.
pub const WINNER_OPPONENT: i64 = 1;
/// Winner code for a player win.
pub const WINNER_PLAYER: i64 = -1;

/// Body of the new-session request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSessionRequest {
    /// Requested level.
    pub difficulty: Difficulty,
    /// Whether the opponent opens.
    pub opponent_starts_first: bool,
}

impl NewSessionRequest {
    /// JSON body with the opener flag stored under `opener_field`.
    ///
    /// Services disagree on that key; `opponentStartsFirst` matches the
    /// derived serialization.
    pub fn to_body(&self, opener_field: &str) -> serde_json::Value {
        let mut body = serde_json::Map::new();
        body.insert(
            "difficulty".to_string(),
            serde_json::Value::String(self.difficulty.to_string()),
        );
        body.insert(
            opener_field.to_string(),
            serde_json::Value::Bool(self.opponent_starts_first),
        );
        serde_json::Value::Object(body)
    }
}

/// Body of the move request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    /// Board before the player's move, as wire codes.
    pub board: Vec<Vec<i8>>,
    /// Column the player chose.
    pub column: usize,
    /// Requested level.
    pub difficulty: Difficulty,
}

/// Body of the opponent-reply request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpponentReplyRequest {
    /// Board the opponent should reply to.
    pub board: Vec<Vec<i8>>,
    /// Requested level.
    pub difficulty: Difficulty,
}

/// Session snapshot as sent by the service, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireSnapshot {
    /// Rows of cell codes, top first.
    pub board: Vec<Vec<i64>>,
    /// `"player"` or `"ai"`.
    pub turn: String,
    /// Whether the game has ended.
    pub over: bool,
    /// `1`, `-1` or absent.
    #[serde(default)]
    pub winner: Option<i64>,
    /// `[row, column]` pairs of the winning line.
    #[serde(default)]
    pub winning_pieces: Option<Vec<[i64; 2]>>,
    /// Columns accepting a piece.
    #[serde(rename = "legalMoves")]
    pub legal_moves: Vec<i64>,
    /// Column the opponent played in this response, if any.
    #[serde(default, rename = "aiMove", skip_serializing_if = "Option::is_none")]
    pub ai_move: Option<i64>,
}

//! Opponent strength, as understood by the resolution service.

use serde::{Deserialize, Serialize};

/// Difficulty level forwarded to the resolution service.
///
/// The search itself happens on the service; locally the level only decides
/// who opens the game.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Difficulty {
    /// Shallow search, no heuristics.
    Easy,
    /// The default level.
    #[default]
    Medium,
    /// Deepest search; the opponent moves first.
    Hard,
}

impl Difficulty {
    /// Whether the opponent makes the opening move at this level.
    pub fn opponent_starts_first(self) -> bool {
        matches!(self, Difficulty::Hard)
    }
}

//! Game outcome classification.

use connect_four::Owner;
use serde::{Deserialize, Serialize};

/// How the game stands. Every variant but `InProgress` is terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Moves are still being played.
    #[default]
    InProgress,
    /// The player connected four.
    PlayerWon,
    /// The opponent connected four.
    OpponentWon,
    /// The board filled up without a winner.
    Drawn,
}

impl Outcome {
    /// Outcome for a win by `owner`.
    pub fn won_by(owner: Owner) -> Self {
        match owner {
            Owner::Player => Outcome::PlayerWon,
            Owner::Opponent => Outcome::OpponentWon,
        }
    }

    /// True for every outcome except [`Outcome::InProgress`].
    pub fn is_terminal(self) -> bool {
        self != Outcome::InProgress
    }

    /// The winner, if the game was won.
    pub fn winner(self) -> Option<Owner> {
        match self {
            Outcome::PlayerWon => Some(Owner::Player),
            Outcome::OpponentWon => Some(Owner::Opponent),
            Outcome::InProgress | Outcome::Drawn => None,
        }
    }
}

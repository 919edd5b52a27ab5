//! Line commands for text front ends.

use std::str::FromStr;

/// One line typed by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerInput {
    /// Drop a piece into this column.
    Column(usize),
    /// Discard the game and start a new one.
    Restart,
    /// Ask the opponent again after a failed reply.
    Continue,
    /// Leave the game.
    Quit,
}

/// A line that is not a command.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
#[display("Not a column or command: {}", _0)]
pub struct UnknownInput(pub String);

impl std::error::Error for UnknownInput {}

impl FromStr for PlayerInput {
    type Err = UnknownInput;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        match line.to_ascii_lowercase().as_str() {
            "r" | "restart" => Ok(PlayerInput::Restart),
            "c" | "continue" => Ok(PlayerInput::Continue),
            "q" | "quit" => Ok(PlayerInput::Quit),
            other => other
                .parse()
                .map(PlayerInput::Column)
                .map_err(|_| UnknownInput(line.to_string())),
        }
    }
}

//! Fixtures shared by the session tests.

#![allow(dead_code)]

use connect_four_session::wire::{TURN_OPPONENT, TURN_PLAYER, WINNER_OPPONENT, WINNER_PLAYER, WireSnapshot};
use connect_four_session::{Board, Dimensions, Owner, Resolution};

/// Board rows as wire codes.
pub fn codes(board: &Board) -> Vec<Vec<i64>> {
    board
        .to_codes()
        .into_iter()
        .map(|row| row.into_iter().map(i64::from).collect())
        .collect()
}

fn turn_name(turn: Owner) -> String {
    match turn {
        Owner::Player => TURN_PLAYER.to_string(),
        Owner::Opponent => TURN_OPPONENT.to_string(),
    }
}

/// In-progress snapshot whose legal moves agree with `board`.
pub fn in_progress(board: &Board, turn: Owner) -> WireSnapshot {
    WireSnapshot {
        board: codes(board),
        turn: turn_name(turn),
        over: false,
        winner: None,
        winning_pieces: None,
        legal_moves: board.legal_columns().into_iter().map(|c| c as i64).collect(),
        ai_move: None,
    }
}

/// Snapshot reporting the opponent's reply in `column`.
pub fn with_reply(board: &Board, column: usize) -> WireSnapshot {
    WireSnapshot {
        ai_move: Some(column as i64),
        ..in_progress(board, Owner::Player)
    }
}

/// Finished snapshot won by `winner` along `line`.
pub fn won(board: &Board, winner: Owner, line: &[(usize, usize)]) -> WireSnapshot {
    WireSnapshot {
        over: true,
        winner: Some(match winner {
            Owner::Player => WINNER_PLAYER,
            Owner::Opponent => WINNER_OPPONENT,
        }),
        winning_pieces: Some(line.iter().map(|&(r, c)| [r as i64, c as i64]).collect()),
        ..in_progress(board, Owner::Player)
    }
}

/// Validates `snapshot` against the standard board.
pub fn resolve(snapshot: WireSnapshot) -> Resolution {
    Resolution::from_wire(snapshot, Dimensions::STANDARD).expect("fixture snapshot is valid")
}

/// Drops pieces in order, alternating from `first`.
pub fn board_with(drops: &[usize], first: Owner) -> Board {
    let mut board = Board::empty(Dimensions::STANDARD);
    let mut owner = first;
    for &column in drops {
        board = board.apply_drop(column, owner).expect("fixture drop is legal");
        owner = owner.other();
    }
    board
}

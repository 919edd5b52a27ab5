//! Schema validation for service snapshots.

use super::Resolution;
use super::wire::{TURN_OPPONENT, TURN_PLAYER, WINNER_OPPONENT, WINNER_PLAYER, WireSnapshot};
use crate::error::MalformedResponse;
use crate::outcome::Outcome;
use connect_four::{Board, Cell, Coord, Dimensions, Owner};
use std::collections::BTreeSet;
use tracing::{debug, error, instrument};

/// Parses a raw snapshot into a [`Resolution`].
#[instrument(skip(snapshot), fields(over = snapshot.over, turn = %snapshot.turn))]
pub(super) fn validate_snapshot(
    snapshot: WireSnapshot,
    dimensions: Dimensions,
) -> Result<Resolution, MalformedResponse> {
    let result = parse(snapshot, dimensions);
    match &result {
        Ok(resolution) => debug!(outcome = ?resolution.outcome, "Snapshot validated"),
        Err(e) => error!(error = %e, "Snapshot failed validation"),
    }
    result
}

fn parse(snapshot: WireSnapshot, dimensions: Dimensions) -> Result<Resolution, MalformedResponse> {
    let board = parse_board(snapshot.board, dimensions)?;
    let turn = parse_turn(&snapshot.turn)?;
    let winner = parse_winner(snapshot.winner)?;

    let outcome = match (snapshot.over, winner) {
        (false, Some(_)) => return Err(MalformedResponse::WinnerWhileInProgress),
        (false, None) => Outcome::InProgress,
        (true, Some(owner)) => Outcome::won_by(owner),
        (true, None) if board.is_full() => Outcome::Drawn,
        (true, None) => return Err(MalformedResponse::DrawWithOpenColumns),
    };

    let winning_line = parse_winning_line(
        snapshot.winning_pieces.unwrap_or_default(),
        &board,
        outcome.winner(),
    )?;

    let reported = parse_columns(&snapshot.legal_moves, dimensions)?;
    let legal_columns = if outcome.is_terminal() {
        BTreeSet::new()
    } else {
        let derived = board.legal_columns();
        if reported != derived {
            return Err(MalformedResponse::LegalMovesMismatch { reported, derived });
        }
        derived
    };

    let opponent_column = snapshot
        .ai_move
        .map(|column| {
            in_range(column, dimensions.columns)
                .ok_or(MalformedResponse::OpponentMoveOutOfRange(column))
        })
        .transpose()?;

    Ok(Resolution {
        board,
        turn,
        outcome,
        winning_line,
        legal_columns,
        opponent_column,
    })
}

fn parse_board(rows: Vec<Vec<i64>>, dimensions: Dimensions) -> Result<Board, MalformedResponse> {
    let cells = rows
        .into_iter()
        .enumerate()
        .map(|(row, values)| {
            values
                .into_iter()
                .enumerate()
                .map(|(column, value)| {
                    Cell::from_code(value).ok_or(MalformedResponse::CellValue { row, column, value })
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .collect::<Result<Vec<_>, _>>()?;

    let board =
        Board::from_rows(cells).map_err(|e| MalformedResponse::BoardShape(e.to_string()))?;

    if board.dimensions() != dimensions {
        return Err(MalformedResponse::Dimensions {
            expected: dimensions,
            found: board.dimensions(),
        });
    }
    Ok(board)
}

fn parse_turn(turn: &str) -> Result<Owner, MalformedResponse> {
    match turn {
        TURN_PLAYER => Ok(Owner::Player),
        TURN_OPPONENT => Ok(Owner::Opponent),
        other => Err(MalformedResponse::Turn(other.to_string())),
    }
}

fn parse_winner(winner: Option<i64>) -> Result<Option<Owner>, MalformedResponse> {
    match winner {
        None => Ok(None),
        Some(WINNER_OPPONENT) => Ok(Some(Owner::Opponent)),
        Some(WINNER_PLAYER) => Ok(Some(Owner::Player)),
        Some(other) => Err(MalformedResponse::Winner(other)),
    }
}

fn parse_winning_line(
    pieces: Vec<[i64; 2]>,
    board: &Board,
    winner: Option<Owner>,
) -> Result<Vec<Coord>, MalformedResponse> {
    let Some(winner) = winner else {
        if pieces.is_empty() {
            return Ok(Vec::new());
        }
        return Err(MalformedResponse::UnexpectedWinningLine);
    };

    if pieces.is_empty() {
        return Err(MalformedResponse::MissingWinningLine);
    }

    let dimensions = board.dimensions();
    pieces
        .into_iter()
        .map(|[row, column]| {
            let coord = match (in_range(row, dimensions.rows), in_range(column, dimensions.columns)) {
                (Some(row), Some(column)) => Coord::new(row, column),
                _ => return Err(MalformedResponse::WinningCellOutOfBounds { row, column }),
            };
            match board.get(coord) {
                Some(Cell::Occupied(owner)) if owner == winner => Ok(coord),
                _ => Err(MalformedResponse::WinningCellOwner(coord)),
            }
        })
        .collect()
}

fn parse_columns(columns: &[i64], dimensions: Dimensions) -> Result<BTreeSet<usize>, MalformedResponse> {
    columns
        .iter()
        .map(|&column| {
            in_range(column, dimensions.columns).ok_or(MalformedResponse::LegalMoveOutOfRange(column))
        })
        .collect()
}

fn in_range(value: i64, bound: usize) -> Option<usize> {
    usize::try_from(value).ok().filter(|&value| value < bound)
}

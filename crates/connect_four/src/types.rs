//! Core domain types for Connect Four.

use serde::{Deserialize, Serialize};

/// Owner of a piece, and of the turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Owner {
    /// The human player.
    Player,
    /// The computer opponent behind the resolution service.
    Opponent,
}

impl Owner {
    /// Returns the other side.
    pub fn other(self) -> Self {
        match self {
            Owner::Player => Owner::Opponent,
            Owner::Opponent => Owner::Player,
        }
    }
}

/// A single cell of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    /// No piece.
    Empty,
    /// Holds a piece of the given owner.
    Occupied(Owner),
}

impl Cell {
    /// Wire code for an empty cell.
    pub const EMPTY_CODE: i8 = 0;
    /// Wire code for an opponent piece.
    pub const OPPONENT_CODE: i8 = 1;
    /// Wire code for a player piece.
    pub const PLAYER_CODE: i8 = -1;

    /// Decodes a wire value, rejecting anything outside `{0, 1, -1}`.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Cell::Empty),
            1 => Some(Cell::Occupied(Owner::Opponent)),
            -1 => Some(Cell::Occupied(Owner::Player)),
            _ => None,
        }
    }

    /// Encodes the cell for the wire.
    pub fn code(self) -> i8 {
        match self {
            Cell::Empty => Self::EMPTY_CODE,
            Cell::Occupied(Owner::Opponent) => Self::OPPONENT_CODE,
            Cell::Occupied(Owner::Player) => Self::PLAYER_CODE,
        }
    }

    /// Returns the owner of the piece, if any.
    pub fn owner(self) -> Option<Owner> {
        match self {
            Cell::Empty => None,
            Cell::Occupied(owner) => Some(owner),
        }
    }

    /// True for [`Cell::Empty`].
    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }
}

/// A `(row, column)` coordinate; row 0 is the top of the board.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, derive_more::Display,
)]
#[display("({row}, {column})")]
pub struct Coord {
    /// Row index, top to bottom.
    pub row: usize,
    /// Column index, left to right.
    pub column: usize,
}

impl Coord {
    /// Creates a coordinate.
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

/// Board size. Fixed for the lifetime of a session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[display("{rows}x{columns}")]
pub struct Dimensions {
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub columns: usize,
}

impl Dimensions {
    /// The canonical 6 rows by 7 columns.
    pub const STANDARD: Dimensions = Dimensions::new(6, 7);

    /// Creates dimensions.
    pub const fn new(rows: usize, columns: usize) -> Self {
        Self { rows, columns }
    }

    /// Total number of cells.
    pub fn cell_count(self) -> usize {
        self.rows * self.columns
    }

    /// True when `coord` lies on a board of this size.
    pub fn contains(self, coord: Coord) -> bool {
        coord.row < self.rows && coord.column < self.columns
    }
}

impl Default for Dimensions {
    fn default() -> Self {
        Self::STANDARD
    }
}

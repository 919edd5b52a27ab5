//! The immutable Connect Four grid.

use crate::error::{IllegalMove, ShapeError};
use crate::types::{Cell, Coord, Dimensions, Owner};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::instrument;

/// An R×C grid of cells, row 0 at the top.
///
/// Boards are values: no method takes `&mut self`. [`Board::apply_drop`]
/// returns a fresh board and leaves its input untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Board {
    dimensions: Dimensions,
    /// Cells in row-major order.
    cells: Vec<Cell>,
}

/// Pieces that appeared between two boards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PieceDelta {
    /// New player pieces.
    pub player: usize,
    /// New opponent pieces.
    pub opponent: usize,
}

impl PieceDelta {
    /// Total number of new pieces.
    pub fn total(self) -> usize {
        self.player + self.opponent
    }
}

impl Board {
    /// Creates an empty board.
    #[instrument]
    pub fn empty(dimensions: Dimensions) -> Self {
        Self {
            dimensions,
            cells: vec![Cell::Empty; dimensions.cell_count()],
        }
    }

    /// Builds a board from rows, top row first.
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Result<Self, ShapeError> {
        let columns = rows.first().map(Vec::len).unwrap_or(0);
        if columns == 0 {
            return Err(ShapeError::Empty);
        }

        let dimensions = Dimensions::new(rows.len(), columns);
        let mut cells = Vec::with_capacity(dimensions.cell_count());
        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != columns {
                return Err(ShapeError::Ragged {
                    row,
                    expected: columns,
                    found: values.len(),
                });
            }
            cells.extend(values);
        }

        Ok(Self { dimensions, cells })
    }

    /// Returns the board size.
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Returns the cell at `coord`, or `None` off the board.
    pub fn get(&self, coord: Coord) -> Option<Cell> {
        if !self.dimensions.contains(coord) {
            return None;
        }
        self.cells.get(self.index(coord)).copied()
    }

    /// Iterates over rows, top first.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.dimensions.columns.max(1))
    }

    /// Row where a piece dropped into `column` would land.
    pub fn landing_row(&self, column: usize) -> Result<usize, IllegalMove> {
        if column >= self.dimensions.columns {
            return Err(IllegalMove::ColumnOutOfRange {
                column,
                columns: self.dimensions.columns,
            });
        }

        (0..self.dimensions.rows)
            .rev()
            .find(|&row| self.cell(row, column).is_empty())
            .ok_or(IllegalMove::ColumnFull(column))
    }

    /// True when `column` is in range, its top cell is empty and it has room.
    pub fn is_column_playable(&self, column: usize) -> bool {
        column < self.dimensions.columns
            && self.dimensions.rows > 0
            && self.cell(0, column).is_empty()
            && self.landing_row(column).is_ok()
    }

    /// Every playable column, ascending.
    pub fn legal_columns(&self) -> BTreeSet<usize> {
        (0..self.dimensions.columns)
            .filter(|&column| self.is_column_playable(column))
            .collect()
    }

    /// Drops a piece into `column`, returning the resulting board.
    ///
    /// # Errors
    ///
    /// [`IllegalMove::ColumnOutOfRange`] or [`IllegalMove::ColumnFull`].
    #[instrument(skip(self), fields(dimensions = %self.dimensions))]
    pub fn apply_drop(&self, column: usize, owner: Owner) -> Result<Board, IllegalMove> {
        let row = self.landing_row(column)?;
        let mut next = self.clone();
        let index = next.index(Coord::new(row, column));
        next.cells[index] = Cell::Occupied(owner);
        Ok(next)
    }

    /// True when no column can take another piece.
    pub fn is_full(&self) -> bool {
        self.legal_columns().is_empty()
    }

    /// Number of pieces belonging to `owner`.
    pub fn count(&self, owner: Owner) -> usize {
        self.cells
            .iter()
            .filter(|cell| cell.owner() == Some(owner))
            .count()
    }

    /// Compares against an earlier board of the same game.
    ///
    /// Returns `None` when the sizes differ or any occupied cell of `earlier`
    /// changed; pieces are never removed or recoloured.
    pub fn pieces_added_since(&self, earlier: &Board) -> Option<PieceDelta> {
        if self.dimensions != earlier.dimensions {
            return None;
        }

        let mut delta = PieceDelta::default();
        for (before, after) in earlier.cells.iter().zip(&self.cells) {
            match (before, after) {
                (Cell::Empty, Cell::Empty) => {}
                (Cell::Empty, Cell::Occupied(Owner::Player)) => delta.player += 1,
                (Cell::Empty, Cell::Occupied(Owner::Opponent)) => delta.opponent += 1,
                (Cell::Occupied(_), _) if before != after => return None,
                (Cell::Occupied(_), _) => {}
            }
        }
        Some(delta)
    }

    /// Rows of wire codes, top first.
    pub fn to_codes(&self) -> Vec<Vec<i8>> {
        self.rows()
            .map(|row| row.iter().map(|cell| cell.code()).collect())
            .collect()
    }

    fn index(&self, coord: Coord) -> usize {
        coord.row * self.dimensions.columns + coord.column
    }

    fn cell(&self, row: usize, column: usize) -> Cell {
        self.cells[self.index(Coord::new(row, column))]
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let header: Vec<String> = (0..self.dimensions.columns)
            .map(|column| (column % 10).to_string())
            .collect();
        writeln!(f, "{}", header.join(" "))?;

        for row in self.rows() {
            let symbols: Vec<&str> = row
                .iter()
                .map(|cell| match cell {
                    Cell::Empty => ".",
                    Cell::Occupied(Owner::Player) => "X",
                    Cell::Occupied(Owner::Opponent) => "O",
                })
                .collect();
            writeln!(f, "{}", symbols.join(" "))?;
        }
        Ok(())
    }
}

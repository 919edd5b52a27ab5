//! Board model errors.

/// A drop that the board cannot accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum IllegalMove {
    /// The column index is outside `[0, columns)`.
    #[display("Column {column} is out of range (board has {columns} columns)")]
    ColumnOutOfRange {
        /// Requested column.
        column: usize,
        /// Number of columns on the board.
        columns: usize,
    },

    /// The column has no empty cell left.
    #[display("Column {} is full", _0)]
    ColumnFull(usize),
}

impl std::error::Error for IllegalMove {}

/// Row data that does not form a rectangular, non-empty grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum ShapeError {
    /// No rows, or a first row without columns.
    #[display("Board has no cells")]
    Empty,

    /// A row whose length differs from the first row.
    #[display("Row {row} has {found} cells, expected {expected}")]
    Ragged {
        /// Offending row index.
        row: usize,
        /// Length of the first row.
        expected: usize,
        /// Length of the offending row.
        found: usize,
    },
}

impl std::error::Error for ShapeError {}

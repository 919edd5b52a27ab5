//! Connect Four board model.
//!
//! A [`Board`] is an immutable value: every drop returns a new board, so a
//! snapshot handed to a view layer can never change underneath it.
//!
//! # Example
//!
//! ```
//! use connect_four::{Board, Cell, Coord, Dimensions, Owner};
//!
//! let board = Board::empty(Dimensions::STANDARD);
//! let next = board.apply_drop(3, Owner::Player).unwrap();
//!
//! assert_eq!(next.get(Coord::new(5, 3)), Some(Cell::Occupied(Owner::Player)));
//! assert_eq!(board.get(Coord::new(5, 3)), Some(Cell::Empty));
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod board;
mod error;
mod types;

pub use board::{Board, PieceDelta};
pub use error::{IllegalMove, ShapeError};
pub use types::{Cell, Coord, Dimensions, Owner};

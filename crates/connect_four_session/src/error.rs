//! Error taxonomy for the session orchestrator.
//!
//! Every failure is scoped to one command attempt. [`SessionError`] is what
//! callers of the controller see; [`ResolutionError`] is what the resolution
//! client reports; [`MalformedResponse`] names the exact contract violation.

use connect_four::{Coord, Dimensions, IllegalMove};
use std::collections::BTreeSet;

/// A response that arrived with a success status but broke the contract.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum MalformedResponse {
    /// Body was not a decodable session snapshot.
    #[display("Undecodable payload: {}", _0)]
    Decode(String),

    /// Board rows are ragged or empty.
    #[display("Board is not a grid: {}", _0)]
    BoardShape(String),

    /// Board dimensions differ from the session's.
    #[display("Board is {found}, expected {expected}")]
    Dimensions {
        /// Session dimensions.
        expected: Dimensions,
        /// Dimensions in the response.
        found: Dimensions,
    },

    /// A cell value outside `{0, 1, -1}`.
    #[display("Cell ({row}, {column}) has invalid value {value}")]
    CellValue {
        /// Row of the cell.
        row: usize,
        /// Column of the cell.
        column: usize,
        /// Value received.
        value: i64,
    },

    /// Turn outside `{player, ai}`.
    #[display("Unknown turn {:?}", _0)]
    Turn(String),

    /// Winner outside `{1, -1, null}`.
    #[display("Unknown winner {}", _0)]
    Winner(i64),

    /// A winner was reported for a game that is not over.
    #[display("Winner reported while the game is still in progress")]
    WinnerWhileInProgress,

    /// A win without a winning line.
    #[display("Win reported without winning cells")]
    MissingWinningLine,

    /// Winning cells without a winner.
    #[display("Winning cells reported without a winner")]
    UnexpectedWinningLine,

    /// A winning-line coordinate off the board.
    #[display("Winning cell [{row}, {column}] is out of bounds")]
    WinningCellOutOfBounds {
        /// Row received.
        row: i64,
        /// Column received.
        column: i64,
    },

    /// A winning-line cell that is empty or owned by the loser.
    #[display("Winning cell {} does not belong to the winner", _0)]
    WinningCellOwner(Coord),

    /// A draw reported while columns are still open.
    #[display("Draw reported with playable columns left")]
    DrawWithOpenColumns,

    /// A legal-move entry outside the board.
    #[display("Legal move {} is out of range", _0)]
    LegalMoveOutOfRange(i64),

    /// The reported legal moves disagree with the board.
    #[display("Reported legal moves {reported:?} disagree with board {derived:?}")]
    LegalMovesMismatch {
        /// Columns the service reported.
        reported: BTreeSet<usize>,
        /// Columns derived from the board.
        derived: BTreeSet<usize>,
    },

    /// The opponent's move column lies outside the board.
    #[display("Opponent move {} is out of range", _0)]
    OpponentMoveOutOfRange(i64),

    /// The new board does not follow from the previous one.
    #[display("Board does not follow from the previous state: {}", _0)]
    Discontinuity(String),
}

impl std::error::Error for MalformedResponse {}

/// Failure reported by a [`crate::MoveResolver`].
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ResolutionError {
    /// Transport failure or non-success status, with the raw diagnostic text.
    #[display("{}", _0)]
    Unavailable(String),

    /// Success status, but the payload failed validation.
    #[display("{}", _0)]
    Malformed(MalformedResponse),

    /// The request itself was malformed and was never sent.
    #[display("Refusing to send invalid request: {}", _0)]
    InvalidRequest(String),
}

impl std::error::Error for ResolutionError {}

impl From<MalformedResponse> for ResolutionError {
    fn from(err: MalformedResponse) -> Self {
        Self::Malformed(err)
    }
}

/// Failure of a session command.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum SessionError {
    /// The column is not a legal move. Input can simply be re-enabled.
    #[display("Illegal move: {}", _0)]
    IllegalMove(IllegalMove),

    /// The game has ended; only reset is accepted.
    #[display("Game is already over")]
    GameOver,

    /// Another command is still in flight.
    #[display("Session is busy with another command")]
    Busy,

    /// The resolution service could not be reached or refused the request.
    #[display("Resolution service unavailable: {}", _0)]
    ResolutionUnavailable(String),

    /// The resolution service broke its contract. The session is unchanged.
    #[display("Malformed response from resolution service: {}", _0)]
    MalformedResponse(MalformedResponse),

    /// No game has been started.
    #[display("No game in progress")]
    NotStarted,

    /// A game is already running; reset first.
    #[display("Game already started")]
    AlreadyStarted,

    /// The opponent is to move.
    #[display("Waiting for the opponent's reply")]
    NotPlayersTurn,

    /// Local state failed a shape check before transmission.
    #[display("Invalid local state: {}", _0)]
    InvalidLocalState(String),
}

impl std::error::Error for SessionError {}

impl SessionError {
    /// True when the command can simply be issued again.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            SessionError::MalformedResponse(_) | SessionError::InvalidLocalState(_)
        )
    }
}

impl From<IllegalMove> for SessionError {
    fn from(err: IllegalMove) -> Self {
        Self::IllegalMove(err)
    }
}

impl From<MalformedResponse> for SessionError {
    fn from(err: MalformedResponse) -> Self {
        Self::MalformedResponse(err)
    }
}

impl From<ResolutionError> for SessionError {
    fn from(err: ResolutionError) -> Self {
        match err {
            ResolutionError::Unavailable(text) => Self::ResolutionUnavailable(text),
            ResolutionError::Malformed(reason) => Self::MalformedResponse(reason),
            ResolutionError::InvalidRequest(text) => Self::InvalidLocalState(text),
        }
    }
}

//! Session state machine.
//!
//! The machine owns the [`Session`] aggregate and is the only place it
//! changes. Every change either replaces the whole session or flips its
//! pending request, so an observer never sees a half-applied verdict.
//!
//! Board mutation is deferred to the service: submitting a move records a
//! pending request and leaves the board untouched until a validated
//! [`Resolution`] for that exact request is folded.

use crate::difficulty::Difficulty;
use crate::error::{MalformedResponse, SessionError};
use crate::outcome::Outcome;
use crate::resolution::Resolution;
use connect_four::{Board, Coord, Dimensions, Owner};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info, instrument, warn};

/// Where the session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
pub enum Phase {
    /// No game has been started.
    Uninitialized,
    /// A start or player move was sent; the board is unchanged until the verdict arrives.
    AwaitingResolution,
    /// The player may drop a piece.
    AwaitingPlayer,
    /// The opponent is to move.
    AwaitingOpponentReply,
    /// The game is over; only reset is accepted.
    Terminal,
}

/// Sequence number of one outstanding request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
#[display("#{}", _0)]
pub struct Ticket(u64);

impl Ticket {
    /// Raw sequence number.
    pub fn sequence(self) -> u64 {
        self.0
    }
}

/// What an outstanding request asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// A fresh session.
    NewSession,
    /// The player's drop into `column`.
    PlayerMove {
        /// Column submitted.
        column: usize,
    },
    /// The opponent's reply.
    OpponentReply,
}

/// The request the session is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pending {
    /// Ticket the verdict must carry.
    pub ticket: Ticket,
    /// What was asked.
    pub kind: RequestKind,
}

/// Result of offering a verdict to the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Folded {
    /// The verdict was applied; the session is now in this phase.
    Applied(Phase),
    /// The verdict answered a superseded request and was dropped.
    Stale,
}

/// One game, from start to terminal outcome or reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    board: Board,
    turn: Option<Owner>,
    outcome: Outcome,
    winning_line: Vec<Coord>,
    legal_columns: BTreeSet<usize>,
    difficulty: Option<Difficulty>,
    phase: Phase,
    pending: Option<Pending>,
    last_opponent_column: Option<usize>,
    /// Highest sequence number issued so far.
    sequence: u64,
}

impl Session {
    fn fresh(dimensions: Dimensions, sequence: u64) -> Self {
        Self {
            board: Board::empty(dimensions),
            turn: None,
            outcome: Outcome::InProgress,
            winning_line: Vec::new(),
            legal_columns: BTreeSet::new(),
            difficulty: None,
            phase: Phase::Uninitialized,
            pending: None,
            last_opponent_column: None,
            sequence,
        }
    }

    /// Current board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Whose move is awaited; `None` before start and after the game ends.
    pub fn turn(&self) -> Option<Owner> {
        self.turn
    }

    /// Game classification.
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Winning cells, empty unless the game was won.
    pub fn winning_line(&self) -> &[Coord] {
        &self.winning_line
    }

    /// Columns the player may choose.
    pub fn legal_columns(&self) -> &BTreeSet<usize> {
        &self.legal_columns
    }

    /// Difficulty the session was started with.
    pub fn difficulty(&self) -> Option<Difficulty> {
        self.difficulty
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Outstanding request, if any.
    pub fn pending(&self) -> Option<Pending> {
        self.pending
    }

    /// Column of the opponent's latest reported move.
    pub fn last_opponent_column(&self) -> Option<usize> {
        self.last_opponent_column
    }

    /// Highest sequence number issued so far.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// Owns the session and enforces its transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMachine {
    dimensions: Dimensions,
    session: Session,
}

impl SessionMachine {
    /// Creates a machine with an uninitialized session.
    #[instrument]
    pub fn new(dimensions: Dimensions) -> Self {
        Self {
            dimensions,
            session: Session::fresh(dimensions, 0),
        }
    }

    /// The current session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Board size of every session this machine creates.
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.session.phase
    }

    /// True when a request is outstanding.
    pub fn is_pending(&self) -> bool {
        self.session.pending.is_some()
    }

    /// Whether the user can drop a piece right now.
    pub fn can_player_act(&self) -> bool {
        self.session.phase == Phase::AwaitingPlayer && !self.is_pending()
    }

    /// Discards the session for a fresh uninitialized one.
    ///
    /// The sequence counter carries over, so any outstanding ticket can no
    /// longer match.
    #[instrument(skip(self), fields(phase = %self.session.phase))]
    pub fn reset(&mut self) {
        if let Some(pending) = self.session.pending {
            info!(ticket = %pending.ticket, "Reset invalidates outstanding request");
        }
        self.session = Session::fresh(self.dimensions, self.session.sequence);
        debug!("Session reset");
    }

    /// Records a new-session request.
    #[instrument(skip(self))]
    pub fn begin_start(&mut self, difficulty: Difficulty) -> Result<Ticket, SessionError> {
        self.ensure_idle()?;
        match self.session.phase {
            Phase::Uninitialized => {}
            Phase::Terminal => return Err(SessionError::GameOver),
            _ => return Err(SessionError::AlreadyStarted),
        }

        let ticket = self.issue(RequestKind::NewSession);
        self.session.difficulty = Some(difficulty);
        self.session.phase = Phase::AwaitingResolution;
        info!(%ticket, "Start requested");
        Ok(ticket)
    }

    /// Records the player's move after checking it locally.
    ///
    /// An illegal column fails here and never reaches the network.
    #[instrument(skip(self))]
    pub fn begin_player_move(&mut self, column: usize) -> Result<Ticket, SessionError> {
        self.ensure_idle()?;
        match self.session.phase {
            Phase::AwaitingPlayer => {}
            Phase::Terminal => return Err(SessionError::GameOver),
            Phase::Uninitialized => return Err(SessionError::NotStarted),
            Phase::AwaitingOpponentReply | Phase::AwaitingResolution => {
                return Err(SessionError::NotPlayersTurn);
            }
        }

        self.session.board.landing_row(column).inspect_err(|e| {
            warn!(error = %e, "Rejected illegal move");
        })?;
        if !self.session.legal_columns.contains(&column) {
            warn!(column, "Column not in the legal set");
            return Err(connect_four::IllegalMove::ColumnFull(column).into());
        }

        let ticket = self.issue(RequestKind::PlayerMove { column });
        self.session.phase = Phase::AwaitingResolution;
        info!(%ticket, "Player move submitted");
        Ok(ticket)
    }

    /// Records a request for the opponent's reply.
    #[instrument(skip(self))]
    pub fn begin_opponent_reply(&mut self) -> Result<Ticket, SessionError> {
        self.ensure_idle()?;
        match self.session.phase {
            Phase::AwaitingOpponentReply => {}
            Phase::Terminal => return Err(SessionError::GameOver),
            Phase::Uninitialized => return Err(SessionError::NotStarted),
            Phase::AwaitingPlayer | Phase::AwaitingResolution => {
                return Err(SessionError::InvalidLocalState(
                    "opponent reply requested while the player is to move".to_string(),
                ));
            }
        }

        let ticket = self.issue(RequestKind::OpponentReply);
        info!(%ticket, "Opponent reply requested");
        Ok(ticket)
    }

    /// Folds a verdict for `ticket`.
    ///
    /// A ticket other than the pending one yields [`Folded::Stale`] and
    /// leaves the session untouched. A verdict that does not follow from the
    /// current board is rejected and the request abandoned.
    #[instrument(skip(self, resolution), fields(outcome = ?resolution.outcome()))]
    pub fn fold(&mut self, ticket: Ticket, resolution: Resolution) -> Result<Folded, SessionError> {
        let Some(pending) = self.session.pending.filter(|p| p.ticket == ticket) else {
            warn!(%ticket, expected = ?self.session.pending.map(|p| p.ticket), "Dropping stale verdict");
            return Ok(Folded::Stale);
        };

        if let Err(reason) = self.check_continuity(pending.kind, &resolution) {
            warn!(error = %reason, "Verdict does not follow from the session");
            self.abandon(ticket);
            return Err(reason.into());
        }

        let phase = if resolution.outcome().is_terminal() {
            Phase::Terminal
        } else {
            match resolution.turn() {
                Owner::Player => Phase::AwaitingPlayer,
                Owner::Opponent => Phase::AwaitingOpponentReply,
            }
        };

        let next = Session {
            board: resolution.board().clone(),
            turn: (phase != Phase::Terminal).then_some(*resolution.turn()),
            outcome: *resolution.outcome(),
            winning_line: resolution.winning_line().clone(),
            legal_columns: if phase == Phase::Terminal {
                BTreeSet::new()
            } else {
                resolution.legal_columns().clone()
            },
            difficulty: self.session.difficulty,
            phase,
            pending: None,
            last_opponent_column: *resolution.opponent_column(),
            sequence: self.session.sequence,
        };
        self.session = next;

        info!(%ticket, %phase, outcome = ?self.session.outcome, "Verdict applied");
        Ok(Folded::Applied(phase))
    }

    /// Drops the pending request for `ticket`, restoring the phase that
    /// preceded it. Returns false when `ticket` is not the pending one.
    #[instrument(skip(self))]
    pub fn abandon(&mut self, ticket: Ticket) -> bool {
        let Some(pending) = self.session.pending.filter(|p| p.ticket == ticket) else {
            debug!("Nothing to abandon");
            return false;
        };

        self.session.pending = None;
        match pending.kind {
            RequestKind::NewSession => {
                self.session.phase = Phase::Uninitialized;
                self.session.difficulty = None;
            }
            RequestKind::PlayerMove { .. } => self.session.phase = Phase::AwaitingPlayer,
            RequestKind::OpponentReply => self.session.phase = Phase::AwaitingOpponentReply,
        }
        info!(phase = %self.session.phase, "Request abandoned");
        true
    }

    fn ensure_idle(&self) -> Result<(), SessionError> {
        if self.is_pending() {
            return Err(SessionError::Busy);
        }
        Ok(())
    }

    fn issue(&mut self, kind: RequestKind) -> Ticket {
        self.session.sequence += 1;
        let ticket = Ticket(self.session.sequence);
        self.session.pending = Some(Pending { ticket, kind });
        ticket
    }

    fn check_continuity(
        &self,
        kind: RequestKind,
        resolution: &Resolution,
    ) -> Result<(), MalformedResponse> {
        let next = resolution.board();
        if next.dimensions() != self.dimensions {
            return Err(MalformedResponse::Dimensions {
                expected: self.dimensions,
                found: next.dimensions(),
            });
        }

        let base = match kind {
            RequestKind::NewSession => Board::empty(self.dimensions),
            RequestKind::PlayerMove { column } => self
                .session
                .board
                .apply_drop(column, Owner::Player)
                .map_err(|e| MalformedResponse::Discontinuity(e.to_string()))?,
            RequestKind::OpponentReply => self.session.board.clone(),
        };

        let delta = next.pieces_added_since(&base).ok_or_else(|| {
            MalformedResponse::Discontinuity("existing pieces changed".to_string())
        })?;

        if delta.player > 0 {
            return Err(MalformedResponse::Discontinuity(format!(
                "{} unexpected player piece(s)",
                delta.player
            )));
        }
        if delta.opponent > 1 {
            return Err(MalformedResponse::Discontinuity(format!(
                "{} opponent pieces added in one reply",
                delta.opponent
            )));
        }
        Ok(())
    }
}

//! Session controller: sequences whole turns against the resolution service.
//!
//! The controller processes one command at a time. A command that arrives
//! while another is in flight fails with [`SessionError::Busy`]; only
//! [`SessionController::reset`] is always accepted, and it invalidates
//! whatever request is outstanding. The state lock is never held across an
//! await, so a reset can land while a request is on the wire.

use crate::config::{ClientConfig, RetryPolicy};
use crate::difficulty::Difficulty;
use crate::error::{ResolutionError, SessionError};
use crate::machine::{Folded, Phase, SessionMachine, Ticket};
use crate::resolution::{HttpResolutionClient, MoveResolver, Resolution};
use crate::view::ViewSnapshot;
use connect_four::Dimensions;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// Identifies the command currently holding the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CommandId(u64);

#[derive(Debug)]
struct Inner {
    machine: SessionMachine,
    active: Option<CommandId>,
    commands_issued: u64,
}

/// Drives one game session through a [`MoveResolver`].
pub struct SessionController<R> {
    resolver: R,
    retry: RetryPolicy,
    inner: Mutex<Inner>,
    updates: watch::Sender<ViewSnapshot>,
}

impl<R> std::fmt::Debug for SessionController<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("retry", &self.retry)
            .field("snapshot", &*self.updates.borrow())
            .finish_non_exhaustive()
    }
}

impl SessionController<HttpResolutionClient> {
    /// Builds a controller backed by the HTTP client described by `config`.
    #[instrument(skip(config), fields(base_url = %config.base_url()))]
    pub fn from_config(config: &ClientConfig) -> Result<Self, SessionError> {
        let resolver = HttpResolutionClient::new(config)?;
        Ok(Self::new(resolver, config.dimensions(), config.retry_policy()))
    }
}

impl<R: MoveResolver> SessionController<R> {
    /// Creates a controller with an uninitialized session.
    #[instrument(skip(resolver))]
    pub fn new(resolver: R, dimensions: Dimensions, retry: RetryPolicy) -> Self {
        let machine = SessionMachine::new(dimensions);
        let (updates, _) = watch::channel(ViewSnapshot::capture(&machine, false));
        info!("Session controller created");
        Self {
            resolver,
            retry,
            inner: Mutex::new(Inner {
                machine,
                active: None,
                commands_issued: 0,
            }),
            updates,
        }
    }

    /// The resolver this controller talks to.
    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Current presentation snapshot.
    pub fn snapshot(&self) -> ViewSnapshot {
        self.updates.borrow().clone()
    }

    /// Subscribes to snapshot updates; one is published after every transition.
    pub fn subscribe(&self) -> watch::Receiver<ViewSnapshot> {
        self.updates.subscribe()
    }

    /// Starts a new game, discarding one still in progress.
    ///
    /// A finished game only leaves through [`SessionController::reset`], so
    /// starting from [`Phase::Terminal`] fails with [`SessionError::GameOver`].
    /// When the verdict leaves the opponent to move, its opening reply is
    /// requested before returning.
    #[instrument(skip(self))]
    pub async fn start(&self, difficulty: Difficulty) -> Result<ViewSnapshot, SessionError> {
        self.run(|| async move {
            let ticket = self.transition(|machine| {
                if machine.phase() == Phase::Terminal {
                    warn!("Start refused on a finished game");
                    return Err(SessionError::GameOver);
                }
                machine.reset();
                machine.begin_start(difficulty)
            })?;

            let opponent_starts = difficulty.opponent_starts_first();
            let result = self
                .call(ticket, || self.resolver.new_session(difficulty, opponent_starts))
                .await;
            if self.settle(ticket, result)? == Some(Phase::AwaitingOpponentReply) {
                self.opponent_reply().await?;
            }
            Ok(())
        })
        .await
    }

    /// Plays the player's column and, if the game goes on, the opponent's reply.
    ///
    /// An illegal column fails with [`SessionError::IllegalMove`] without any
    /// request being sent.
    #[instrument(skip(self))]
    pub async fn play(&self, column: usize) -> Result<ViewSnapshot, SessionError> {
        self.run(|| async move {
            let (ticket, board, difficulty) = self.transition(|machine| {
                let ticket = machine.begin_player_move(column)?;
                Ok((ticket, machine.session().board().clone(), session_difficulty(machine)))
            })?;

            let result = self
                .call(ticket, || self.resolver.request_move(&board, column, difficulty))
                .await;
            if self.settle(ticket, result)? == Some(Phase::AwaitingOpponentReply) {
                self.opponent_reply().await?;
            }
            Ok(())
        })
        .await
    }

    /// Re-requests the opponent's reply after a failed attempt.
    ///
    /// Does nothing unless the opponent is to move.
    #[instrument(skip(self))]
    pub async fn resume(&self) -> Result<ViewSnapshot, SessionError> {
        self.run(|| async move {
            let phase = self.transition(|machine| Ok(machine.phase()))?;
            match phase {
                Phase::AwaitingOpponentReply => self.opponent_reply().await,
                Phase::Uninitialized => Err(SessionError::NotStarted),
                Phase::Terminal => Err(SessionError::GameOver),
                Phase::AwaitingPlayer | Phase::AwaitingResolution => {
                    debug!(%phase, "Nothing to resume");
                    Ok(())
                }
            }
        })
        .await
    }

    /// Replaces the session with a fresh uninitialized one.
    ///
    /// Always accepted. An outstanding request keeps running but its verdict
    /// will be dropped as stale.
    #[instrument(skip(self))]
    pub fn reset(&self) -> ViewSnapshot {
        let mut inner = self.lock();
        inner.machine.reset();
        inner.active = None;
        info!("Session reset by command");
        self.publish(&inner)
    }

    async fn opponent_reply(&self) -> Result<(), SessionError> {
        let (ticket, board, difficulty) = self.transition(|machine| {
            let ticket = machine.begin_opponent_reply()?;
            Ok((ticket, machine.session().board().clone(), session_difficulty(machine)))
        })?;

        let result = self
            .call(ticket, || self.resolver.request_opponent_reply(&board, difficulty))
            .await;
        if self.settle(ticket, result)? == Some(Phase::AwaitingOpponentReply) {
            warn!("Service left the opponent to move again");
        }
        Ok(())
    }

    /// Holds the session for one command, releasing it afterwards.
    async fn run<F, Fut>(&self, body: F) -> Result<ViewSnapshot, SessionError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), SessionError>>,
    {
        let command = self.claim()?;
        let result = body().await;
        self.release(command);
        result.map(|()| self.snapshot())
    }

    /// Issues a request, retrying transport failures per the retry policy.
    async fn call<F, Fut>(&self, ticket: Ticket, mut request: F) -> Result<Resolution, ResolutionError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Resolution, ResolutionError>>,
    {
        let mut attempt = 1;
        loop {
            match request().await {
                Err(ResolutionError::Unavailable(text))
                    if attempt < self.retry.max_attempts() && self.is_current(ticket) =>
                {
                    warn!(%ticket, attempt, error = %text, "Resolution unavailable, retrying");
                    tokio::time::sleep(self.retry.backoff()).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    /// Folds a verdict or records a failure for `ticket`.
    ///
    /// Returns the new phase, or `None` when the request had been superseded.
    fn settle(
        &self,
        ticket: Ticket,
        result: Result<Resolution, ResolutionError>,
    ) -> Result<Option<Phase>, SessionError> {
        let mut inner = self.lock();
        let settled = match result {
            Ok(resolution) => match inner.machine.fold(ticket, resolution) {
                Ok(Folded::Applied(phase)) => Ok(Some(phase)),
                Ok(Folded::Stale) => Ok(None),
                Err(e) => Err(e),
            },
            Err(e) if inner.machine.abandon(ticket) => {
                warn!(%ticket, error = %e, "Request failed");
                Err(e.into())
            }
            Err(e) => {
                debug!(%ticket, error = %e, "Ignoring failure of superseded request");
                Ok(None)
            }
        };
        self.publish(&inner);
        settled
    }

    fn transition<T>(
        &self,
        step: impl FnOnce(&mut SessionMachine) -> Result<T, SessionError>,
    ) -> Result<T, SessionError> {
        let mut inner = self.lock();
        let result = step(&mut inner.machine);
        self.publish(&inner);
        result
    }

    fn is_current(&self, ticket: Ticket) -> bool {
        self.lock()
            .machine
            .session()
            .pending()
            .is_some_and(|pending| pending.ticket == ticket)
    }

    fn claim(&self) -> Result<CommandId, SessionError> {
        let mut inner = self.lock();
        if inner.active.is_some() {
            warn!("Rejecting command while another is in flight");
            return Err(SessionError::Busy);
        }
        inner.commands_issued += 1;
        let command = CommandId(inner.commands_issued);
        inner.active = Some(command);
        self.publish(&inner);
        Ok(command)
    }

    fn release(&self, command: CommandId) {
        let mut inner = self.lock();
        // A reset may have handed the session to a newer command.
        if inner.active == Some(command) {
            inner.active = None;
            self.publish(&inner);
        }
    }

    fn publish(&self, inner: &Inner) -> ViewSnapshot {
        let snapshot = ViewSnapshot::capture(&inner.machine, inner.active.is_some());
        self.updates.send_replace(snapshot.clone());
        snapshot
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn session_difficulty(machine: &SessionMachine) -> Difficulty {
    machine.session().difficulty().unwrap_or_default()
}


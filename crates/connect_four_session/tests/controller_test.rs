//! Tests for the session controller against a scripted resolver.

mod common;

use common::{board_with, in_progress, with_reply, won};
use connect_four_session::wire::WireSnapshot;
use connect_four_session::{
    Board, Coord, Difficulty, Dimensions, IllegalMove, MoveResolver, Outcome, Owner, Phase,
    Resolution, ResolutionError, RetryPolicy, SessionController, SessionError,
};
use std::collections::{BTreeSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// A request the scripted resolver saw.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    NewSession { difficulty: Difficulty, opponent_starts_first: bool },
    Move { board: Board, column: usize, difficulty: Difficulty },
    OpponentReply { board: Board, difficulty: Difficulty },
}

/// Holds one call open until the test releases it.
#[derive(Default)]
struct Gate {
    at: usize,
    entered: Notify,
    release: Notify,
}

/// Replays canned responses in order and records every call.
#[derive(Default)]
struct ScriptedResolver {
    responses: Mutex<VecDeque<Result<WireSnapshot, ResolutionError>>>,
    calls: Mutex<Vec<Call>>,
    gate: Option<Gate>,
}

impl ScriptedResolver {
    fn new(responses: Vec<Result<WireSnapshot, ResolutionError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            ..Self::default()
        }
    }

    /// Blocks the call with index `at` (zero-based) until released.
    fn gated(mut self, at: usize) -> Self {
        self.gate = Some(Gate {
            at,
            ..Gate::default()
        });
        self
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn gate(&self) -> &Gate {
        self.gate.as_ref().expect("resolver is gated")
    }

    async fn respond(&self, call: Call) -> Result<Resolution, ResolutionError> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(call);
            calls.len() - 1
        };
        if let Some(gate) = self.gate.as_ref().filter(|g| g.at == index) {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        let next = self.responses.lock().unwrap().pop_front();
        let snapshot = next.unwrap_or_else(|| Err(ResolutionError::Unavailable("script exhausted".into())))?;
        Ok(Resolution::from_wire(snapshot, Dimensions::STANDARD)?)
    }
}

#[async_trait::async_trait]
impl MoveResolver for ScriptedResolver {
    async fn new_session(
        &self,
        difficulty: Difficulty,
        opponent_starts_first: bool,
    ) -> Result<Resolution, ResolutionError> {
        self.respond(Call::NewSession {
            difficulty,
            opponent_starts_first,
        })
        .await
    }

    async fn request_move(
        &self,
        board: &Board,
        column: usize,
        difficulty: Difficulty,
    ) -> Result<Resolution, ResolutionError> {
        self.respond(Call::Move {
            board: board.clone(),
            column,
            difficulty,
        })
        .await
    }

    async fn request_opponent_reply(
        &self,
        board: &Board,
        difficulty: Difficulty,
    ) -> Result<Resolution, ResolutionError> {
        self.respond(Call::OpponentReply {
            board: board.clone(),
            difficulty,
        })
        .await
    }
}

fn empty() -> Board {
    Board::empty(Dimensions::STANDARD)
}

fn controller(resolver: ScriptedResolver) -> SessionController<Arc<ScriptedResolver>> {
    SessionController::new(Arc::new(resolver), Dimensions::STANDARD, RetryPolicy::no_retry())
}

fn unavailable(text: &str) -> Result<WireSnapshot, ResolutionError> {
    Err(ResolutionError::Unavailable(text.to_string()))
}

#[tokio::test]
async fn test_start_awaits_player_with_all_columns_legal() {
    let controller = controller(ScriptedResolver::new(vec![Ok(in_progress(&empty(), Owner::Player))]));

    let snapshot = controller.start(Difficulty::Easy).await.unwrap();

    assert_eq!(snapshot.phase, Phase::AwaitingPlayer);
    assert_eq!(snapshot.legal_columns, (0..7).collect::<BTreeSet<_>>());
    assert_eq!(snapshot.difficulty, Some(Difficulty::Easy));
    assert!(snapshot.can_play());
    assert_eq!(
        controller.resolver().calls(),
        vec![Call::NewSession {
            difficulty: Difficulty::Easy,
            opponent_starts_first: false
        }]
    );
}

#[tokio::test]
async fn test_play_applies_service_board() {
    let after = board_with(&[3, 4], Owner::Player);
    let controller = controller(ScriptedResolver::new(vec![
        Ok(in_progress(&empty(), Owner::Player)),
        Ok(with_reply(&after, 4)),
    ]));
    controller.start(Difficulty::Medium).await.unwrap();

    let snapshot = controller.play(3).await.unwrap();

    assert_eq!(snapshot.phase, Phase::AwaitingPlayer);
    assert_eq!(snapshot.board, after);
    assert_eq!(snapshot.last_opponent_column, Some(4));
    assert_eq!(snapshot.status_line(), "Your move");
    assert_eq!(
        controller.resolver().calls()[1],
        Call::Move {
            board: empty(),
            column: 3,
            difficulty: Difficulty::Medium
        }
    );
}

#[tokio::test]
async fn test_full_column_sends_no_request() {
    let mut script = vec![Ok(in_progress(&empty(), Owner::Player))];
    let mut drops = Vec::new();
    for _ in 0..3 {
        drops.extend([2, 2]);
        script.push(Ok(with_reply(&board_with(&drops, Owner::Player), 2)));
    }
    let controller = controller(ScriptedResolver::new(script));
    controller.start(Difficulty::Medium).await.unwrap();
    for _ in 0..3 {
        controller.play(2).await.unwrap();
    }
    let before = controller.snapshot();
    let calls = controller.resolver().calls().len();

    let err = controller.play(2).await.unwrap_err();

    assert_eq!(err, SessionError::IllegalMove(IllegalMove::ColumnFull(2)));
    assert!(err.is_recoverable());
    assert_eq!(controller.resolver().calls().len(), calls);
    assert_eq!(controller.snapshot(), before);
}

#[tokio::test]
async fn test_player_win_is_terminal() {
    let winning = board_with(&[0, 0, 1, 1, 2, 2, 3], Owner::Player);
    let line = [(5, 0), (5, 1), (5, 2), (5, 3)];
    let controller = controller(ScriptedResolver::new(vec![
        Ok(in_progress(&empty(), Owner::Player)),
        Ok(with_reply(&board_with(&[0, 0], Owner::Player), 0)),
        Ok(with_reply(&board_with(&[0, 0, 1, 1], Owner::Player), 1)),
        Ok(with_reply(&board_with(&[0, 0, 1, 1, 2, 2], Owner::Player), 2)),
        Ok(won(&winning, Owner::Player, &line)),
    ]));
    controller.start(Difficulty::Medium).await.unwrap();
    for column in 0..3 {
        controller.play(column).await.unwrap();
    }

    let snapshot = controller.play(3).await.unwrap();

    assert_eq!(snapshot.phase, Phase::Terminal);
    assert_eq!(snapshot.outcome, Outcome::PlayerWon);
    assert_eq!(
        snapshot.winning_cells,
        line.iter().map(|&(r, c)| Coord::new(r, c)).collect::<Vec<_>>()
    );
    assert!(snapshot.is_winning_cell(Coord::new(5, 2)));
    assert!(!snapshot.column_enabled(4));
    assert_eq!(snapshot.status_line(), "You win!");
    assert_eq!(controller.play(4).await, Err(SessionError::GameOver));
}

#[tokio::test]
async fn test_unavailable_service_leaves_board_unchanged() {
    let after = board_with(&[3, 4], Owner::Player);
    let controller = controller(ScriptedResolver::new(vec![
        Ok(in_progress(&empty(), Owner::Player)),
        Ok(with_reply(&after, 4)),
        unavailable("internal error"),
    ]));
    controller.start(Difficulty::Medium).await.unwrap();
    controller.play(3).await.unwrap();
    let before = controller.snapshot();

    let err = controller.play(5).await.unwrap_err();

    assert_eq!(err, SessionError::ResolutionUnavailable("internal error".to_string()));
    assert!(err.is_recoverable());
    let snapshot = controller.snapshot();
    assert_eq!(snapshot, before);
    assert_eq!(snapshot.board, after);
    assert!(snapshot.can_play());
}

#[tokio::test]
async fn test_malformed_verdict_leaves_board_unchanged() {
    let mut bad = in_progress(&board_with(&[3, 4], Owner::Player), Owner::Player);
    bad.board[0][0] = 7;
    let controller = controller(ScriptedResolver::new(vec![
        Ok(in_progress(&empty(), Owner::Player)),
        Ok(bad),
    ]));
    controller.start(Difficulty::Medium).await.unwrap();

    let err = controller.play(3).await.unwrap_err();

    assert!(matches!(err, SessionError::MalformedResponse(_)));
    assert!(!err.is_recoverable());
    assert_eq!(controller.snapshot().board, empty());
    assert_eq!(controller.snapshot().phase, Phase::AwaitingPlayer);
}

#[tokio::test]
async fn test_hard_start_requests_opening_reply() {
    let opened = board_with(&[3], Owner::Opponent);
    let controller = controller(ScriptedResolver::new(vec![
        Ok(in_progress(&empty(), Owner::Opponent)),
        Ok(with_reply(&opened, 3)),
    ]));

    let snapshot = controller.start(Difficulty::Hard).await.unwrap();

    assert_eq!(snapshot.phase, Phase::AwaitingPlayer);
    assert_eq!(snapshot.board, opened);
    assert_eq!(
        controller.resolver().calls(),
        vec![
            Call::NewSession {
                difficulty: Difficulty::Hard,
                opponent_starts_first: true
            },
            Call::OpponentReply {
                board: empty(),
                difficulty: Difficulty::Hard
            },
        ]
    );
}

#[tokio::test]
async fn test_move_verdict_leaving_opponent_to_move_triggers_reply() {
    let after_move = board_with(&[3], Owner::Player);
    let after_reply = board_with(&[3, 3], Owner::Player);
    let controller = controller(ScriptedResolver::new(vec![
        Ok(in_progress(&empty(), Owner::Player)),
        Ok(in_progress(&after_move, Owner::Opponent)),
        Ok(with_reply(&after_reply, 3)),
    ]));
    controller.start(Difficulty::Medium).await.unwrap();

    let snapshot = controller.play(3).await.unwrap();

    assert_eq!(snapshot.phase, Phase::AwaitingPlayer);
    assert_eq!(snapshot.board, after_reply);
    assert_eq!(
        controller.resolver().calls()[2],
        Call::OpponentReply {
            board: after_move,
            difficulty: Difficulty::Medium
        }
    );
}

#[tokio::test]
async fn test_failed_reply_can_be_resumed() {
    let opened = board_with(&[6], Owner::Opponent);
    let controller = controller(ScriptedResolver::new(vec![
        Ok(in_progress(&empty(), Owner::Opponent)),
        unavailable("connection refused"),
        Ok(with_reply(&opened, 6)),
    ]));

    let err = controller.start(Difficulty::Hard).await.unwrap_err();
    assert_eq!(err, SessionError::ResolutionUnavailable("connection refused".to_string()));
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.phase, Phase::AwaitingOpponentReply);
    assert!(!snapshot.busy);
    assert_eq!(snapshot.status_line(), "Opponent is thinking…");

    let snapshot = controller.resume().await.unwrap();

    assert_eq!(snapshot.phase, Phase::AwaitingPlayer);
    assert_eq!(snapshot.board, opened);
}

#[tokio::test]
async fn test_resume_before_start_is_rejected() {
    let controller = controller(ScriptedResolver::default());
    assert_eq!(controller.resume().await, Err(SessionError::NotStarted));
}

#[tokio::test]
async fn test_retry_policy_retries_unavailable_only() {
    let resolver = ScriptedResolver::new(vec![
        unavailable("timed out"),
        unavailable("timed out"),
        Ok(in_progress(&empty(), Owner::Player)),
    ]);
    let controller = SessionController::new(
        Arc::new(resolver),
        Dimensions::STANDARD,
        RetryPolicy::new(3, Duration::from_millis(1)),
    );

    let snapshot = controller.start(Difficulty::Easy).await.unwrap();

    assert_eq!(snapshot.phase, Phase::AwaitingPlayer);
    assert_eq!(controller.resolver().calls().len(), 3);
}

#[tokio::test]
async fn test_retry_policy_gives_up_after_max_attempts() {
    let resolver = ScriptedResolver::new(vec![unavailable("down"), unavailable("still down")]);
    let controller = SessionController::new(
        Arc::new(resolver),
        Dimensions::STANDARD,
        RetryPolicy::new(2, Duration::from_millis(1)),
    );

    let err = controller.start(Difficulty::Easy).await.unwrap_err();

    assert_eq!(err, SessionError::ResolutionUnavailable("still down".to_string()));
    assert_eq!(controller.resolver().calls().len(), 2);
    assert_eq!(controller.snapshot().phase, Phase::Uninitialized);
}

#[tokio::test]
async fn test_malformed_response_is_not_retried() {
    let mut bad = in_progress(&empty(), Owner::Player);
    bad.turn = "nobody".to_string();
    let resolver = ScriptedResolver::new(vec![Ok(bad), Ok(in_progress(&empty(), Owner::Player))]);
    let controller = SessionController::new(
        Arc::new(resolver),
        Dimensions::STANDARD,
        RetryPolicy::new(3, Duration::from_millis(1)),
    );

    let err = controller.start(Difficulty::Easy).await.unwrap_err();

    assert!(matches!(err, SessionError::MalformedResponse(_)));
    assert_eq!(controller.resolver().calls().len(), 1);
}

#[tokio::test]
async fn test_commands_rejected_while_request_in_flight() {
    let after = board_with(&[3, 4], Owner::Player);
    let controller = controller(
        ScriptedResolver::new(vec![
            Ok(in_progress(&empty(), Owner::Player)),
            Ok(with_reply(&after, 4)),
        ])
        .gated(1),
    );
    controller.start(Difficulty::Medium).await.unwrap();
    let gate = controller.resolver().gate();

    let driver = async {
        gate.entered.notified().await;
        let snapshot = controller.snapshot();
        assert!(snapshot.busy);
        assert!(!snapshot.can_play());
        assert_eq!(snapshot.phase, Phase::AwaitingResolution);
        assert_eq!(snapshot.board, empty());

        assert_eq!(controller.play(4).await, Err(SessionError::Busy));
        assert_eq!(controller.start(Difficulty::Easy).await, Err(SessionError::Busy));
        gate.release.notify_one();
    };
    let (result, ()) = tokio::join!(controller.play(3), driver);

    assert_eq!(result.unwrap().board, after);
    assert_eq!(controller.resolver().calls().len(), 2);
    assert!(!controller.snapshot().busy);
}

#[tokio::test]
async fn test_reset_during_request_discards_late_verdict() {
    let after = board_with(&[3, 4], Owner::Player);
    let controller = controller(
        ScriptedResolver::new(vec![
            Ok(in_progress(&empty(), Owner::Player)),
            Ok(with_reply(&after, 4)),
            Ok(in_progress(&empty(), Owner::Player)),
        ])
        .gated(1),
    );
    controller.start(Difficulty::Medium).await.unwrap();
    let gate = controller.resolver().gate();

    let driver = async {
        gate.entered.notified().await;
        let snapshot = controller.reset();
        assert_eq!(snapshot.phase, Phase::Uninitialized);
        assert!(!snapshot.busy);
        gate.release.notify_one();
    };
    let (result, ()) = tokio::join!(controller.play(3), driver);

    let snapshot = result.unwrap();
    assert_eq!(snapshot.phase, Phase::Uninitialized);
    assert_eq!(snapshot.board, empty());
    assert_eq!(controller.snapshot().board, empty());

    let snapshot = controller.start(Difficulty::Easy).await.unwrap();
    assert_eq!(snapshot.phase, Phase::AwaitingPlayer);
    assert_eq!(snapshot.difficulty, Some(Difficulty::Easy));
}

#[tokio::test]
async fn test_reset_is_idempotent() {
    let controller = controller(ScriptedResolver::new(vec![Ok(in_progress(&empty(), Owner::Player))]));
    controller.start(Difficulty::Medium).await.unwrap();

    let once = controller.reset();
    let twice = controller.reset();

    assert_eq!(once, twice);
    assert_eq!(once.phase, Phase::Uninitialized);
    assert_eq!(once.status_line(), "Press start");
}

#[tokio::test]
async fn test_start_replaces_running_game() {
    let after = board_with(&[3, 4], Owner::Player);
    let controller = controller(ScriptedResolver::new(vec![
        Ok(in_progress(&empty(), Owner::Player)),
        Ok(with_reply(&after, 4)),
        Ok(in_progress(&empty(), Owner::Player)),
    ]));
    controller.start(Difficulty::Medium).await.unwrap();
    controller.play(3).await.unwrap();

    let snapshot = controller.start(Difficulty::Easy).await.unwrap();

    assert_eq!(snapshot.board, empty());
    assert_eq!(snapshot.difficulty, Some(Difficulty::Easy));
}

#[tokio::test]
async fn test_subscribers_see_each_transition() {
    let controller = controller(ScriptedResolver::new(vec![Ok(in_progress(&empty(), Owner::Player))]));
    let mut updates = controller.subscribe();
    assert_eq!(updates.borrow_and_update().phase, Phase::Uninitialized);

    controller.start(Difficulty::Medium).await.unwrap();

    assert!(updates.has_changed().unwrap());
    let latest = updates.borrow_and_update().clone();
    assert_eq!(latest.phase, Phase::AwaitingPlayer);
    assert!(!latest.busy);
    assert_eq!(latest, controller.snapshot());
}

#[tokio::test]
async fn test_start_on_finished_game_requires_reset() {
    let winning = board_with(&[0, 0, 1, 1, 2, 2, 3], Owner::Player);
    let line = [(5, 0), (5, 1), (5, 2), (5, 3)];
    let controller = controller(ScriptedResolver::new(vec![
        Ok(in_progress(&empty(), Owner::Player)),
        Ok(with_reply(&board_with(&[0, 0], Owner::Player), 0)),
        Ok(with_reply(&board_with(&[0, 0, 1, 1], Owner::Player), 1)),
        Ok(with_reply(&board_with(&[0, 0, 1, 1, 2, 2], Owner::Player), 2)),
        Ok(won(&winning, Owner::Player, &line)),
        Ok(in_progress(&empty(), Owner::Player)),
    ]));
    controller.start(Difficulty::Medium).await.unwrap();
    for column in 0..4 {
        controller.play(column).await.unwrap();
    }
    let finished = controller.snapshot();
    assert_eq!(finished.phase, Phase::Terminal);
    let calls = controller.resolver().calls().len();

    assert_eq!(controller.start(Difficulty::Easy).await, Err(SessionError::GameOver));
    assert_eq!(controller.snapshot(), finished);
    assert_eq!(controller.resolver().calls().len(), calls);

    controller.reset();
    let snapshot = controller.start(Difficulty::Easy).await.unwrap();
    assert_eq!(snapshot.phase, Phase::AwaitingPlayer);
    assert_eq!(snapshot.difficulty, Some(Difficulty::Easy));
}

#[tokio::test]
async fn test_failed_reply_after_move_blocks_play_until_resumed() {
    let after_move = board_with(&[3], Owner::Player);
    let after_reply = board_with(&[3, 2], Owner::Player);
    let controller = controller(ScriptedResolver::new(vec![
        Ok(in_progress(&empty(), Owner::Player)),
        Ok(in_progress(&after_move, Owner::Opponent)),
        unavailable("connection reset"),
        Ok(with_reply(&after_reply, 2)),
    ]));
    controller.start(Difficulty::Medium).await.unwrap();

    let err = controller.play(3).await.unwrap_err();
    assert_eq!(err, SessionError::ResolutionUnavailable("connection reset".to_string()));
    let stuck = controller.snapshot();
    assert_eq!(stuck.phase, Phase::AwaitingOpponentReply);
    assert_eq!(stuck.board, after_move);
    assert!(stuck.awaiting_resume());

    assert_eq!(controller.play(4).await, Err(SessionError::NotPlayersTurn));

    let snapshot = controller.resume().await.unwrap();
    assert_eq!(snapshot.phase, Phase::AwaitingPlayer);
    assert_eq!(snapshot.board, after_reply);
    assert!(!snapshot.awaiting_resume());
}

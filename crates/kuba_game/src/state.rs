//! The game state machine.
//!
//! [`GameState`] is a cloneable handle to one game. A single mutex guards
//! history, clocks, ko, status, and timers; every command and every timer
//! wake-up takes it before touching anything. Whichever of a move, a
//! timeout, or a resignation takes the lock first settles the turn, and the
//! others find a terminal status or a stale timer and back off.
//!
//! Hooks are never called with the lock held.

use crate::clock::AgentClock;
use crate::config::GameConfig;
use crate::error::{ConfigError, GameError};
use crate::hooks::GameHooks;
use crate::status::Status;
use crate::timer::TurnTimer;
use crate::view::{ClockView, GameView, millis, wall_clock};
use derive_getters::Getters;
use kuba_rules::{Board, Color, Marble, Move, MoveError, MoveWithCount, rules};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::Instant;
use tracing::{debug, info, instrument, trace, warn};

/// Occurrences of one position that end the game in a draw.
const REPETITION_LIMIT: u32 = 3;

/// One position in the game's history.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Board after `last_move`.
    board: Board,
    /// The move that produced this position. `None` for the opening.
    last_move: Option<MoveWithCount>,
    /// Color on move in this position.
    whose_turn: Color,
}

impl Snapshot {
    /// Repetition key: the board plus the side to move.
    fn position_key(&self) -> String {
        format!("{};{}", self.board, self.whose_turn)
    }
}

#[derive(Debug)]
struct Inner {
    history: Vec<Snapshot>,
    clocks: [AgentClock; 2],
    ko: Option<Move>,
    win_threshold: u32,
    time_control: Duration,
    status: Status,
    position_counts: HashMap<String, u32>,
    valid_moves: Vec<MoveWithCount>,
    first_move_deadline: Option<Instant>,
    first_move_timer: Option<TurnTimer>,
}

impl Inner {
    fn current(&self) -> &Snapshot {
        // History always holds at least the opening position.
        &self.history[self.history.len() - 1]
    }

    fn whose_turn(&self) -> Color {
        self.current().whose_turn
    }

    fn clock(&mut self, color: Color) -> &mut AgentClock {
        &mut self.clocks[color.index()]
    }

    fn validate(&self, mv: Move) -> Result<MoveWithCount, MoveError> {
        if self.status.is_terminal() {
            return Err(MoveError::GameOver);
        }
        rules::validate(
            &self.current().board,
            self.whose_turn(),
            self.ko.as_ref(),
            mv,
        )
    }

    /// Settles the status after a position change. Returns true if the game
    /// just ended.
    fn resolve_status(&mut self) -> bool {
        if self.status.is_terminal() {
            return false;
        }

        let to_move = self.whose_turn();
        let status = if let Some(color) = Color::ALL
            .into_iter()
            .find(|color| self.clocks[color.index()].score() >= self.win_threshold)
        {
            Status::win_for(color)
        } else {
            self.valid_moves =
                rules::legal_moves(&self.current().board, to_move, self.ko.as_ref());
            let repeats = self
                .position_counts
                .get(&self.current().position_key())
                .copied()
                .unwrap_or(0);
            if self.valid_moves.is_empty() {
                Status::win_for(to_move.opponent())
            } else if repeats >= REPETITION_LIMIT {
                Status::Draw
            } else {
                Status::Ongoing
            }
        };

        if status.is_terminal() {
            self.finish(status);
            return true;
        }
        false
    }

    /// Moves the game into a terminal status and tears it down.
    fn finish(&mut self, status: Status) {
        debug_assert!(status.is_terminal());
        self.status = status;
        self.valid_moves.clear();
        self.teardown();
        info!(%status, moves = self.history.len() - 1, "Game over");
    }

    /// Cancels every outstanding timer. Safe to call repeatedly.
    fn teardown(&mut self) {
        if let Some(timer) = self.first_move_timer.take() {
            assert!(timer.cancel(), "first move timer expired during teardown");
        }
        self.first_move_deadline = None;
        for clock in &mut self.clocks {
            clock.halt();
        }
    }

    fn view(&self) -> GameView {
        let clocks = Color::ALL
            .into_iter()
            .map(|color| {
                let clock = &self.clocks[color.index()];
                let view = ClockView::new(
                    clock.score(),
                    millis(clock.remaining()),
                    clock.deadline().map(wall_clock),
                );
                (color, view)
            })
            .collect::<BTreeMap<_, _>>();

        GameView {
            history: self.history.clone(),
            board: self.current().board.clone(),
            status: self.status,
            whose_turn: self.whose_turn(),
            win_threshold: self.win_threshold,
            clocks,
            valid_moves: self.valid_moves.clone(),
            ko: self.ko,
            first_move_deadline: self.first_move_deadline.map(wall_clock),
            time_control_ms: millis(self.time_control),
        }
    }
}

/// Handle to one game. Clones share the same game.
///
/// Timers run on the runtime the game was created in, so commands may be
/// issued from any thread.
#[derive(Debug, Clone)]
pub struct GameState {
    inner: Arc<Mutex<Inner>>,
    hooks: GameHooks,
    runtime: Handle,
}

impl GameState {
    /// Starts a game from the standard opening with White to move.
    ///
    /// The first-move deadline starts immediately.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn new(config: &GameConfig, hooks: GameHooks) -> Result<Self, ConfigError> {
        Self::from_position(Board::standard(), Color::White, config, hooks)
    }

    /// Starts a game from an arbitrary position.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn from_position(
        board: Board,
        to_move: Color,
        config: &GameConfig,
        hooks: GameHooks,
    ) -> Result<Self, ConfigError> {
        Self::start(Handle::current(), board, to_move, config, hooks)
    }

    /// Starts a fresh game from the standard opening on this game's runtime
    /// with the same hooks.
    pub(crate) fn rematch(&self, config: &GameConfig) -> Result<Self, ConfigError> {
        Self::start(
            self.runtime.clone(),
            Board::standard(),
            Color::White,
            config,
            self.hooks.clone(),
        )
    }

    #[instrument(skip(runtime, board, config, hooks), fields(size = board.size()))]
    fn start(
        runtime: Handle,
        board: Board,
        to_move: Color,
        config: &GameConfig,
        hooks: GameHooks,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let opening = Snapshot {
            board,
            last_move: None,
            whose_turn: to_move,
        };
        let valid_moves = rules::legal_moves(&opening.board, to_move, None);
        let first_move_timeout = *config.first_move_timeout();

        let state = Self {
            inner: Arc::new(Mutex::new(Inner {
                history: vec![opening],
                clocks: [
                    AgentClock::new(*config.time_control()),
                    AgentClock::new(*config.time_control()),
                ],
                ko: None,
                win_threshold: *config.win_threshold(),
                time_control: *config.time_control(),
                status: Status::Ongoing,
                position_counts: HashMap::new(),
                valid_moves,
                first_move_deadline: Some(Instant::now() + first_move_timeout),
                first_move_timer: None,
            })),
            hooks,
            runtime,
        };

        let weak = Arc::downgrade(&state.inner);
        let hooks = state.hooks.clone();
        let runtime = state.runtime.clone();
        {
            // Held while arming so an early wake-up still finds the timer.
            let mut inner = state.lock();
            let timer = TurnTimer::arm(&state.runtime, first_move_timeout, move || {
                if let Some(inner) = weak.upgrade() {
                    GameState {
                        inner,
                        hooks,
                        runtime,
                    }
                    .first_move_timed_out();
                }
            });
            inner.first_move_timer = Some(timer);
        }

        info!(
            %to_move,
            time_control = ?config.time_control(),
            ?first_move_timeout,
            "Game created"
        );
        Ok(state)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current status.
    pub fn status(&self) -> Status {
        self.lock().status
    }

    /// Color on move.
    pub fn whose_turn(&self) -> Color {
        self.lock().whose_turn()
    }

    /// Current position.
    pub fn current(&self) -> Snapshot {
        self.lock().current().clone()
    }

    /// Number of positions so far, including the opening.
    pub fn history_len(&self) -> usize {
        self.lock().history.len()
    }

    /// Score of one color.
    pub fn score(&self, color: Color) -> u32 {
        self.lock().clocks[color.index()].score()
    }

    /// Time one color has left, counting down while its turn runs.
    pub fn time_left(&self, color: Color) -> Duration {
        self.lock().clocks[color.index()].time_left()
    }

    /// Returns true while the color's turn clock is running.
    pub fn clock_running(&self, color: Color) -> bool {
        self.lock().clocks[color.index()].is_running()
    }

    /// Move forbidden by ko on this turn.
    pub fn ko(&self) -> Option<Move> {
        self.lock().ko
    }

    /// Legal moves for the color on move.
    pub fn valid_moves(&self) -> Vec<MoveWithCount> {
        self.lock().valid_moves.clone()
    }

    /// Copy of the whole game for rendering.
    pub fn view(&self) -> GameView {
        self.lock().view()
    }

    /// Checks a move against the current position without playing it.
    #[instrument(skip(self), fields(x = mv.x, y = mv.y, direction = %mv.direction))]
    pub fn validate_move(&self, mv: Move) -> Result<MoveWithCount, MoveError> {
        self.lock().validate(mv)
    }

    /// Plays a move for whichever color is on move.
    ///
    /// On failure nothing changes. If the move ends the game, the game-over
    /// hook runs before this returns.
    #[instrument(skip(self), fields(x = mv.x, y = mv.y, direction = %mv.direction))]
    pub fn execute_move(&self, mv: Move) -> Result<MoveWithCount, MoveError> {
        let mut inner = self.lock();
        let (counted, game_over) = self.apply(&mut inner, mv)?;
        drop(inner);

        if game_over {
            self.hooks.game_over();
        }
        Ok(counted)
    }

    /// Plays a move on behalf of `color`, refusing if another color is on
    /// move. The turn check and the move happen under one lock.
    pub(crate) fn execute_move_for(
        &self,
        color: Color,
        mv: Move,
    ) -> Result<MoveWithCount, GameError> {
        let mut inner = self.lock();
        let waiting_for = inner.whose_turn();
        if color != waiting_for {
            warn!(%color, %waiting_for, "Player tried to move out of turn");
            return Err(GameError::NotYourTurn { waiting_for });
        }
        let (counted, game_over) = self.apply(&mut inner, mv)?;
        drop(inner);

        if game_over {
            self.hooks.game_over();
        }
        Ok(counted)
    }

    fn apply(&self, inner: &mut Inner, mv: Move) -> Result<(MoveWithCount, bool), MoveError> {
        inner.validate(mv).inspect_err(|e| {
            warn!(error = %e, "Move rejected");
        })?;

        let mover = inner.whose_turn();
        let outcome = rules::push(&inner.current().board, mover, mv);
        let counted = MoveWithCount::new(mv, outcome.marbles_moved);

        if outcome.pushed_off == Some(Marble::Red) {
            inner.clock(mover).add_point();
            debug!(%mover, score = inner.clocks[mover.index()].score(), "Red marble pushed off");
        }
        inner.ko = outcome.ko;

        if let Some(timer) = inner.first_move_timer.take() {
            assert!(
                timer.cancel(),
                "first move timer expired before the first move"
            );
            inner.first_move_deadline = None;
        }

        inner.clock(mover).end_turn();

        let next = Snapshot {
            board: outcome.board,
            last_move: Some(counted),
            whose_turn: mover.opponent(),
        };
        *inner.position_counts.entry(next.position_key()).or_insert(0) += 1;
        inner.history.push(next);

        let game_over = inner.resolve_status();
        if !game_over {
            self.start_clock(inner);
        }

        info!(%mover, marbles_moved = counted.marbles_moved, status = %inner.status, "Move played");
        Ok((counted, game_over))
    }

    /// Starts the turn clock of the color now on move.
    fn start_clock(&self, inner: &mut Inner) {
        let color = inner.whose_turn();
        let turn = inner.history.len();
        let weak = Arc::downgrade(&self.inner);
        let hooks = self.hooks.clone();
        let runtime = self.runtime.clone();
        inner.clock(color).start_turn(&self.runtime, move || {
            if let Some(inner) = weak.upgrade() {
                GameState {
                    inner,
                    hooks,
                    runtime,
                }
                .player_timed_out(color, turn);
            }
        });
    }

    fn player_timed_out(&self, color: Color, turn: usize) {
        let mut inner = self.lock();
        if inner.status.is_terminal() || inner.history.len() != turn || !inner.clock(color).expire()
        {
            trace!(%color, turn, "Stale turn timer");
            return;
        }
        info!(%color, "Player ran out of time");
        inner.finish(Status::win_for(color.opponent()));
        drop(inner);

        self.hooks.async_update();
        self.hooks.game_over();
    }

    fn first_move_timed_out(&self) {
        let mut inner = self.lock();
        let claimed = inner
            .first_move_timer
            .as_ref()
            .is_some_and(TurnTimer::expire);
        if inner.status.is_terminal() || inner.history.len() != 1 || !claimed {
            trace!("Stale first move timer");
            return;
        }
        inner.first_move_timer = None;
        info!("No first move before the deadline");
        inner.finish(Status::Aborted);
        drop(inner);

        self.hooks.async_update();
        self.hooks.game_over();
    }

    /// Concedes the game for `color`. Returns false if the game was already
    /// over.
    #[instrument(skip(self))]
    pub fn resign(&self, color: Color) -> bool {
        let mut inner = self.lock();
        if inner.status.is_terminal() {
            debug!("Resignation ignored, game already over");
            return false;
        }
        info!(%color, "Player resigned");
        inner.finish(Status::win_for(color.opponent()));
        drop(inner);

        self.hooks.game_over();
        true
    }

    /// Cancels all timers without changing the status. Used when a game is
    /// being discarded while still in progress.
    #[instrument(skip(self))]
    pub fn teardown(&self) {
        self.lock().teardown();
        debug!("Game torn down");
    }
}

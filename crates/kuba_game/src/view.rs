//! Read-only projections of a game.
//!
//! Views are copies taken under the game's lock. They are the only form in
//! which game state leaves the engine, and the only thing serialized across
//! its boundary.

use crate::state::Snapshot;
use crate::status::Status;
use chrono::{DateTime, TimeDelta, Utc};
use derive_getters::Getters;
use kuba_rules::{Board, Color, Move, MoveWithCount};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::Instant;

/// One color's clock and score.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize, derive_new::new)]
#[serde(rename_all = "camelCase")]
pub struct ClockView {
    /// Red marbles pushed off.
    score: u32,
    /// Banked time as of the color's last turn end, in milliseconds.
    remaining_ms: u64,
    /// When the running turn's time runs out.
    deadline: Option<DateTime<Utc>>,
}

/// Everything a transport layer needs to render one game.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    /// Every position so far, starting with the opening.
    pub(crate) history: Vec<Snapshot>,
    /// Current board.
    pub(crate) board: Board,
    /// Game status.
    pub(crate) status: Status,
    /// Color on move.
    pub(crate) whose_turn: Color,
    /// Score needed to win.
    pub(crate) win_threshold: u32,
    /// Per-color clocks.
    pub(crate) clocks: BTreeMap<Color, ClockView>,
    /// Legal moves for the color on move. Empty once the game is over.
    pub(crate) valid_moves: Vec<MoveWithCount>,
    /// Move forbidden by ko on this turn.
    pub(crate) ko: Option<Move>,
    /// Deadline for the first move, while no move has been made.
    pub(crate) first_move_deadline: Option<DateTime<Utc>>,
    /// Configured time control in milliseconds.
    pub(crate) time_control_ms: u64,
}

impl GameView {
    /// Clock of one color.
    pub fn clock(&self, color: Color) -> Option<&ClockView> {
        self.clocks.get(&color)
    }
}

/// A player as seen by clients: identity, color, and clock.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    /// Opaque identity.
    pub(crate) id: String,
    /// Assigned color.
    pub(crate) color: Color,
    /// Red marbles pushed off.
    pub(crate) score: u32,
    /// Banked time in milliseconds.
    pub(crate) remaining_ms: u64,
    /// When the running turn's time runs out.
    pub(crate) deadline: Option<DateTime<Utc>>,
    /// Whether this player has offered a rematch.
    pub(crate) wants_rematch: bool,
}

/// A game view plus the players bound to it, indexed both by color and by
/// identity.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientView {
    /// The game itself.
    #[serde(flatten)]
    pub(crate) game: GameView,
    /// Players by color.
    pub(crate) color_to_player: BTreeMap<Color, PlayerView>,
    /// Players by identity.
    pub(crate) id_to_player: BTreeMap<String, PlayerView>,
}

pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Maps a monotonic deadline onto the wall clock for display.
pub(crate) fn wall_clock(deadline: Instant) -> DateTime<Utc> {
    let now = Instant::now();
    let utc = Utc::now();
    let delta = |d: Duration| TimeDelta::from_std(d).unwrap_or(TimeDelta::MAX);
    let shifted = if deadline >= now {
        utc.checked_add_signed(delta(deadline - now))
    } else {
        utc.checked_sub_signed(delta(now - deadline))
    };
    shifted.unwrap_or(utc)
}

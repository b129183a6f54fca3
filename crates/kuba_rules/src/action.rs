//! First-class move types.
//!
//! A move names the marble being pushed and the direction it is pushed in.
//! Moves are values: they can be validated without being applied, compared
//! against the ko move, and stored in history.

use crate::direction::Direction;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A push: the marble at `(x, y)` moves one cell in `direction`, shoving
/// every marble in front of it along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_new::new)]
pub struct Move {
    /// Column of the pushed marble.
    pub x: i32,
    /// Row of the pushed marble.
    pub y: i32,
    /// Push direction.
    #[serde(rename = "d")]
    pub direction: Direction,
}

impl Move {
    /// Cell the pushed marble moves into.
    pub fn target(&self) -> (i32, i32) {
        let (dx, dy) = self.direction.delta();
        (self.x + dx, self.y + dy)
    }

    /// Cell directly behind the pushed marble.
    pub fn behind(&self) -> (i32, i32) {
        let (dx, dy) = self.direction.delta();
        (self.x - dx, self.y - dy)
    }

    /// The same cell pushed the opposite way.
    pub fn reversed(&self) -> Self {
        Self::new(self.x, self.y, self.direction.reverse())
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}) {}", self.x, self.y, self.direction)
    }
}

/// Parses `"x y DIRECTION"`, e.g. `"0 6 up"`.
impl FromStr for Move {
    type Err = MoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        let [x, y, direction] = parts.as_slice() else {
            return Err(MoveError::Malformed(s.to_string()));
        };
        let x = x
            .parse()
            .map_err(|_| MoveError::Malformed(s.to_string()))?;
        let y = y
            .parse()
            .map_err(|_| MoveError::Malformed(s.to_string()))?;
        let direction = direction
            .parse()
            .map_err(|_| MoveError::InvalidDirection(direction.to_string()))?;
        Ok(Self::new(x, y, direction))
    }
}

/// A legal move annotated with how many marbles it displaces, counting the
/// pushed marble itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_new::new)]
#[serde(rename_all = "camelCase")]
pub struct MoveWithCount {
    /// The move.
    #[serde(flatten)]
    pub mv: Move,
    /// Marbles displaced, including the pusher.
    pub marbles_moved: usize,
}

impl From<MoveWithCount> for Move {
    fn from(counted: MoveWithCount) -> Self {
        counted.mv
    }
}

/// Why a move was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum MoveError {
    /// The game is no longer ongoing.
    #[display("Game already ended")]
    GameOver,

    /// The direction is not one of the four compass points.
    #[display("Direction {:?} is invalid", _0)]
    InvalidDirection(#[error(not(source))] String),

    /// The marble or the cell it would move into is off the board.
    #[display("Index out of bounds")]
    OutOfBounds,

    /// The marble at the cell does not belong to the side to move.
    #[display("Is not an in-turn marble")]
    NotInTurn,

    /// The move would immediately undo the opponent's last push.
    #[display("Prevented by ko")]
    Ko,

    /// A marble sits directly behind the pushed marble.
    #[display("Blocked by adjacent marble")]
    Blocked,

    /// The push would shove the mover's own marble off the board.
    #[display("Can't push own marble off")]
    OwnMarbleOff,

    /// Text that does not describe a move.
    #[display("Malformed move {:?}, expected \"x y DIRECTION\"", _0)]
    Malformed(#[error(not(source))] String),
}

//! Error types for the game engine.

use derive_more::{Display, Error, From};
use kuba_rules::{Color, MoveError};
use tracing::instrument;

/// Configuration error with location tracking.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// Why a game command was refused.
///
/// Authorization failures are checked before the rules are consulted, so a
/// caller that is not on move never learns whether its move would have been
/// legal.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error, From)]
pub enum GameError {
    /// The identity is not one of the two players.
    #[display("Unknown player {:?}", _0)]
    UnknownPlayer(#[error(not(source))] String),

    /// The identity plays the color that is not on move.
    #[display("Not your turn, waiting for {}", waiting_for)]
    NotYourTurn {
        /// Color on move.
        waiting_for: Color,
    },

    /// The rules rejected the move.
    #[display("Illegal move: {}", _0)]
    #[from]
    IllegalMove(MoveError),

    /// A rematch can only be offered once the game has ended.
    #[display("Game is still in progress")]
    GameNotOver,

    /// The identity already has a rematch offer pending.
    #[display("Rematch already offered")]
    RematchAlreadyOffered,

    /// The two identities were empty or equal.
    #[display("Invalid players: {}", _0)]
    InvalidPlayers(#[error(not(source))] String),

    /// The game configuration was rejected.
    #[display("{}", _0)]
    #[from]
    Config(ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_records_location() {
        let err = ConfigError::new("bad time control");
        assert_eq!(err.file, file!());
        assert!(err.to_string().starts_with("Config error: bad time control at "));
    }

    #[test]
    fn test_move_error_converts() {
        let err: GameError = MoveError::Ko.into();
        assert_eq!(err, GameError::IllegalMove(MoveError::Ko));
        assert_eq!(err.to_string(), "Illegal move: Prevented by ko");
    }
}

//! Kuba game engine - the authoritative rules-and-turn core for one game.
//!
//! This crate wraps the pure rules from `kuba_rules` in a stateful, thread-safe
//! game object with chess-clock style turn timers, and adds the identity layer
//! that binds opaque player ids to colors.
//!
//! # Architecture
//!
//! - **Clock**: per-color banked time with a one-shot turn timer
//! - **State**: move execution, scoring, ko, repetition, status resolution
//! - **Manager**: player identity, turn ownership, resignation, rematch
//! - **Views**: read-only copies of the game for transport layers
//!
//! Timer expiry is reported through [`GameHooks`] rather than return values,
//! since no caller is waiting when a clock runs out.
//!
//! # Example
//!
//! ```no_run
//! use kuba_game::{GameConfig, GameHooks, GameManager};
//! use kuba_rules::{Direction, Move};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), kuba_game::GameError> {
//! let config = GameConfig::new(Duration::from_secs(300));
//! let hooks = GameHooks::new().on_game_over(|| println!("game over"));
//! let manager = GameManager::new(&config, "alice", "bob", hooks)?;
//!
//! manager.try_move(Move::new(0, 0, Direction::Down), "alice")?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod clock;
mod config;
mod error;
mod hooks;
mod manager;
mod state;
mod status;
mod timer;
mod view;

// Crate-level exports - Configuration
pub use config::{DEFAULT_FIRST_MOVE_TIMEOUT, DEFAULT_WIN_THRESHOLD, GameConfig, MAX_TIME_CONTROL};

// Crate-level exports - Errors
pub use error::{ConfigError, GameError};

// Crate-level exports - Clock
pub use clock::AgentClock;

// Crate-level exports - Game state machine
pub use hooks::{GameHooks, Hook};
pub use state::{GameState, Snapshot};
pub use status::Status;

// Crate-level exports - Identity layer
pub use manager::{GameManager, Player, PlayerId};

// Crate-level exports - Views
pub use view::{ClientView, ClockView, GameView, PlayerView};

// Rules types used throughout the public API
pub use kuba_rules::{Board, Color, Direction, Marble, Move, MoveError, MoveWithCount};

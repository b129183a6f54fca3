//! Pure rules for Kuba, the two-player marble-pushing game.
//!
//! This crate knows nothing about clocks, players, or locking. It answers
//! two questions about a position: is this push legal, and what does the
//! board look like after it.
//!
//! # Architecture
//!
//! - **Marbles**: cell values and the two player colors
//! - **Board**: square grid of marbles, including the standard opening
//! - **Moves**: a marble coordinate plus one of four compass directions
//! - **Rules**: validation, push execution, and legal-move enumeration
//!
//! # Example
//!
//! ```
//! use kuba_rules::{rules, Board, Color, Direction, Move};
//!
//! let board = Board::standard();
//! let push = Move::new(0, 0, Direction::Right);
//! let checked = rules::validate(&board, Color::White, None, push).unwrap();
//! assert_eq!(checked.marbles_moved, 2);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod action;
mod board;
mod direction;
mod marble;

// Public rules module (free functions)
pub mod rules;

// Crate-level exports - Board model
pub use board::{Board, BoardError};
pub use marble::{Color, Marble};

// Crate-level exports - Move model
pub use action::{Move, MoveError, MoveWithCount};
pub use direction::Direction;

// Crate-level exports - Rules results
pub use rules::PushOutcome;

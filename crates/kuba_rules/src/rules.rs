//! Push rules: validation, execution, and legal-move enumeration.
//!
//! All functions are pure. They read a board and return either a verdict or
//! a new board; the input board is never mutated.

use crate::action::{Move, MoveError, MoveWithCount};
use crate::board::Board;
use crate::direction::Direction;
use crate::marble::{Color, Marble};
use tracing::instrument;

/// Checks whether `to_move` may play `mv` on `board`.
///
/// Checks run in a fixed order and the first failure is reported:
/// bounds, marble ownership, ko, rear blocker, own marble pushed off.
/// On success the move is returned with the number of marbles it displaces.
#[instrument(level = "trace", skip(board, ko))]
pub fn validate(
    board: &Board,
    to_move: Color,
    ko: Option<&Move>,
    mv: Move,
) -> Result<MoveWithCount, MoveError> {
    let (tx, ty) = mv.target();
    if !board.in_bounds(mv.x, mv.y) || !board.in_bounds(tx, ty) {
        return Err(MoveError::OutOfBounds);
    }

    if board.get(mv.x, mv.y) != Some(to_move.marble()) {
        return Err(MoveError::NotInTurn);
    }

    if ko == Some(&mv) {
        return Err(MoveError::Ko);
    }

    let (bx, by) = mv.behind();
    if let Some(behind) = board.get(bx, by)
        && !behind.is_empty()
    {
        return Err(MoveError::Blocked);
    }

    let (dx, dy) = mv.direction.delta();
    let (mut x, mut y) = (mv.x, mv.y);
    let mut marbles_moved = 0;
    while let Some(marble) = board.get(x, y) {
        if marble.is_empty() {
            return Ok(MoveWithCount::new(mv, marbles_moved));
        }
        marbles_moved += 1;
        x += dx;
        y += dy;
    }

    // No gap before the edge: the last marble in line goes over.
    if board.get(x - dx, y - dy) == Some(to_move.marble()) {
        return Err(MoveError::OwnMarbleOff);
    }
    Ok(MoveWithCount::new(mv, marbles_moved))
}

/// Result of applying a validated push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushOutcome {
    /// Board after the push.
    pub board: Board,
    /// Marbles displaced, including the pusher.
    pub marbles_moved: usize,
    /// Marble shoved over the edge, if any.
    pub pushed_off: Option<Marble>,
    /// Move forbidden to the opponent on their next turn.
    pub ko: Option<Move>,
}

/// Applies `mv` for `to_move` to a copy of `board`.
///
/// The move must already have passed [`validate`]. The pushed cell becomes
/// empty and every marble ahead of it shifts one step until a gap absorbs
/// the line or the last marble falls off the edge.
///
/// If the last cell of the line ends up holding an opponent marble, the ko
/// move is the push from that cell back the way this one came.
#[instrument(level = "trace", skip(board))]
pub fn push(board: &Board, to_move: Color, mv: Move) -> PushOutcome {
    let mut next = board.clone();
    let (dx, dy) = mv.direction.delta();
    let (mut x, mut y) = (mv.x, mv.y);
    let mut carried = Marble::Empty;
    let mut marbles_moved = 0;

    while let Some(previous) = next.replace(x, y, carried) {
        carried = previous;
        if carried.is_empty() {
            break;
        }
        marbles_moved += 1;
        x += dx;
        y += dy;
    }

    let pushed_off = if next.in_bounds(x, y) {
        None
    } else {
        x -= dx;
        y -= dy;
        Some(carried)
    };

    let ko = (next.get(x, y) == Some(to_move.opponent().marble()))
        .then(|| Move::new(x, y, mv.direction.reverse()));

    PushOutcome {
        board: next,
        marbles_moved,
        pushed_off,
        ko,
    }
}

/// Every legal move for `to_move`, scanning columns then rows, and
/// directions in [`Direction::ALL`] order.
#[instrument(level = "trace", skip(board, ko))]
pub fn legal_moves(board: &Board, to_move: Color, ko: Option<&Move>) -> Vec<MoveWithCount> {
    let size = board.size() as i32;
    let mine = to_move.marble();
    let mut moves = Vec::new();
    for x in 0..size {
        for y in 0..size {
            if board.get(x, y) != Some(mine) {
                continue;
            }
            moves.extend(
                Direction::ALL
                    .into_iter()
                    .filter_map(|d| validate(board, to_move, ko, Move::new(x, y, d)).ok()),
            );
        }
    }
    moves
}

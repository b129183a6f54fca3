//! Square board of marbles.

use crate::marble::Marble;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Error building a board from rows or text.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum BoardError {
    /// The grid has no rows.
    #[display("Board must have at least one row")]
    Empty,

    /// A row's length does not match the number of rows.
    #[display("Row {} has {} cells, expected {}", row, len, expected)]
    NotSquare {
        /// Offending row index.
        row: usize,
        /// Its length.
        len: usize,
        /// Required length.
        expected: usize,
    },

    /// A text board contained a character that is not a marble symbol.
    #[display("Unknown marble symbol {:?}", _0)]
    UnknownSymbol(#[error(not(source))] char),
}

/// An `N×N` grid of marbles stored row-major.
///
/// Coordinates are `(x, y)` with `x` the column and `y` the row, both counted
/// from the top-left corner. Coordinates are signed so that off-board cells
/// can be named while walking a push line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<Marble>>", into = "Vec<Vec<Marble>>")]
pub struct Board {
    size: usize,
    cells: Vec<Marble>,
}

impl Board {
    /// Builds a board from rows. All rows must have as many cells as there
    /// are rows.
    pub fn from_rows(rows: Vec<Vec<Marble>>) -> Result<Self, BoardError> {
        let size = rows.len();
        if size == 0 {
            return Err(BoardError::Empty);
        }
        let mut cells = Vec::with_capacity(size * size);
        for (row, marbles) in rows.into_iter().enumerate() {
            if marbles.len() != size {
                return Err(BoardError::NotSquare {
                    row,
                    len: marbles.len(),
                    expected: size,
                });
            }
            cells.extend(marbles);
        }
        Ok(Self { size, cells })
    }

    /// The standard 7×7 opening position.
    pub fn standard() -> Self {
        use Marble::{Black as B, Empty as x, Red as R, White as W};
        let rows = vec![
            vec![W, W, x, x, x, B, B],
            vec![W, W, x, R, x, B, B],
            vec![x, x, R, R, R, x, x],
            vec![x, R, R, R, R, R, x],
            vec![x, x, R, R, R, x, x],
            vec![B, B, x, R, x, W, W],
            vec![B, B, x, x, x, W, W],
        ];
        Self {
            size: 7,
            cells: rows.into_iter().flatten().collect(),
        }
    }

    /// Side length.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns true if `(x, y)` lies on the board.
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        self.index(x, y).is_some()
    }

    /// Returns the marble at `(x, y)`, or `None` off the board.
    pub fn get(&self, x: i32, y: i32) -> Option<Marble> {
        self.index(x, y).map(|i| self.cells[i])
    }

    /// Writes `marble` at `(x, y)` and returns what was there before.
    /// Returns `None` and leaves the board untouched off the board.
    pub fn replace(&mut self, x: i32, y: i32, marble: Marble) -> Option<Marble> {
        let i = self.index(x, y)?;
        Some(std::mem::replace(&mut self.cells[i], marble))
    }

    /// Iterates rows from top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Marble]> {
        self.cells.chunks(self.size)
    }

    /// Counts cells holding `marble`.
    pub fn count(&self, marble: Marble) -> usize {
        self.cells.iter().filter(|&&m| m == marble).count()
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        (x < self.size && y < self.size).then_some(y * self.size + x)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::standard()
    }
}

impl TryFrom<Vec<Vec<Marble>>> for Board {
    type Error = BoardError;

    fn try_from(rows: Vec<Vec<Marble>>) -> Result<Self, Self::Error> {
        Self::from_rows(rows)
    }
}

impl From<Board> for Vec<Vec<Marble>> {
    fn from(board: Board) -> Self {
        board.rows().map(<[Marble]>::to_vec).collect()
    }
}

/// Renders rows of marble symbols separated by `/`, e.g. `R../.B./W..`.
impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, row) in self.rows().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            for marble in row {
                write!(f, "{}", marble)?;
            }
        }
        Ok(())
    }
}

/// Parses the `Display` form. Rows may also be separated by newlines, and
/// spaces between symbols are ignored.
impl FromStr for Board {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rows = s
            .split(['/', '\n'])
            .map(str::trim)
            .filter(|row| !row.is_empty())
            .map(|row| {
                row.chars()
                    .filter(|c| !c.is_whitespace())
                    .map(|c| Marble::from_symbol(c).ok_or(BoardError::UnknownSymbol(c)))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_rows(rows)
    }
}

//! Cell values and player colors.

use serde::{Deserialize, Serialize};

/// Player color. White always makes the first move of a game.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Color {
    /// Moves first.
    White,
    /// Moves second.
    Black,
}

impl Color {
    /// Both colors in a fixed order. Anything that scans colors uses this
    /// order so that results never depend on hash iteration.
    pub const ALL: [Color; 2] = [Color::White, Color::Black];

    /// Returns the opposing color.
    pub fn opponent(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Returns the marble this color plays with.
    pub fn marble(self) -> Marble {
        match self {
            Color::White => Marble::White,
            Color::Black => Marble::Black,
        }
    }

    /// Stable index into per-color arrays.
    pub fn index(self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => 1,
        }
    }
}

/// Value of a single board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Marble {
    /// No marble.
    #[default]
    #[serde(rename = " ")]
    Empty,
    /// White player's marble.
    #[serde(rename = "W")]
    White,
    /// Black player's marble.
    #[serde(rename = "B")]
    Black,
    /// Neutral scoring marble. Pushing one off the board scores a point.
    #[serde(rename = "R")]
    Red,
}

impl Marble {
    /// Returns true for an empty cell.
    pub fn is_empty(self) -> bool {
        self == Marble::Empty
    }

    /// Returns the color owning this marble, if any.
    pub fn owner(self) -> Option<Color> {
        match self {
            Marble::White => Some(Color::White),
            Marble::Black => Some(Color::Black),
            Marble::Empty | Marble::Red => None,
        }
    }

    /// Single-character symbol used in text boards (`.` for empty).
    pub fn symbol(self) -> char {
        match self {
            Marble::Empty => '.',
            Marble::White => 'W',
            Marble::Black => 'B',
            Marble::Red => 'R',
        }
    }

    /// Parses a text-board symbol. Accepts `.`, `_`, or space for empty.
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol.to_ascii_uppercase() {
            '.' | '_' | ' ' => Some(Marble::Empty),
            'W' => Some(Marble::White),
            'B' => Some(Marble::Black),
            'R' => Some(Marble::Red),
            _ => None,
        }
    }
}

impl From<Color> for Marble {
    fn from(color: Color) -> Self {
        color.marble()
    }
}

impl std::fmt::Display for Marble {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

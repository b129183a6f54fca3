//! Game outcome.

use kuba_rules::Color;
use serde::{Deserialize, Serialize};

/// Where a game stands. Once a game leaves `Ongoing` its status never
/// changes again.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// Moves are still being played.
    #[default]
    Ongoing,
    /// White won by score, entrapment, timeout, or resignation.
    WhiteWon,
    /// Black won by score, entrapment, timeout, or resignation.
    BlackWon,
    /// Draw by threefold repetition.
    Draw,
    /// Nobody moved before the first-move deadline.
    Aborted,
}

impl Status {
    /// The status for `color` winning.
    pub fn win_for(color: Color) -> Self {
        match color {
            Color::White => Status::WhiteWon,
            Color::Black => Status::BlackWon,
        }
    }

    /// Returns true once the game is over.
    pub fn is_terminal(self) -> bool {
        self != Status::Ongoing
    }

    /// The winning color, if the game ended with a winner.
    pub fn winner(self) -> Option<Color> {
        match self {
            Status::WhiteWon => Some(Color::White),
            Status::BlackWon => Some(Color::Black),
            Status::Ongoing | Status::Draw | Status::Aborted => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_win_for_round_trips_winner() {
        for color in Color::ALL {
            assert_eq!(Status::win_for(color).winner(), Some(color));
            assert!(Status::win_for(color).is_terminal());
        }
        assert_eq!(Status::Draw.winner(), None);
        assert!(!Status::Ongoing.is_terminal());
    }

    #[test]
    fn test_text_form() {
        assert_eq!(Status::WhiteWon.to_string(), "WHITE_WON");
        assert_eq!("ABORTED".parse::<Status>().unwrap(), Status::Aborted);
        assert_eq!(
            serde_json::to_string(&Status::BlackWon).unwrap(),
            "\"BLACK_WON\""
        );
    }
}

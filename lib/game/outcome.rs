use crate::board::Color;
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// The termination verdict of a game.
#[derive(Debug, Display, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[serde(deny_unknown_fields, rename_all = "lowercase")]
pub enum Outcome {
    /// One of the sides has won.
    #[display(fmt = "the {} player wins by {}", winner, reason)]
    Victory { winner: Color, reason: String },

    /// Neither side has won.
    #[display(fmt = "draw by {}", reason)]
    Draw { reason: String },
}

impl Outcome {
    /// The verdict against a side whose clock expired.
    pub fn time_forfeit(loser: Color) -> Self {
        Outcome::Victory {
            winner: !loser,
            reason: "time forfeit".to_string(),
        }
    }

    /// Whether one of the sides has won.
    pub fn is_decisive(&self) -> bool {
        matches!(self, Outcome::Victory { .. })
    }

    /// Whether neither side has won.
    pub fn is_draw(&self) -> bool {
        !self.is_decisive()
    }

    /// The winning side, if the outcome is [decisive](`Self::is_decisive`).
    pub fn winner(&self) -> Option<Color> {
        match self {
            Outcome::Victory { winner, .. } => Some(*winner),
            Outcome::Draw { .. } => None,
        }
    }

    /// The reason tag attached to the verdict.
    pub fn reason(&self) -> &str {
        match self {
            Outcome::Victory { reason, .. } | Outcome::Draw { reason } => reason,
        }
    }
}

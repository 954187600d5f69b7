use derive_more::{Constructor, Display, Error};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::instrument;

/// A coordinate addressing one cell of a [`Board`][`super::Board`].
///
/// The default codec spells a cell as a file letter followed by a 1-based
/// rank number, e.g. `a1` or `c7`, and covers files `a` through `z`.
#[derive(
    Debug,
    Constructor,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Deserialize,
    Serialize,
)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub struct Cell {
    #[cfg_attr(test, strategy(0u8..26))]
    pub file: u8,
    pub rank: u8,
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.file) as char, self.rank as u16 + 1)
    }
}

/// The reason why parsing [`Cell`] failed.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Hash, Error)]
#[display(fmt = "unable to parse cell")]
pub struct ParseCellError;

impl FromStr for Cell {
    type Err = ParseCellError;

    #[instrument(level = "trace", err)]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();

        let file = match chars.next() {
            Some(c @ 'a'..='z') => c as u8 - b'a',
            _ => return Err(ParseCellError),
        };

        let rank = match chars.as_str().parse::<u16>() {
            Ok(n @ 1..=256) => (n - 1) as u8,
            _ => return Err(ParseCellError),
        };

        Ok(Cell { file, rank })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_strategy::proptest;

    #[proptest]
    fn parsing_printed_cell_is_an_identity(c: Cell) {
        assert_eq!(c.to_string().parse(), Ok(c));
    }

    #[proptest]
    fn parsing_cell_fails_if_file_is_invalid(#[strategy("[^a-z]+")] f: String, r: u8) {
        let s = [f, (r as u16 + 1).to_string()].concat();
        assert_eq!(s.parse::<Cell>(), Err(ParseCellError));
    }

    #[proptest]
    fn parsing_cell_fails_if_rank_is_invalid(
        #[strategy(0u8..26)] f: u8,
        #[strategy("[^0-9]*")] r: String,
    ) {
        let s = [((b'a' + f) as char).to_string(), r].concat();
        assert_eq!(s.parse::<Cell>(), Err(ParseCellError));
    }

    #[proptest]
    fn parsing_cell_fails_if_rank_is_zero(#[strategy(0u8..26)] f: u8) {
        let s = format!("{}0", (b'a' + f) as char);
        assert_eq!(s.parse::<Cell>(), Err(ParseCellError));
    }
}

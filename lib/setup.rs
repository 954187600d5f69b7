use crate::board::Color;
use derive_more::{Display, Error, From};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Configuration for the time budgets of a match.
///
/// A side without a budget plays without a clock.
#[derive(
    Debug, Display, Copy, Clone, Eq, PartialEq, Hash, Default, Deserialize, Serialize,
)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[display(fmt = "{}", "ron::ser::to_string(self).unwrap()")]
#[serde(deny_unknown_fields, rename_all = "lowercase")]
pub struct TimeControl {
    /// The white player's budget, if timed.
    #[cfg_attr(
        test,
        strategy(proptest::option::of(proptest::strategy::Strategy::prop_map(
            1u64..86_400,
            Duration::from_secs
        )))
    )]
    #[serde(default, with = "humantime_serde")]
    pub white: Option<Duration>,

    /// The black player's budget, if timed.
    #[cfg_attr(
        test,
        strategy(proptest::option::of(proptest::strategy::Strategy::prop_map(
            1u64..86_400,
            Duration::from_secs
        )))
    )]
    #[serde(default, with = "humantime_serde")]
    pub black: Option<Duration>,
}

impl TimeControl {
    /// The budget for the given side, if timed.
    pub fn budget(&self, color: Color) -> Option<Duration> {
        match color {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }
}

/// The reason why parsing [`TimeControl`] failed.
#[derive(Debug, Display, Eq, PartialEq, Error, From)]
#[display(fmt = "failed to parse time control")]
pub struct ParseTimeControlError(ron::de::SpannedError);

impl FromStr for TimeControl {
    type Err = ParseTimeControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ron::de::from_str(s)?)
    }
}

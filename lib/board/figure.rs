use super::Color;
use derive_more::{Constructor, Display};
use serde::{Deserialize, Serialize};

/// A piece of a certain color and role, detached from any board.
///
/// Two independently constructed pieces are *similar* iff their figures are
/// equal; this is the comparison used to match re-parsed moves against a live
/// board's legal-move set.
#[derive(
    Debug, Display, Constructor, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize,
)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[display(fmt = "{} {}", color, role)]
pub struct Figure {
    pub color: Color,
    pub role: String,
}

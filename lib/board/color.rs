use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::ops::Not;

/// The color of a [`Piece`][`super::Piece`].
#[derive(
    Debug, Display, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize,
)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Color {
    #[display(fmt = "white")]
    White,
    #[display(fmt = "black")]
    Black,
}

impl Color {
    pub const VARIANTS: [Self; 2] = [Color::White, Color::Black];

    /// This color's index into per-color tables.
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl Not for Color {
    type Output = Self;

    fn not(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

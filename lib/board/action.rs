use super::{Cell, Piece};
use std::fmt;
use std::sync::Arc;

/// An atomic mutation of a single [`Board`][`super::Board`] cell.
///
/// Equality requires identical piece identity (or both pieces absent) and an
/// identical cell; [`Action::similar`] is the looser relation used to compare
/// moves across independently constructed piece instances.
#[derive(Debug, Clone)]
pub enum Action {
    /// Places a piece on the given cell.
    ///
    /// An absent piece is the *recycle* marker: place whatever piece the
    /// surrounding [`Move`][`super::Move`] most recently removed and has not
    /// yet replaced elsewhere.
    Add {
        cell: Cell,
        piece: Option<Arc<dyn Piece>>,
    },

    /// Takes whatever occupies the given cell off the board.
    Remove { cell: Cell },
}

impl Action {
    /// Constructs the placement of `piece` on `cell`.
    pub fn add(cell: Cell, piece: Arc<dyn Piece>) -> Self {
        Action::Add {
            cell,
            piece: Some(piece),
        }
    }

    /// Constructs the recycle marker on `cell`.
    pub fn recycle(cell: Cell) -> Self {
        Action::Add { cell, piece: None }
    }

    /// Constructs the removal of whatever occupies `cell`.
    pub fn remove(cell: Cell) -> Self {
        Action::Remove { cell }
    }

    /// The cell this action mutates.
    pub fn cell(&self) -> Cell {
        match self {
            Action::Add { cell, .. } | Action::Remove { cell } => *cell,
        }
    }

    /// Whether this action matches another up to piece identity.
    ///
    /// Identical cell and equal [`Figure`][`super::Figure`]s, or both pieces
    /// absent.
    pub fn similar(&self, other: &Self) -> bool {
        match (self, other) {
            (Action::Remove { cell: l }, Action::Remove { cell: r }) => l == r,

            (Action::Add { cell: l, piece: lp }, Action::Add { cell: r, piece: rp }) => {
                l == r
                    && match (lp, rp) {
                        (None, None) => true,
                        (Some(lp), Some(rp)) => lp.figure() == rp.figure(),
                        _ => false,
                    }
            }

            _ => false,
        }
    }
}

impl PartialEq for Action {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Action::Remove { cell: l }, Action::Remove { cell: r }) => l == r,

            (Action::Add { cell: l, piece: lp }, Action::Add { cell: r, piece: rp }) => {
                l == r
                    && match (lp, rp) {
                        (None, None) => true,
                        (Some(lp), Some(rp)) => lp.id() == rp.id(),
                        _ => false,
                    }
            }

            _ => false,
        }
    }
}

impl Eq for Action {}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Remove { cell } => write!(f, "-{}", cell),
            Action::Add { cell, piece: None } => write!(f, "+{}", cell),
            Action::Add {
                cell,
                piece: Some(piece),
            } => write!(f, "+{}({})", cell, piece.figure()),
        }
    }
}

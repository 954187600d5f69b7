use super::{Cell, Figure};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The arrangement of figures on a board, detached from the pieces
/// themselves.
///
/// This type does not validate whether the arrangement it holds is legal
/// according to any ruleset.
#[derive(Debug, Default, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct Placement(BTreeMap<Cell, Figure>);

impl Placement {
    /// The figure occupying the given cell, if any.
    pub fn occupant(&self, cell: Cell) -> Option<&Figure> {
        self.0.get(&cell)
    }

    /// Every occupied cell and its figure, in cell order.
    pub fn iter(&self) -> impl Iterator<Item = (&Cell, &Figure)> {
        self.0.iter()
    }

    /// The number of occupied cells.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no cell is occupied.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Cell, Figure)> for Placement {
    fn from_iter<I: IntoIterator<Item = (Cell, Figure)>>(figures: I) -> Self {
        Placement(figures.into_iter().collect())
    }
}

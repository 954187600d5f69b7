use super::Action;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// One player's full turn, as an ordered immutable sequence of [`Action`]s.
///
/// Cheap to clone; clones share the underlying sequence.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Move(Arc<[Action]>);

impl Move {
    /// Whether this move matches another action for action by
    /// [similarity][`Action::similar`], including length.
    pub fn similar(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(l, r)| l.similar(r))
    }
}

impl Deref for Move {
    type Target = [Action];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Action>> for Move {
    fn from(actions: Vec<Action>) -> Self {
        Move(actions.into())
    }
}

impl FromIterator<Action> for Move {
    fn from_iter<I: IntoIterator<Item = Action>>(actions: I) -> Self {
        Move(actions.into_iter().collect())
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, action) in self.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }

            write!(f, "{}", action)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::stubs::Token;
    use super::super::{Board, Cell, Color, Piece};
    use super::*;
    use test_strategy::proptest;

    #[proptest]
    fn moves_lift_action_equality_pointwise(c: Cell, d: Cell) {
        let m = Move::from(vec![Action::remove(c), Action::recycle(d)]);

        assert_eq!(m, Move::from(vec![Action::remove(c), Action::recycle(d)]));
        assert_ne!(m, Move::from(vec![Action::recycle(d), Action::remove(c)]));
    }

    #[proptest]
    fn similarity_includes_length(c: Cell, d: Cell) {
        let long = Move::from(vec![Action::remove(c), Action::recycle(d)]);
        let short = Move::from(vec![Action::remove(c)]);

        assert!(!long.similar(&short));
        assert!(!short.similar(&long));
        assert!(long.similar(&long.clone()));
    }

    #[proptest]
    fn similarity_tolerates_distinct_piece_instances(c: Cell, d: Cell, color: Color) {
        let board = Board::new([]);
        let one: Arc<dyn Piece> = Arc::new(Token::new(&board, color));
        let other: Arc<dyn Piece> = Arc::new(Token::new(&board, color));

        let l = Move::from(vec![Action::remove(d), Action::add(c, one)]);
        let r = Move::from(vec![Action::remove(d), Action::add(c, other)]);

        assert_ne!(l, r);
        assert!(l.similar(&r));
    }

    #[proptest]
    fn moves_have_a_canonical_notation(c: Cell, d: Cell) {
        let m = Move::from(vec![Action::remove(c), Action::recycle(d)]);
        assert_eq!(m.to_string(), format!("-{} +{}", c, d));
        assert_eq!(Move::from(vec![]).to_string(), "");
    }
}

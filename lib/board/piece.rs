use super::{Board, Cell, Color, Figure, Move, Placement};
use derive_more::Display;
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};

/// The identity of a [`Piece`] instance.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[display(fmt = "#{}", _0)]
pub struct PieceId(u64);

impl PieceId {
    /// Mints an identity no other piece has.
    pub fn unique() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        PieceId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// The identity of a [`Board`] instance.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[display(fmt = "#{}", _0)]
pub struct BoardId(u64);

impl BoardId {
    /// Mints an identity no other board has.
    pub fn unique() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        BoardId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Trait for game objects that live on a [`Board`].
///
/// A piece is associated with exactly one board for its entire lifetime; the
/// binding is set at construction and never reassigned. The sole sanctioned
/// exception is [`Piece::reproduce`], which the board's clone routine uses to
/// rebind a field copy to the clone.
pub trait Piece: Debug + Send + Sync {
    /// The identity of this piece instance.
    fn id(&self) -> PieceId;

    /// The board this piece is bound to.
    fn board(&self) -> BoardId;

    /// The color this piece plays for.
    fn color(&self) -> Color;

    /// The name of this kind of piece.
    fn role(&self) -> &str;

    /// Candidate [`Move`]s by this piece's local rules alone.
    ///
    /// No cross-piece legality filtering happens here; that is the rule
    /// oracle's business.
    fn moves(&self, board: &Board) -> Vec<Move>;

    /// The cell this piece sets itself up on, if any.
    fn starting_cell(&self) -> Option<Cell>;

    /// A field copy of this piece bound to the given board.
    fn reproduce(&self, board: BoardId) -> Box<dyn Piece>;

    /// Notifies this piece that it entered its board.
    fn added(&mut self) {}

    /// Notifies this piece that it was captured off its board.
    fn removed(&mut self) {}

    /// Notifies this piece of a move about to be played, along with the
    /// arrangement of pieces before any of its effects apply.
    fn announced(&mut self, _move: &Move, _before: &Placement) {}

    /// This piece's color and role.
    fn figure(&self) -> Figure {
        Figure::new(self.color(), self.role().to_string())
    }

    /// Whether this piece plays for the white side.
    fn is_white(&self) -> bool {
        self.color() == Color::White
    }
}

impl PartialEq for dyn Piece {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for dyn Piece {}

use super::{Action, BoardId, Cell, Color, Figure, Move, Piece, PieceId, Placement};
use derive_more::{Display, Error};
use std::collections::{BTreeMap, HashMap};
use tracing::instrument;

/// The reason why mutating a [`Board`] failed.
///
/// These indicate an upstream legality bug and are fatal to the attempted
/// operation; they are raised to the caller, never swallowed.
#[derive(Debug, Display, Clone, Eq, PartialEq, Hash, Error)]
pub enum BoardError {
    #[display(fmt = "cell {} does not exist on this board", _0)]
    UnknownCell(#[error(not(source))] Cell),

    #[display(fmt = "cell {} is already occupied", _0)]
    Occupied(#[error(not(source))] Cell),

    #[display(fmt = "there is no removed piece left to place back on {}", _0)]
    BareRecycle(#[error(not(source))] Cell),

    #[display(fmt = "the {} is bound to a different board", _0)]
    ForeignPiece(#[error(not(source))] Figure),

    #[display(fmt = "the {} is already on this board", _0)]
    DuplicatePiece(#[error(not(source))] Figure),
}

/// An addressable grid of cells that owns the pieces placed on it.
///
/// A cell is *usable* (exists), *vacant* (usable and unoccupied), or
/// occupied. The per-color piece indices and the cell storage are kept
/// mutually consistent: a piece appears in an index iff its cell holds it.
#[derive(Debug)]
pub struct Board {
    id: BoardId,
    cells: BTreeMap<Cell, Option<PieceId>>,
    roster: HashMap<PieceId, Box<dyn Piece>>,
    squads: [BTreeMap<PieceId, Cell>; 2],
}

impl Board {
    /// Constructs a board whose usable cells are exactly `cells`.
    pub fn new(cells: impl IntoIterator<Item = Cell>) -> Self {
        Board {
            id: BoardId::unique(),
            cells: cells.into_iter().map(|c| (c, None)).collect(),
            roster: HashMap::new(),
            squads: [BTreeMap::new(), BTreeMap::new()],
        }
    }

    /// The identity of this board.
    pub fn id(&self) -> BoardId {
        self.id
    }

    /// Whether the given cell exists on this board.
    pub fn usable(&self, cell: Cell) -> bool {
        self.cells.contains_key(&cell)
    }

    /// Whether the given cell exists and is unoccupied.
    pub fn vacant(&self, cell: Cell) -> bool {
        matches!(self.cells.get(&cell), Some(None))
    }

    /// The piece occupying the given cell, if any.
    pub fn occupant(&self, cell: Cell) -> Option<&dyn Piece> {
        match self.cells.get(&cell) {
            Some(Some(id)) => self.roster.get(id).map(Box::as_ref),
            _ => None,
        }
    }

    /// The cell the given piece stands on, if it is on this board.
    pub fn locate(&self, piece: PieceId) -> Option<Cell> {
        self.squads.iter().find_map(|s| s.get(&piece)).copied()
    }

    /// Every usable cell, in order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells.keys().copied()
    }

    /// The pieces of the given color, in identity order.
    pub fn pieces(&self, color: Color) -> impl Iterator<Item = &dyn Piece> {
        self.squads[color.index()]
            .keys()
            .filter_map(|id| self.roster.get(id).map(Box::as_ref))
    }

    /// The arrangement of figures currently on this board.
    pub fn placement(&self) -> Placement {
        self.cells
            .iter()
            .filter_map(|(cell, slot)| {
                let id = (*slot)?;
                Some((*cell, self.roster.get(&id)?.figure()))
            })
            .collect()
    }

    /// Puts a piece on a cell of this board.
    ///
    /// Fails if the piece is bound to a different board, is already here, or
    /// the cell is absent or occupied.
    pub fn place(&mut self, piece: Box<dyn Piece>, cell: Cell) -> Result<(), BoardError> {
        if piece.board() != self.id {
            return Err(BoardError::ForeignPiece(piece.figure()));
        }

        if self.roster.contains_key(&piece.id()) {
            return Err(BoardError::DuplicatePiece(piece.figure()));
        }

        match self.cells.get_mut(&cell) {
            None => Err(BoardError::UnknownCell(cell)),
            Some(Some(_)) => Err(BoardError::Occupied(cell)),
            Some(slot) => {
                *slot = Some(piece.id());
                self.squads[piece.color().index()].insert(piece.id(), cell);
                self.roster.insert(piece.id(), piece);
                Ok(())
            }
        }
    }

    /// Takes a piece off this board; a no-op if it is not here.
    pub fn remove(&mut self, piece: PieceId) -> Option<Box<dyn Piece>> {
        let cell = self.locate(piece)?;

        if let Some(slot) = self.cells.get_mut(&cell) {
            *slot = None;
        }

        for squad in &mut self.squads {
            squad.remove(&piece);
        }

        self.roster.remove(&piece)
    }

    /// Plays a move on this board and returns the genuinely captured pieces.
    ///
    /// Every resident piece is told about the move before any mutation.
    /// Removed pieces go onto a LIFO stack; a recycle [`Action::Add`] pops
    /// the stack instead of introducing a piece, which is how a single move
    /// shuffles pieces between cells without carrying their identity.
    /// Whatever is left on the stack afterwards was captured.
    #[instrument(level = "debug", skip(self), err)]
    pub fn apply(&mut self, m: &Move) -> Result<Vec<Box<dyn Piece>>, BoardError> {
        let debutants: Vec<_> = m
            .iter()
            .filter_map(|a| match a {
                Action::Add {
                    piece: Some(piece), ..
                } if !self.roster.contains_key(&piece.id()) => Some(piece.id()),
                _ => None,
            })
            .collect();

        let before = self.placement();
        for piece in self.roster.values_mut() {
            piece.announced(m, &before);
        }

        let mut collected = Vec::new();
        for action in m.iter() {
            match action {
                Action::Remove { cell } => {
                    if !self.usable(*cell) {
                        return Err(BoardError::UnknownCell(*cell));
                    }

                    if let Some(id) = self.occupant(*cell).map(|p| p.id()) {
                        collected.extend(self.remove(id));
                    }
                }

                Action::Add {
                    cell,
                    piece: Some(piece),
                } => {
                    self.place(piece.reproduce(piece.board()), *cell)?;
                }

                Action::Add { cell, piece: None } => {
                    let piece = collected.pop().ok_or(BoardError::BareRecycle(*cell))?;
                    self.place(piece, *cell)?;
                }
            }
        }

        for piece in &mut collected {
            piece.removed();
        }

        for id in debutants {
            if let Some(piece) = self.roster.get_mut(&id) {
                piece.added();
            }
        }

        Ok(collected)
    }
}

impl Clone for Board {
    /// A structural deep copy with zero piece aliasing.
    ///
    /// Every piece is re-inserted as a [`Piece::reproduce`] copy bound to
    /// the clone, at the same coordinate.
    fn clone(&self) -> Self {
        let mut copy = Board::new(self.cells());
        let fresh = copy.id;

        for color in Color::VARIANTS {
            for (&id, &cell) in &self.squads[color.index()] {
                if let Some(piece) = self.roster.get(&id) {
                    copy.cells.insert(cell, Some(id));
                    copy.squads[color.index()].insert(id, cell);
                    copy.roster.insert(id, piece.reproduce(fresh));
                }
            }
        }

        copy
    }
}

use crate::board::{Board, BoardError, Color, Move, Piece};
use crate::rules::Rules;
use derive_more::{Display, Error, From};
use std::sync::Arc;
use tracing::instrument;

mod outcome;

pub use outcome::*;

/// The reason why a move was not executed.
#[derive(Debug, Display, Eq, PartialEq, Error, From)]
pub enum PlayError {
    /// The game has ended; this is a control signal, not a failure.
    #[display(fmt = "the game has ended; {}", _0)]
    Ended(#[error(not(source))] Outcome),

    /// The submitted move is not in the current legal set; nothing changed.
    #[display(fmt = "'{}' is not a legal move in this position", _0)]
    Rejected(#[error(not(source))] String),

    /// The board reported an invariant breach while applying a legal move.
    #[display(fmt = "{}", _0)]
    Fault(BoardError),
}

#[derive(Debug)]
enum Phase {
    Ongoing { turn: Color, legal: Vec<Move> },
    Over(Outcome),
}

/// The authoritative state machine of one match.
///
/// Holds the live board, the append-only move and turn histories, the
/// per-color captured sets, and the cached legal-move list. The legal cache
/// is emptied the moment a termination verdict is recorded.
#[derive(Debug)]
pub struct Game {
    rules: Arc<dyn Rules>,
    board: Board,
    moves: Vec<Move>,
    turns: Vec<Color>,
    captures: [Vec<Box<dyn Piece>>; 2],
    notes: Vec<String>,
    phase: Phase,
}

impl Game {
    /// Starts a game on the given board.
    ///
    /// Consults the oracle once to seed the legal-move cache; fails if the
    /// verdict is already in.
    pub fn new(rules: Arc<dyn Rules>, board: Board) -> Result<Self, PlayError> {
        match rules.proceed(&board, &[]) {
            Err(o) => Err(PlayError::Ended(o)),
            Ok(c) => Ok(Game {
                rules,
                board,
                moves: Vec::new(),
                turns: Vec::new(),
                captures: [Vec::new(), Vec::new()],
                notes: c.notes,
                phase: Phase::Ongoing {
                    turn: c.turn,
                    legal: c.moves,
                },
            }),
        }
    }

    /// The ruleset this game is played by.
    pub fn rules(&self) -> &dyn Rules {
        self.rules.as_ref()
    }

    /// The live board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The moves played so far, in order.
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// The side that played each move, in order.
    pub fn turns(&self) -> &[Color] {
        &self.turns
    }

    /// The pieces of the given color captured so far.
    pub fn captures(&self, color: Color) -> impl Iterator<Item = &dyn Piece> {
        self.captures[color.index()].iter().map(Box::as_ref)
    }

    /// The oracle's advisory notes for the current position.
    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    /// The side to move, if the game is still ongoing.
    pub fn turn(&self) -> Option<Color> {
        match &self.phase {
            Phase::Ongoing { turn, .. } => Some(*turn),
            Phase::Over(_) => None,
        }
    }

    /// Every legal move in the current position.
    ///
    /// Empty once the game has ended, and stays empty.
    pub fn legal_moves(&self) -> &[Move] {
        match &self.phase {
            Phase::Ongoing { legal, .. } => legal,
            Phase::Over(_) => &[],
        }
    }

    /// The termination verdict, if the game has ended.
    pub fn outcome(&self) -> Option<&Outcome> {
        match &self.phase {
            Phase::Over(o) => Some(o),
            Phase::Ongoing { .. } => None,
        }
    }

    /// Resolves a move against the current legal set by
    /// [similarity][`Move::similar`].
    ///
    /// Legal moves are generated fresh each turn against the live board's
    /// actual piece instances, while a submitted move may have been parsed
    /// independently and reference equal but distinct instances.
    pub fn validate(&self, m: &Move) -> Option<&Move> {
        self.legal_moves().iter().find(|legal| legal.similar(m))
    }

    /// Executes one move given in this game's notation.
    ///
    /// On a verdict from the oracle, records it, empties the legal cache,
    /// and re-raises it as [`PlayError::Ended`].
    #[instrument(level = "debug", skip(self), err)]
    pub fn execute(&mut self, text: &str) -> Result<(), PlayError> {
        let (turn, m) = match &self.phase {
            Phase::Over(o) => return Err(PlayError::Ended(o.clone())),
            Phase::Ongoing { turn, .. } => {
                let submitted = match self.rules.decode(&self.board, text) {
                    Ok(m) => m,
                    Err(_) => return Err(PlayError::Rejected(text.to_string())),
                };

                match self.validate(&submitted) {
                    None => return Err(PlayError::Rejected(text.to_string())),
                    Some(m) => (*turn, m.clone()),
                }
            }
        };

        let captured = self.board.apply(&m)?;
        self.moves.push(m);
        self.turns.push(turn);

        for piece in captured {
            self.captures[piece.color().index()].push(piece);
        }

        match self.rules.proceed(&self.board, &self.turns) {
            Ok(c) => {
                self.notes = c.notes;
                self.phase = Phase::Ongoing {
                    turn: c.turn,
                    legal: c.moves,
                };

                Ok(())
            }

            Err(o) => {
                self.notes = Vec::new();
                self.phase = Phase::Over(o.clone());
                Err(PlayError::Ended(o))
            }
        }
    }
}

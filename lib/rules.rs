use crate::board::{Board, BoardError, Cell, Color, Move, ParseCellError, Piece};
use crate::game::Outcome;
use derive_more::{Constructor, Display, Error};
use std::fmt::Debug;

/// The continuation of an ongoing game, as reported by the rule oracle.
#[derive(Debug, Display, Constructor, Clone)]
#[display(fmt = "the {} player has {} legal moves", turn, "moves.len()")]
pub struct Continuation {
    /// The side to move next.
    pub turn: Color,

    /// Every legal move available to that side.
    pub moves: Vec<Move>,

    /// Advisory messages for the players, e.g. a check warning.
    pub notes: Vec<String>,
}

/// The reason why a move could not be interpreted.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
#[display(fmt = "unable to interpret '{}' as a move", _0)]
pub struct ParseMoveError(#[error(not(source))] pub String);

/// The reason why a board description could not be interpreted.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
#[display(fmt = "unable to interpret the board description; {}", _0)]
pub struct ParseBoardError(#[error(not(source))] pub String);

/// The reason why a piece could not be fabricated.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
#[display(fmt = "this game has no '{}' piece", _0)]
pub struct UnknownRole(#[error(not(source))] pub String);

/// Trait for the pluggable, game-specific rule oracle.
///
/// The oracle supplies piece, move, and board factories, the coordinate
/// codec, and [`Rules::proceed`], which turns a board and its turn history
/// into the next legal-move set or a termination verdict.
pub trait Rules: Debug + Send + Sync {
    /// The name this ruleset is known by.
    fn name(&self) -> &str;

    /// Fabricates a piece of the given color and role bound to `board`.
    fn piece(&self, board: &Board, color: Color, role: &str) -> Result<Box<dyn Piece>, UnknownRole>;

    /// Interprets a move in this game's notation against the given board.
    fn decode(&self, board: &Board, text: &str) -> Result<Move, ParseMoveError>;

    /// The canonical notation for a move.
    fn encode(&self, m: &Move) -> String {
        m.to_string()
    }

    /// A board with this game's topology and no pieces.
    fn blank(&self) -> Board;

    /// A board set up for the start of a game.
    fn initial(&self) -> Board;

    /// Reconstructs a board from its serialized description.
    fn restore(&self, text: &str) -> Result<Board, ParseBoardError>;

    /// The notation for a cell.
    fn format_cell(&self, cell: Cell) -> String {
        cell.to_string()
    }

    /// Interprets a cell in this game's notation.
    fn parse_cell(&self, text: &str) -> Result<Cell, ParseCellError> {
        text.parse()
    }

    /// The continue-game oracle.
    ///
    /// `Err` carries the termination verdict; it is a control signal, not a
    /// failure.
    fn proceed(&self, board: &Board, turns: &[Color]) -> Result<Continuation, Outcome>;

    /// Evaluates a hypothetical move on a deep copy of the board.
    fn simulate(&self, board: &Board, m: &Move) -> Result<Board, BoardError> {
        let mut copy = board.clone();
        copy.apply(m)?;
        Ok(copy)
    }
}

#[cfg(test)]
mockall::mock! {
    #[derive(Debug)]
    pub Rules {}

    impl Rules for Rules {
        fn name(&self) -> &str;
        fn piece(&self, board: &Board, color: Color, role: &str) -> Result<Box<dyn Piece>, UnknownRole>;
        fn decode(&self, board: &Board, text: &str) -> Result<Move, ParseMoveError>;
        fn encode(&self, m: &Move) -> String;
        fn blank(&self) -> Board;
        fn initial(&self) -> Board;
        fn restore(&self, text: &str) -> Result<Board, ParseBoardError>;
        fn format_cell(&self, cell: Cell) -> String;
        fn parse_cell(&self, text: &str) -> Result<Cell, ParseCellError>;
        fn proceed(&self, board: &Board, turns: &[Color]) -> Result<Continuation, Outcome>;
        fn simulate(&self, board: &Board, m: &Move) -> Result<Board, BoardError>;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{stubs::Token, Action};
    use test_strategy::proptest;

    #[derive(Debug)]
    struct Trivial;

    impl Rules for Trivial {
        fn name(&self) -> &str {
            "trivial"
        }

        fn piece(
            &self,
            board: &Board,
            color: Color,
            role: &str,
        ) -> Result<Box<dyn Piece>, UnknownRole> {
            match role {
                "token" => Ok(Box::new(Token::new(board, color))),
                _ => Err(UnknownRole(role.to_string())),
            }
        }

        fn decode(&self, _: &Board, text: &str) -> Result<Move, ParseMoveError> {
            Err(ParseMoveError(text.to_string()))
        }

        fn blank(&self) -> Board {
            Board::new([Cell::new(0, 0), Cell::new(1, 0)])
        }

        fn initial(&self) -> Board {
            self.blank()
        }

        fn restore(&self, text: &str) -> Result<Board, ParseBoardError> {
            Err(ParseBoardError(text.to_string()))
        }

        fn proceed(&self, _: &Board, _: &[Color]) -> Result<Continuation, Outcome> {
            Ok(Continuation::new(Color::White, Vec::new(), Vec::new()))
        }
    }

    #[proptest]
    fn cell_codec_defaults_to_the_board_notation(c: Cell) {
        assert_eq!(Trivial.format_cell(c), c.to_string());
        assert_eq!(Trivial.parse_cell(&c.to_string()), Ok(c));
    }

    #[proptest]
    fn move_notation_defaults_to_the_canonical_form(c: Cell, d: Cell) {
        let m = Move::from(vec![Action::remove(c), Action::recycle(d)]);
        assert_eq!(Trivial.encode(&m), m.to_string());
    }

    #[test]
    fn simulate_leaves_the_original_board_untouched() {
        let mut board = Trivial.blank();
        let token = Trivial.piece(&board, Color::White, "token").unwrap();
        let id = token.id();
        board.place(token, Cell::new(0, 0)).unwrap();

        let m = Move::from(vec![
            Action::remove(Cell::new(0, 0)),
            Action::recycle(Cell::new(1, 0)),
        ]);

        let copy = Trivial.simulate(&board, &m).unwrap();

        assert_eq!(copy.occupant(Cell::new(1, 0)).map(|p| p.id()), Some(id));
        assert_eq!(board.occupant(Cell::new(0, 0)).map(|p| p.id()), Some(id));
        assert!(board.vacant(Cell::new(1, 0)));
    }

    #[test]
    fn unknown_roles_are_rejected() {
        let board = Trivial.blank();

        assert_eq!(
            Trivial
                .piece(&board, Color::White, "dragon")
                .map(|_| ())
                .unwrap_err(),
            UnknownRole("dragon".to_string())
        );
    }
}

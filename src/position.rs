//! Position collaborator used by the search.
//!
//! The search only ever talks to a [`GameState`]: a mutable stack of
//! positions with push/pop. [`ChessPosition`] is the real implementation on
//! top of the `chess` crate; tests plug in synthetic trees.

use std::fmt;
use std::str::FromStr;

use chess::{Board, BoardStatus, ChessMove, Color, MoveGen, Piece, Square};
use thiserror::Error;

use crate::types::*;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PositionError {
    #[error("invalid FEN {fen:?}: {reason}")]
    InvalidFen { fen: String, reason: String },
    #[error("cannot parse move {0:?}")]
    InvalidMove(String),
    #[error("illegal move {0} in this position")]
    IllegalMove(ChessMove),
    #[error("no move to undo")]
    NothingToUndo,
}

/// What the search needs from a board.
///
/// `push`/`pop` must be exact inverses: after `pop` every query answers the
/// same as before the matching `push`.
pub trait GameState {
    type Move: Copy + PartialEq + fmt::Debug + fmt::Display;

    fn side_to_move(&self) -> Color;
    /// Legal moves in the position's natural enumeration order.
    fn legal_moves(&self) -> Vec<Self::Move>;
    fn legal_move_count(&self) -> usize { self.legal_moves().len() }
    fn piece_at(&self, sq: Square) -> Option<(Piece, Color)>;
    fn fullmove_number(&self) -> u32;
    /// Number of moves currently on the stack.
    fn ply_count(&self) -> usize;
    fn is_terminal(&self) -> bool { self.legal_move_count() == 0 }

    fn push(&mut self, mv: Self::Move);
    fn pop(&mut self) -> Option<Self::Move>;
}

#[derive(Clone, Copy, Debug)]
struct Frame {
    board: Board,
    halfmove: u32,
    fullmove: u32,
    last: Option<ChessMove>,
}

/// Chess position with an undo stack. Each push stores the whole
/// `chess::Board` (it is `Copy`), so pop is a plain stack pop.
#[derive(Clone, Debug)]
pub struct ChessPosition {
    frames: Vec<Frame>,
}

impl Default for ChessPosition {
    fn default() -> Self {
        Self::from_board(Board::default(), 0, 1)
    }
}

impl ChessPosition {
    pub fn new() -> Self { Self::default() }

    pub fn from_board(board: Board, halfmove: u32, fullmove: u32) -> Self {
        Self { frames: vec![Frame { board, halfmove, fullmove: fullmove.max(1), last: None }] }
    }

    pub fn from_fen(fen: &str) -> Result<Self, PositionError> {
        let board = Board::from_str(fen).map_err(|e| PositionError::InvalidFen {
            fen: fen.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::from_board(board, halfmove_clock_from_fen(fen), fullmove_number_from_fen(fen)))
    }

    #[inline] fn top(&self) -> &Frame {
        // frames is never empty: pop refuses to remove the root frame
        &self.frames[self.frames.len() - 1]
    }

    #[inline] pub fn board(&self) -> &Board { &self.top().board }

    pub fn fen(&self) -> String {
        let top = self.top();
        let text = top.board.to_string();
        let head: Vec<&str> = text.split_whitespace().take(4).collect();
        format!("{} {} {}", head.join(" "), top.halfmove, top.fullmove)
    }

    pub fn is_checkmate(&self) -> bool { self.board().status() == BoardStatus::Checkmate }
    pub fn is_stalemate(&self) -> bool { self.board().status() == BoardStatus::Stalemate }

    /// Moves played since the root position, oldest first.
    pub fn moves_played(&self) -> Vec<ChessMove> {
        self.frames.iter().filter_map(|f| f.last).collect()
    }

    pub fn is_legal(&self, mv: ChessMove) -> bool {
        MoveGen::new_legal(self.board()).any(|m| m == mv)
    }

    pub fn push_checked(&mut self, mv: ChessMove) -> Result<(), PositionError> {
        if !self.is_legal(mv) {
            return Err(PositionError::IllegalMove(mv));
        }
        self.push(mv);
        Ok(())
    }

    pub fn pop_checked(&mut self) -> Result<ChessMove, PositionError> {
        self.pop().ok_or(PositionError::NothingToUndo)
    }

    /// Back to the standard start position with an empty history.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Standard algebraic notation, e.g. `Nf3`, `exd5`, `O-O`, `e8=Q`.
    pub fn parse_san(&self, text: &str) -> Result<ChessMove, PositionError> {
        // `chess` only understands promotions written without the `=`.
        let san: String = text.trim().chars().filter(|&c| c != '=').collect();
        ChessMove::from_san(self.board(), &san)
            .map_err(|_| PositionError::InvalidMove(text.to_string()))
    }

    /// Coordinate notation, e.g. `e2e4`, `e7e8q`.
    pub fn parse_uci(&self, text: &str) -> Result<ChessMove, PositionError> {
        parse_uci_move(text.trim()).ok_or_else(|| PositionError::InvalidMove(text.to_string()))
    }

    /// Coordinate notation first, SAN as a fallback. The result is legal.
    pub fn parse_move(&self, text: &str) -> Result<ChessMove, PositionError> {
        let mv = self.parse_uci(text).or_else(|_| self.parse_san(text))?;
        if self.is_legal(mv) { Ok(mv) } else { Err(PositionError::IllegalMove(mv)) }
    }
}

impl GameState for ChessPosition {
    type Move = ChessMove;

    #[inline] fn side_to_move(&self) -> Color { self.board().side_to_move() }

    fn legal_moves(&self) -> Vec<ChessMove> { MoveGen::new_legal(self.board()).collect() }

    fn legal_move_count(&self) -> usize { MoveGen::new_legal(self.board()).len() }

    fn piece_at(&self, sq: Square) -> Option<(Piece, Color)> {
        let b = self.board();
        match (b.piece_on(sq), b.color_on(sq)) {
            (Some(p), Some(c)) => Some((p, c)),
            _ => None,
        }
    }

    #[inline] fn fullmove_number(&self) -> u32 { self.top().fullmove }

    #[inline] fn ply_count(&self) -> usize { self.frames.len() - 1 }

    fn push(&mut self, mv: ChessMove) {
        let top = *self.top();
        let b = &top.board;
        let resets_clock = b.piece_on(mv.get_source()) == Some(Piece::Pawn)
            || b.piece_on(mv.get_dest()).is_some();
        let fullmove = if b.side_to_move() == Color::Black { top.fullmove + 1 } else { top.fullmove };
        self.frames.push(Frame {
            board: b.make_move_new(mv),
            halfmove: if resets_clock { 0 } else { top.halfmove + 1 },
            fullmove,
            last: Some(mv),
        });
    }

    fn pop(&mut self) -> Option<ChessMove> {
        if self.frames.len() <= 1 { return None; }
        self.frames.pop().and_then(|f| f.last)
    }
}

impl fmt::Display for ChessPosition {
    /// 8x8 diagram, rank 8 on top, `.` for empty squares.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8).rev() {
            write!(f, "{} ", rank + 1)?;
            for file in 0..8 {
                let sq = Square::make_square(chess::Rank::from_index(rank), chess::File::from_index(file));
                let c = self.piece_at(sq).map(|(p, col)| piece_char(p, col)).unwrap_or('.');
                write!(f, " {}", c)?;
            }
            writeln!(f)?;
        }
        write!(f, "   a b c d e f g h")
    }
}

pub fn parse_uci_move(s: &str) -> Option<ChessMove> {
    if s.len() < 4 || s.len() > 5 || !s.is_ascii() { return None; }
    let from = Square::from_str(&s[0..2]).ok()?;
    let to = Square::from_str(&s[2..4]).ok()?;
    let promo = if s.len() == 5 {
        match &s[4..5] {
            "q" => Some(Piece::Queen),
            "r" => Some(Piece::Rook),
            "b" => Some(Piece::Bishop),
            "n" => Some(Piece::Knight),
            _ => return None,
        }
    } else { None };
    Some(ChessMove::new(from, to, promo))
}

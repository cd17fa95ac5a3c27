use chess::{Color, Piece};

/// Evaluation from the fixed reference side's point of view.
pub type Score = f64;

// ---------------------------
// Tunables / constants
// ---------------------------
pub const DEFAULT_DEPTH: u32 = 3;
pub const MAX_DEPTH: u32 = 64;

// Terminal sentinels (no legal moves for the side to move)
pub const LOSS: Score = -999.0;
pub const WIN: Score = 999.0;

// Piece values in centipawns; material is summed as integers so the
// result does not depend on square order.
pub const P: i32 = 100;
pub const N: i32 = 320;
pub const B: i32 = 333;
pub const R_: i32 = 510;
pub const Q_: i32 = 880;
pub const CP_PER_PAWN: Score = 100.0;

// Opening development: mobility bonus applies while fullmove < OPENING_MOVES
pub const OPENING_MOVES: u32 = 10;
pub const MOBILITY_DIVISOR: Score = 30.0;

// Upper bound (exclusive) of the random tie-break term
pub const JITTER_SCALE: Score = 0.001;

// ---------------------------
// Small helpers
// ---------------------------
#[inline] pub fn piece_val(pc: Piece) -> i32 {
    match pc {
        Piece::Pawn => P, Piece::Knight => N, Piece::Bishop => B,
        Piece::Rook => R_, Piece::Queen => Q_, Piece::King => 0,
    }
}
#[inline] pub fn piece_char(pc: Piece, color: Color) -> char {
    let c = match pc {
        Piece::Pawn => 'p', Piece::Knight => 'n', Piece::Bishop => 'b',
        Piece::Rook => 'r', Piece::Queen => 'q', Piece::King => 'k',
    };
    if color == Color::White { c.to_ascii_uppercase() } else { c }
}
#[inline] pub fn opp(c: Color) -> Color { if c == Color::White { Color::Black } else { Color::White } }
#[inline] pub fn color_name(c: Color) -> &'static str { if c == Color::White { "white" } else { "black" } }

// `chess::Board` drops the move counters, so they are read off the FEN text.
#[inline]
pub fn halfmove_clock_from_fen(fen: &str) -> u32 {
    fen.split_whitespace().nth(4).and_then(|s| s.parse::<u32>().ok()).unwrap_or(0)
}
#[inline]
pub fn fullmove_number_from_fen(fen: &str) -> u32 {
    fen.split_whitespace().nth(5).and_then(|s| s.parse::<u32>().ok()).unwrap_or(1).max(1)
}

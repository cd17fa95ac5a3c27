use chess::{Color, ALL_SQUARES};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::position::GameState;
use crate::types::*;

/// Static scoring of a position, always from `reference`'s point of view.
pub trait Evaluator<S: GameState> {
    fn evaluate(&mut self, pos: &S, reference: Color) -> Score;
}

/// Material + terminal + opening mobility, with a tiny random term so
/// equal positions do not always resolve to the same move.
pub struct HeuristicEval<R = SmallRng> {
    rng: Option<R>,
}

impl<R: Rng> HeuristicEval<R> {
    pub fn with_rng(rng: R) -> Self { Self { rng: Some(rng) } }

    #[inline]
    fn jitter(&mut self) -> Score {
        match self.rng.as_mut() {
            Some(rng) => JITTER_SCALE * rng.gen::<f64>(),
            None => 0.0,
        }
    }
}

impl HeuristicEval<SmallRng> {
    pub fn seeded(seed: u64) -> Self { Self::with_rng(SmallRng::seed_from_u64(seed)) }
    pub fn from_entropy() -> Self { Self::with_rng(SmallRng::from_entropy()) }
    /// No jitter: every score is reproducible.
    pub fn deterministic() -> Self { Self { rng: None } }
}

impl<R: Rng, S: GameState> Evaluator<S> for HeuristicEval<R> {
    fn evaluate(&mut self, pos: &S, reference: Color) -> Score {
        // Count once: both the terminal and the opening term need it.
        let mobility = pos.legal_move_count();
        material(pos, reference)
            + terminal(pos, reference, mobility)
            + opening(pos, reference, mobility)
            + self.jitter()
    }
}

/// Sum of piece values, positive for `reference`'s pieces.
pub fn material<S: GameState>(pos: &S, reference: Color) -> Score {
    let mut cp = 0i32;
    for &sq in ALL_SQUARES.iter() {
        if let Some((piece, color)) = pos.piece_at(sq) {
            let v = piece_val(piece);
            cp += if color == reference { v } else { -v };
        }
    }
    cp as Score / CP_PER_PAWN
}

/// `LOSS` when the side to move is `reference` and has no moves, `WIN` when
/// the opponent is stuck. Mate and stalemate score the same.
pub fn terminal<S: GameState>(pos: &S, reference: Color, mobility: usize) -> Score {
    if mobility > 0 { return 0.0; }
    if pos.side_to_move() == reference { LOSS } else { WIN }
}

/// Mobility bonus for the side to move during the first moves of the game.
pub fn opening<S: GameState>(pos: &S, reference: Color, mobility: usize) -> Score {
    if pos.fullmove_number() >= OPENING_MOVES { return 0.0; }
    let bonus = mobility as Score / MOBILITY_DIVISOR;
    if pos.side_to_move() == reference { bonus } else { -bonus }
}

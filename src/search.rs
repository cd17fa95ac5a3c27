use std::ops::{Deref, DerefMut};

use chess::{ChessMove, Color};
use log::{debug, info};
use thiserror::Error;

use crate::eval::{Evaluator, HeuristicEval};
use crate::position::GameState;
use crate::types::*;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("invalid search depth {0}")]
    InvalidDepth(u32),
    #[error("no legal moves in the root position")]
    NoLegalMoves,
}

// ---------- Scoped apply/undo: the move is taken back when this drops ----------
struct Applied<'a, P: GameState> {
    pos: &'a mut P,
}

impl<'a, P: GameState> Applied<'a, P> {
    #[inline]
    fn new(pos: &'a mut P, mv: P::Move) -> Self {
        pos.push(mv);
        Self { pos }
    }
}

impl<P: GameState> Deref for Applied<'_, P> {
    type Target = P;
    fn deref(&self) -> &P { &*self.pos }
}

impl<P: GameState> DerefMut for Applied<'_, P> {
    fn deref_mut(&mut self) -> &mut P { &mut *self.pos }
}

impl<P: GameState> Drop for Applied<'_, P> {
    fn drop(&mut self) { self.pos.pop(); }
}
// ---------------------------------------------------------------------------

/// Depth-limited minimax with single-bound pruning.
///
/// Scores are always from `side`'s perspective: odd plies maximize (the
/// searching side moves), even plies minimize. Each child is searched with
/// its parent's running best as the only bound.
pub struct Search<E> {
    /// Moves applied during the last search.
    pub nodes: u64,
    /// Static evaluations during the last search.
    pub evals: u64,
    /// Root value of the last successful search.
    pub score: Option<Score>,
    max_depth: u32,
    side: Color,
    eval: E,
}

impl<E> Search<E> {
    pub fn new(eval: E) -> Self {
        Self { nodes: 0, evals: 0, score: None, max_depth: 1, side: Color::White, eval }
    }

    /// Pick the move for `side`, looking `max_depth` plies deep.
    ///
    /// The root always expands, so `max_depth == 1` and `max_depth == 2`
    /// both reduce to a one-ply greedy choice.
    pub fn best_move<P>(&mut self, pos: &mut P, max_depth: u32, side: Color) -> Result<P::Move, SearchError>
    where
        P: GameState,
        E: Evaluator<P>,
    {
        self.score = None;
        if max_depth < 1 || max_depth > MAX_DEPTH {
            return Err(SearchError::InvalidDepth(max_depth));
        }
        if pos.is_terminal() {
            return Err(SearchError::NoLegalMoves);
        }
        self.nodes = 0;
        self.evals = 0;
        self.max_depth = max_depth;
        self.side = side;

        let (score, best) = self.search(pos, None, 1);
        let mv = best.ok_or(SearchError::NoLegalMoves)?;
        self.score = Some(score);
        info!(
            "search depth={} side={} best={} score={:.3} nodes={} evals={}",
            max_depth, color_name(side), mv, score, self.nodes, self.evals
        );
        Ok(mv)
    }

    #[inline]
    fn leaf<P>(&mut self, pos: &P) -> Score
    where
        P: GameState,
        E: Evaluator<P>,
    {
        self.evals += 1;
        self.eval.evaluate(pos, self.side)
    }

    /// Returns the node's value, plus the chosen move when `depth == 1`.
    fn search<P>(&mut self, pos: &mut P, bound: Option<Score>, depth: u32) -> (Score, Option<P::Move>)
    where
        P: GameState,
        E: Evaluator<P>,
    {
        if depth > 1 && depth >= self.max_depth {
            return (self.leaf(pos), None);
        }
        let moves = pos.legal_moves();
        if moves.is_empty() {
            return (self.leaf(pos), None);
        }

        let maximizing = depth % 2 == 1;
        let mut best = if maximizing { Score::NEG_INFINITY } else { Score::INFINITY };
        let mut best_move = None;

        for mv in moves {
            let value = {
                let mut child = Applied::new(pos, mv);
                self.nodes += 1;
                self.search(&mut *child, Some(best), depth + 1).0
            };

            if maximizing && value > best {
                if depth == 1 {
                    debug!("root {} -> {:.3}", mv, value);
                    best_move = Some(mv);
                }
                best = value;
            } else if !maximizing && value < best {
                best = value;
            }

            // The parent already owns a better alternative: stop here.
            match bound {
                Some(b) if !maximizing && value < b => break,
                Some(b) if maximizing && value > b => break,
                _ => {}
            }
        }

        (best, best_move)
    }
}

/// One-shot search with a fresh jittered evaluator.
pub fn select_best_move<P: GameState>(pos: &mut P, max_depth: u32, side: Color) -> Result<P::Move, SearchError> {
    Search::new(HeuristicEval::from_entropy()).best_move(pos, max_depth, side)
}

/// Coordinate string of the engine's choice, `0000` when there is none.
pub fn best_move_or_null<P, E>(search: &mut Search<E>, pos: &mut P, max_depth: u32, side: Color) -> String
where
    P: GameState<Move = ChessMove>,
    E: Evaluator<P>,
{
    match search.best_move(pos, max_depth, side) {
        Ok(mv) => mv.to_string(),
        Err(_) => "0000".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::{Piece, Square};
    use std::fmt;

    // ---------- Synthetic game tree: every node is a position ----------
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    struct Edge(usize);

    impl fmt::Display for Edge {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "#{}", self.0) }
    }

    struct Node {
        children: Vec<usize>,
        score: Score,
    }

    struct Tree {
        nodes: Vec<Node>,
        path: Vec<usize>,
        applied: Vec<usize>,
    }

    impl Tree {
        fn new() -> Self {
            Self { nodes: vec![Node { children: vec![], score: 0.0 }], path: vec![0], applied: vec![] }
        }
        fn add(&mut self, parent: usize, score: Score) -> usize {
            let id = self.nodes.len();
            self.nodes.push(Node { children: vec![], score });
            self.nodes[parent].children.push(id);
            id
        }
        fn here(&self) -> usize { *self.path.last().unwrap() }
    }

    impl GameState for Tree {
        type Move = Edge;
        fn side_to_move(&self) -> Color {
            if self.path.len() % 2 == 1 { Color::White } else { Color::Black }
        }
        fn legal_moves(&self) -> Vec<Edge> {
            self.nodes[self.here()].children.iter().map(|&c| Edge(c)).collect()
        }
        fn piece_at(&self, _sq: Square) -> Option<(Piece, Color)> { None }
        fn fullmove_number(&self) -> u32 { 1 }
        fn ply_count(&self) -> usize { self.path.len() - 1 }
        fn push(&mut self, mv: Edge) {
            self.applied.push(mv.0);
            self.path.push(mv.0);
        }
        fn pop(&mut self) -> Option<Edge> {
            if self.path.len() <= 1 { return None; }
            self.path.pop().map(Edge)
        }
    }

    /// Leaf values straight from the tree, already from White's view.
    struct TableEval;

    impl Evaluator<Tree> for TableEval {
        fn evaluate(&mut self, pos: &Tree, _reference: Color) -> Score {
            pos.nodes[pos.here()].score
        }
    }

    /// Plain minimax without pruning, for cross-checking.
    fn minimax(t: &Tree, node: usize, depth: u32, max_depth: u32) -> Score {
        let kids = &t.nodes[node].children;
        if kids.is_empty() || (depth > 1 && depth >= max_depth) {
            return t.nodes[node].score;
        }
        let vals = kids.iter().map(|&c| minimax(t, c, depth + 1, max_depth));
        if depth % 2 == 1 { vals.fold(Score::NEG_INFINITY, Score::max) } else { vals.fold(Score::INFINITY, Score::min) }
    }

    fn leaves(t: &mut Tree, parent: usize, scores: &[Score]) {
        for &s in scores { t.add(parent, s); }
    }

    #[test]
    fn minimizing_ply_cuts_once_below_parent_best() {
        // A: min(3, 5) = 3. B: first reply scores 2 < 3, rest of B is skipped.
        let mut t = Tree::new();
        let a = t.add(0, 0.0);
        let b = t.add(0, 0.0);
        leaves(&mut t, a, &[3.0, 5.0]);
        leaves(&mut t, b, &[2.0, 9.0, 1.0]);
        let b1 = t.nodes[b].children[0];

        let mut s = Search::new(TableEval);
        let mv = s.best_move(&mut t, 3, Color::White).unwrap();
        assert_eq!(mv, Edge(a));
        assert_eq!(s.score, Some(3.0));
        assert_eq!(t.applied, vec![a, a + 2, a + 3, b, b1]);
        assert_eq!(s.nodes, 5);
        assert_eq!(t.ply_count(), 0);
    }

    #[test]
    fn maximizing_ply_cuts_once_above_parent_best() {
        // root -> A -> {x, y}; x = max(4, 6) = 6; y's first leaf 7 > 6 ends y.
        let mut t = Tree::new();
        let a = t.add(0, 0.0);
        let x = t.add(a, 0.0);
        let y = t.add(a, 0.0);
        leaves(&mut t, x, &[4.0, 6.0]);
        leaves(&mut t, y, &[7.0, 1.0]);

        let mut s = Search::new(TableEval);
        assert_eq!(s.best_move(&mut t, 4, Color::White).unwrap(), Edge(a));
        assert_eq!(s.nodes, 6);
        assert_eq!(s.evals, 3);
        assert_eq!(t.path, vec![0]);
    }

    #[test]
    fn two_ply_choice_matches_exhaustive_minimax() {
        let layouts: [&[&[Score]]; 3] = [
            &[&[3.0, 5.0], &[2.0, 9.0, 1.0], &[4.0, 4.5]],
            &[&[-1.0], &[0.0, -2.0], &[0.5, 0.25, 7.0]],
            &[&[8.0, 8.0], &[8.0], &[9.0, 7.9]],
        ];
        for layout in layouts {
            let mut t = Tree::new();
            let mut root_moves = vec![];
            for scores in layout {
                let m = t.add(0, 0.0);
                leaves(&mut t, m, scores);
                root_moves.push(m);
            }
            let expected = root_moves
                .iter()
                .map(|&m| (m, minimax(&t, m, 2, 3)))
                .fold((0, Score::NEG_INFINITY), |acc, (m, v)| if v > acc.1 { (m, v) } else { acc });

            let mut s = Search::new(TableEval);
            let got = s.best_move(&mut t, 3, Color::White).unwrap();
            assert_eq!(got, Edge(expected.0), "layout {:?}", layout);
            assert_eq!(s.score, Some(expected.1), "layout {:?}", layout);
            assert_eq!(t.ply_count(), 0);
        }
    }

    #[test]
    fn ties_keep_the_first_move() {
        let mut t = Tree::new();
        let first = t.add(0, 1.0);
        t.add(0, 1.0);
        let mut s = Search::new(TableEval);
        assert_eq!(s.best_move(&mut t, 2, Color::White).unwrap(), Edge(first));
    }

    #[test]
    fn depth_one_still_returns_a_move() {
        let mut t = Tree::new();
        t.add(0, 1.0);
        let best = t.add(0, 2.0);
        let mut s = Search::new(TableEval);
        assert_eq!(s.best_move(&mut t, 1, Color::White).unwrap(), Edge(best));
        assert_eq!(s.best_move(&mut t, 2, Color::White).unwrap(), Edge(best));
    }

    #[test]
    fn early_terminal_nodes_are_leaves() {
        // A ends the game at ply 1; B gets refuted deeper.
        let mut t = Tree::new();
        let a = t.add(0, 50.0);
        let b = t.add(0, 0.0);
        leaves(&mut t, b, &[-3.0]);
        let mut s = Search::new(TableEval);
        assert_eq!(s.best_move(&mut t, 5, Color::White).unwrap(), Edge(a));
        assert_eq!(t.ply_count(), 0);
    }

    #[test]
    fn rejects_bad_depth_and_empty_root() {
        let mut t = Tree::new();
        let mut s = Search::new(TableEval);
        assert_eq!(s.best_move(&mut t, 3, Color::White), Err(SearchError::NoLegalMoves));
        t.add(0, 0.0);
        assert_eq!(s.best_move(&mut t, 0, Color::White), Err(SearchError::InvalidDepth(0)));
        assert_eq!(s.best_move(&mut t, MAX_DEPTH + 1, Color::White), Err(SearchError::InvalidDepth(MAX_DEPTH + 1)));
        assert!(t.applied.is_empty());

        // A failed search clears the previous root value.
        s.best_move(&mut t, 2, Color::White).unwrap();
        assert_eq!(s.score, Some(0.0));
        assert!(s.best_move(&mut t, 0, Color::White).is_err());
        assert_eq!(s.score, None);
    }
}

//! Human-versus-engine session: whose turn, input parsing, takebacks and
//! the end-of-game check. Terminal I/O lives in `main.rs`.

use std::fmt;

use chess::{ChessMove, Color};
use log::debug;
use thiserror::Error;

use crate::config::EngineConfig;
use crate::eval::HeuristicEval;
use crate::position::{ChessPosition, GameState, PositionError};
use crate::search::{Search, SearchError};
use crate::types::*;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error(transparent)]
    Position(#[from] PositionError),
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error("the game is over")]
    GameOver,
    #[error("it is not the {0} player's turn")]
    WrongTurn(&'static str),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HumanInput {
    /// Take back the engine's reply and the human move before it.
    Undo,
    Move(ChessMove),
}

pub fn parse_human_input(pos: &ChessPosition, text: &str) -> Result<HumanInput, PositionError> {
    let t = text.trim();
    if t.eq_ignore_ascii_case("undo") {
        return Ok(HumanInput::Undo);
    }
    pos.parse_move(t).map(HumanInput::Move)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Checkmate { winner: Color },
    Stalemate,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Checkmate { winner: Color::White } => write!(f, "1-0 (checkmate, white wins)"),
            Outcome::Checkmate { winner: Color::Black } => write!(f, "0-1 (checkmate, black wins)"),
            Outcome::Stalemate => write!(f, "1/2-1/2 (stalemate)"),
        }
    }
}

pub fn outcome(pos: &ChessPosition) -> Option<Outcome> {
    if pos.is_checkmate() {
        Some(Outcome::Checkmate { winner: opp(pos.side_to_move()) })
    } else if pos.is_stalemate() {
        Some(Outcome::Stalemate)
    } else {
        None
    }
}

pub struct Game {
    pub position: ChessPosition,
    pub engine_side: Color,
    pub depth: u32,
    search: Search<HeuristicEval>,
}

impl Game {
    pub fn new(config: &EngineConfig, engine_side: Color, position: ChessPosition) -> Self {
        Self { position, engine_side, depth: config.depth, search: Search::new(config.evaluator()) }
    }

    #[inline] pub fn human_side(&self) -> Color { opp(self.engine_side) }
    #[inline] pub fn is_engine_turn(&self) -> bool { self.position.side_to_move() == self.engine_side }
    #[inline] pub fn outcome(&self) -> Option<Outcome> { outcome(&self.position) }
    /// Moves applied by the engine's last search.
    #[inline] pub fn last_nodes(&self) -> u64 { self.search.nodes }

    pub fn play_engine_move(&mut self) -> Result<ChessMove, GameError> {
        if self.outcome().is_some() { return Err(GameError::GameOver); }
        if !self.is_engine_turn() { return Err(GameError::WrongTurn("engine")); }
        let mv = self.search.best_move(&mut self.position, self.depth, self.engine_side)?;
        self.position.push_checked(mv)?;
        debug!("engine played {} ({} nodes)", mv, self.search.nodes);
        Ok(mv)
    }

    pub fn apply_human(&mut self, input: HumanInput) -> Result<(), GameError> {
        match input {
            HumanInput::Undo => {
                if self.position.ply_count() < 2 {
                    return Err(PositionError::NothingToUndo.into());
                }
                self.position.pop_checked()?;
                self.position.pop_checked()?;
                debug!("took back two plies, now at ply {}", self.position.ply_count());
                Ok(())
            }
            HumanInput::Move(mv) => {
                if self.outcome().is_some() { return Err(GameError::GameOver); }
                if self.is_engine_turn() { return Err(GameError::WrongTurn("human")); }
                self.position.push_checked(mv)?;
                Ok(())
            }
        }
    }
}

/// Board for game number `round` (counting from 0). A custom FEN only
/// seeds the first game; later games start from the initial position.
pub fn opening_position(fen: Option<&str>, round: usize) -> Result<ChessPosition, PositionError> {
    match fen {
        Some(f) if round == 0 => ChessPosition::from_fen(f),
        _ => Ok(ChessPosition::new()),
    }
}

/// Answer to "play again?": only an explicit yes starts another game.
pub fn wants_rematch(answer: Option<&str>) -> bool {
    matches!(answer.map(|a| a.trim().to_ascii_lowercase()).as_deref(), Some("y" | "yes"))
}

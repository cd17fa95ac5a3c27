// plyengine/src/lib.rs

pub mod types;
pub mod position;
pub mod eval;
pub mod search;
pub mod config;
pub mod game;
pub mod uci;

pub use types::*;
pub use position::{ChessPosition, GameState, PositionError};
pub use eval::{Evaluator, HeuristicEval};
pub use search::{select_best_move, Search, SearchError};
pub use config::EngineConfig;
pub use game::{Game, GameError, HumanInput, Outcome};
pub use uci::UciSession;

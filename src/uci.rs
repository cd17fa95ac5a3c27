//! Synchronous UCI command handling. One command in, zero or more lines out.

use log::debug;

use crate::config::EngineConfig;
use crate::eval::HeuristicEval;
use crate::position::{ChessPosition, GameState};
use crate::search::{best_move_or_null, Search};
use crate::types::*;

pub const ENGINE_NAME: &str = "plyengine";

pub struct UciSession {
    position: ChessPosition,
    default_depth: u32,
    search: Search<HeuristicEval>,
    quit: bool,
}

impl UciSession {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            position: ChessPosition::new(),
            default_depth: config.depth,
            search: Search::new(config.evaluator()),
            quit: false,
        }
    }

    #[inline] pub fn should_quit(&self) -> bool { self.quit }
    #[inline] pub fn position(&self) -> &ChessPosition { &self.position }

    pub fn handle(&mut self, line: &str) -> Vec<String> {
        let cmd = line.trim();
        debug!("uci recv '{}'", cmd);

        if cmd == "uci" {
            return vec![
                format!("id name {}", ENGINE_NAME),
                "id author open-source".to_string(),
                "uciok".to_string(),
            ];
        }
        if cmd == "isready" {
            return vec!["readyok".to_string()];
        }
        if cmd.starts_with("ucinewgame") {
            self.position.reset();
            return vec![];
        }
        if let Some(after) = cmd.strip_prefix("position ") {
            return self.set_position(after);
        }
        if cmd == "go" || cmd.starts_with("go ") {
            return self.go(cmd);
        }
        if cmd == "quit" {
            self.quit = true;
        }
        vec![]
    }

    fn set_position(&mut self, args: &str) -> Vec<String> {
        let parts: Vec<&str> = args.split_whitespace().collect();
        let idx;
        if parts.first() == Some(&"startpos") {
            self.position = ChessPosition::new();
            idx = 1;
        } else if parts.first() == Some(&"fen") {
            if parts.len() < 7 {
                self.position = ChessPosition::new();
                return vec!["info string position-parse-error FEN: expected 6 tokens".to_string()];
            }
            match ChessPosition::from_fen(&parts[1..7].join(" ")) {
                Ok(p) => self.position = p,
                Err(e) => {
                    self.position = ChessPosition::new();
                    return vec![format!("info string position-parse-error {}", e)];
                }
            }
            idx = 7;
        } else {
            self.position = ChessPosition::new();
            return vec!["info string position-parse-error SYNTAX: expected startpos or fen".to_string()];
        }

        let mut out = vec![];
        if parts.get(idx) == Some(&"moves") {
            for mv_str in &parts[idx + 1..] {
                let applied = self.position.parse_uci(mv_str).and_then(|mv| self.position.push_checked(mv));
                if applied.is_err() {
                    out.push(format!("info string bad-move {}", mv_str));
                }
            }
        }
        out
    }

    fn go(&mut self, cmd: &str) -> Vec<String> {
        let mut depth = self.default_depth;
        let parts: Vec<&str> = cmd.split_whitespace().collect();
        let mut i = 1;
        while i + 1 < parts.len() {
            match parts[i] {
                "depth" => { if let Ok(d) = parts[i + 1].parse::<u32>() { depth = d; } i += 2; }
                _ => i += 1,
            }
        }
        let depth = depth.clamp(1, MAX_DEPTH);
        let side = self.position.side_to_move();
        let best = best_move_or_null(&mut self.search, &mut self.position, depth, side);
        let score = match self.search.score {
            Some(v) => format!("{:.3}", v),
            None => "none".to_string(),
        };
        vec![
            format!(
                "info string depth {} nodes {} evals {} score {}",
                depth, self.search.nodes, self.search.evals, score
            ),
            format!("bestmove {}", best),
        ]
    }
}

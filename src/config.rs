use std::env;

use log::warn;

use crate::eval::HeuristicEval;
use crate::types::{DEFAULT_DEPTH, MAX_DEPTH};

/// Engine knobs shared by the interactive game and the UCI loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    pub depth: u32,
    /// Add the `[0, 0.001)` tie-break term to every evaluation.
    pub jitter: bool,
    /// Fixed seed for the jitter source; entropy when `None`.
    pub seed: Option<u64>,
}

/// Depths the search accepts: `1..=MAX_DEPTH`.
#[inline]
pub fn valid_depth(depth: u32) -> bool {
    (1..=MAX_DEPTH).contains(&depth)
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { depth: DEFAULT_DEPTH, jitter: true, seed: None }
    }
}

impl EngineConfig {
    /// Defaults overridden by `ENGINE_DEPTH`, `ENGINE_SEED` and `ENGINE_JITTER`.
    pub fn from_env() -> Self {
        Self::from_lookup(|k| env::var(k).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();
        match get("ENGINE_DEPTH").map(|s| s.trim().parse::<u32>()) {
            Some(Ok(d)) if valid_depth(d) => cfg.depth = d,
            Some(_) => warn!("ignoring ENGINE_DEPTH: expected 1..={}", MAX_DEPTH),
            None => {}
        }
        cfg.seed = get("ENGINE_SEED").and_then(|s| s.trim().parse::<u64>().ok());
        if let Some(j) = get("ENGINE_JITTER") {
            cfg.jitter = !matches!(j.trim().to_ascii_lowercase().as_str(), "0" | "false" | "off" | "no");
        }
        cfg
    }

    pub fn evaluator(&self) -> HeuristicEval {
        match (self.jitter, self.seed) {
            (false, _) => HeuristicEval::deterministic(),
            (true, Some(seed)) => HeuristicEval::seeded(seed),
            (true, None) => HeuristicEval::from_entropy(),
        }
    }
}

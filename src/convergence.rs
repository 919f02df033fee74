//! Stopping policy for the round loop.
//!
//! The engine only exposes `root_win_rate` after each round; deciding when the estimate
//! is good enough lives here.

use crate::mcts::MonteCarloTreeSearch;
use crate::random::RandomGenerator;
use serde::Serialize;
use tracing::{debug, info};

/// When to stop running rounds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvergencePolicy {
    /// Stop once two consecutive root win rates differ by less than this.
    pub threshold: f64,
    /// Never stop before this many rounds.
    pub min_rounds: u32,
    /// Always stop after this many rounds.
    pub max_rounds: u32,
}

impl Default for ConvergencePolicy {
    fn default() -> Self {
        Self {
            threshold: 1e-5,
            min_rounds: 100,
            max_rounds: 200_000,
        }
    }
}

/// Tracks successive root win rate readings.
///
/// A reading of exactly 0 or 1 says nothing about convergence (the first rounds of a
/// search produce them naturally and repeat them exactly), so it clears the previous
/// reading instead of being compared.
#[derive(Debug, Clone)]
pub struct ConvergenceMonitor {
    threshold: f64,
    previous: Option<f64>,
}

impl ConvergenceMonitor {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            previous: None,
        }
    }

    /// Records a reading and returns `true` if it is within the threshold of the last one.
    pub fn observe(&mut self, rate: f64) -> bool {
        if rate == 0.0 || rate == 1.0 {
            self.previous = None;
            return false;
        }

        match self.previous.replace(rate) {
            Some(previous) => (rate - previous).abs() < self.threshold,
            None => false,
        }
    }

    pub fn previous(&self) -> Option<f64> {
        self.previous
    }
}

/// Result of [`run_to_convergence`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchReport {
    /// Rounds run by this call.
    pub rounds: u32,
    pub root_win_rate: f64,
    /// `false` when the round budget ran out or the root was already decided.
    pub converged: bool,
    pub principal_move: Option<usize>,
}

/// Runs rounds until the root win rate settles or the round budget is spent.
pub fn run_to_convergence<K: RandomGenerator>(
    mcts: &mut MonteCarloTreeSearch<K>,
    policy: &ConvergencePolicy,
) -> SearchReport {
    let mut monitor = ConvergenceMonitor::new(policy.threshold);
    let mut rounds = 0;
    let mut converged = false;

    if mcts.get_root().value().is_terminal() {
        debug!("root position is terminal, skipping search");
    } else {
        while rounds < policy.max_rounds {
            mcts.advance();
            rounds += 1;
            let settled = monitor.observe(mcts.root_win_rate());
            if settled && rounds >= policy.min_rounds {
                converged = true;
                break;
            }
        }
    }

    let report = SearchReport {
        rounds,
        root_win_rate: mcts.root_win_rate(),
        converged,
        principal_move: mcts.principal_move(),
    };
    info!(
        rounds = report.rounds,
        converged = report.converged,
        root_win_rate = report.root_win_rate,
        principal_move = ?report.principal_move,
        "search finished"
    );
    report
}

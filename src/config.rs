//! Search configuration.

use crate::board::GameOutcome;
use serde::Serialize;

/// Exploration constant used by UCB1 unless configured otherwise.
pub const DEFAULT_EXPLORATION_CONSTANT: f64 = std::f64::consts::SQRT_2;

/// Maps a finished game onto the reward credited to player A.
///
/// The default scores only an outright win for A; draws count the same as losses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RewardPolicy {
    /// Reward for `GameOutcome::WinA`.
    pub win: f64,
    /// Reward for `GameOutcome::Draw`.
    pub draw: f64,
    /// Reward for `GameOutcome::WinB`.
    pub loss: f64,
}

impl Default for RewardPolicy {
    fn default() -> Self {
        Self {
            win: 1.0,
            draw: 0.0,
            loss: 0.0,
        }
    }
}

impl RewardPolicy {
    /// Scores a draw as half a win.
    pub fn draw_as_half() -> Self {
        Self {
            draw: 0.5,
            ..Self::default()
        }
    }

    /// Returns the reward for a finished game, or `None` while it is still ongoing.
    pub fn reward(&self, outcome: GameOutcome) -> Option<f64> {
        match outcome {
            GameOutcome::WinA => Some(self.win),
            GameOutcome::WinB => Some(self.loss),
            GameOutcome::Draw => Some(self.draw),
            GameOutcome::Ongoing => None,
        }
    }

    /// Every reward must lie in `[0, 1]` so that a node's wins never exceed its visits.
    pub fn is_valid(&self) -> bool {
        [self.win, self.draw, self.loss]
            .iter()
            .all(|r| (0.0..=1.0).contains(r))
    }
}

/// Whose point of view the exploitation term of UCB1 takes during selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SelectionPerspective {
    /// Every node ranks its children by player A's win rate, whoever is to move.
    #[default]
    PlayerA,
    /// A node where B is to move ranks its children by `1 - win rate`, so each side
    /// descends towards its own best replies.
    PlayerToMove,
}

/// Configuration for Monte Carlo Tree Search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MctsConfig {
    /// `C` in the UCB1 formula. Higher values favour exploration.
    pub exploration_constant: f64,

    /// How finished rollouts are scored.
    pub reward: RewardPolicy,

    /// Whose win rate selection maximizes.
    pub selection: SelectionPerspective,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            exploration_constant: DEFAULT_EXPLORATION_CONSTANT,
            reward: RewardPolicy::default(),
            selection: SelectionPerspective::default(),
        }
    }
}

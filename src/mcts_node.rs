use crate::board::{Board, GameOutcome};
use crate::config::DEFAULT_EXPLORATION_CONSTANT;

/// Represents a single node in the Monte Carlo search tree.
///
/// Each node stores the position it stands for, the statistics gathered by rollouts
/// through it, and the column that led to it from its parent.
#[derive(Debug, Clone)]
pub struct MctsNode {
    /// The depth of the node in the tree; the root is at depth 0.
    pub depth: usize,
    /// The position this node represents.
    pub board: Board,
    /// The column played to reach this node from its parent. `None` for the root node.
    pub column: Option<usize>,
    /// The outcome of `board`, computed once at creation.
    pub outcome: GameOutcome,
    /// The number of rollouts that passed through this node.
    pub visits: u32,
    /// Sum of the rewards credited to player A by those rollouts. Never exceeds `visits`.
    pub wins: f64,
    /// `C` in the UCB1 formula used when ranking this node's children.
    pub exploration_constant: f64,
}

impl MctsNode {
    /// Creates a root node for the given position.
    pub fn new(board: Board, exploration_constant: f64) -> Self {
        let outcome = board.evaluate_outcome();
        MctsNode {
            depth: 0,
            board,
            column: None,
            outcome,
            visits: 0,
            wins: 0.0,
            exploration_constant,
        }
    }

    /// Creates an unvisited child reached by playing `column` from `parent`.
    pub fn new_child(parent: &MctsNode, column: usize, board: Board) -> Self {
        MctsNode {
            depth: parent.depth + 1,
            column: Some(column),
            ..MctsNode::new(board, parent.exploration_constant)
        }
    }

    /// Calculates the win rate of this node.
    pub fn win_rate(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.wins / f64::from(self.visits)
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome.is_terminal()
    }

    /// Calculates the UCB1 (Upper Confidence Bound 1) value of a child.
    ///
    /// An unvisited child scores `+inf`, so it is preferred over every visited sibling
    /// and the logarithm/division below is never evaluated for it.
    pub fn ucb_value(
        parent_visits: u32,
        child_wins: f64,
        child_visits: u32,
        exploration_constant: f64,
    ) -> f64 {
        if child_visits == 0 {
            return f64::INFINITY;
        }

        let visits = f64::from(child_visits);
        child_wins / visits
            + exploration_constant * f64::sqrt(f64::ln(f64::from(parent_visits)) / visits)
    }
}

impl Default for MctsNode {
    fn default() -> Self {
        MctsNode::new(Board::default(), DEFAULT_EXPLORATION_CONSTANT)
    }
}

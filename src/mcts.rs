use crate::board::{Board, GameOutcome};
use crate::config::{MctsConfig, RewardPolicy, SelectionPerspective};
use crate::mcts_node::MctsNode;
use crate::random::{RandomGenerator, StandardRandomGenerator};
use crate::tree::{SearchTree, TreeDump};
use ego_tree::{NodeId, NodeRef};
use serde::Serialize;
use tracing::{debug, trace};

/// The main struct for running the Monte Carlo Tree Search algorithm.
///
/// It holds the persistent search tree, the random number generator used by rollouts,
/// and the configuration of the search. Statistics accumulate across rounds.
pub struct MonteCarloTreeSearch<K: RandomGenerator> {
    tree: SearchTree,
    random: K,
    config: MctsConfig,
    next_action: MctsAction,
}

/// A builder for creating instances of `MonteCarloTreeSearch`.
pub struct MonteCarloTreeSearchBuilder<K: RandomGenerator> {
    board: Board,
    random_generator: K,
    config: MctsConfig,
}

impl MonteCarloTreeSearchBuilder<StandardRandomGenerator> {
    /// Creates a new builder for the given position, using the thread-local generator.
    pub fn new(board: Board) -> Self {
        Self {
            board,
            random_generator: StandardRandomGenerator,
            config: MctsConfig::default(),
        }
    }
}

impl<K: RandomGenerator> MonteCarloTreeSearchBuilder<K> {
    /// Sets the random number generator used by rollouts.
    pub fn with_random_generator<R: RandomGenerator>(
        self,
        random_generator: R,
    ) -> MonteCarloTreeSearchBuilder<R> {
        MonteCarloTreeSearchBuilder {
            board: self.board,
            random_generator,
            config: self.config,
        }
    }

    /// Sets `C` in the UCB1 formula.
    pub fn with_exploration_constant(mut self, exploration_constant: f64) -> Self {
        self.config.exploration_constant = exploration_constant;
        self
    }

    /// Sets how finished rollouts are scored.
    pub fn with_reward_policy(mut self, reward: RewardPolicy) -> Self {
        self.config.reward = reward;
        self
    }

    /// Sets whose win rate selection maximizes.
    pub fn with_selection_perspective(mut self, selection: SelectionPerspective) -> Self {
        self.config.selection = selection;
        self
    }

    /// Replaces the whole configuration.
    pub fn with_config(mut self, config: MctsConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the `MonteCarloTreeSearch` instance with the configured parameters.
    ///
    /// # Panics
    ///
    /// Panics if the reward policy maps an outcome outside `[0, 1]`.
    pub fn build(self) -> MonteCarloTreeSearch<K> {
        MonteCarloTreeSearch::new(self.board, self.random_generator, self.config)
    }
}

impl MonteCarloTreeSearch<StandardRandomGenerator> {
    /// Returns a new builder for `MonteCarloTreeSearch`.
    pub fn builder(board: Board) -> MonteCarloTreeSearchBuilder<StandardRandomGenerator> {
        MonteCarloTreeSearchBuilder::new(board)
    }

    /// Creates a search with the default configuration and an unseeded generator.
    pub fn from_board(board: Board) -> Self {
        MonteCarloTreeSearchBuilder::new(board).build()
    }
}

impl<K: RandomGenerator> MonteCarloTreeSearch<K> {
    /// Creates a new `MonteCarloTreeSearch` instance.
    ///
    /// It is recommended to use the builder pattern via `MonteCarloTreeSearch::builder()` instead.
    ///
    /// # Panics
    ///
    /// Panics if the reward policy maps an outcome outside `[0, 1]`, since a node's
    /// wins would then outgrow its visits.
    pub fn new(board: Board, random: K, config: MctsConfig) -> Self {
        assert!(
            config.reward.is_valid(),
            "reward policy must map every outcome into [0, 1]"
        );
        let tree = SearchTree::new(board, config.exploration_constant)
            .with_perspective(config.selection);
        let next_action = if tree.root().value().is_terminal() {
            MctsAction::RootIsTerminal
        } else {
            MctsAction::Selection {
                start: tree.root_id(),
            }
        };

        Self {
            tree,
            random,
            config,
            next_action,
        }
    }

    /// Returns an immutable reference to the underlying search tree.
    pub fn get_tree(&self) -> &SearchTree {
        &self.tree
    }

    /// Returns a reference to the root node of the search tree.
    pub fn get_root(&self) -> NodeRef<'_, MctsNode> {
        self.tree.root()
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    /// Returns the next MCTS action to be performed. Useful for debugging and visualization.
    pub fn get_next_mcts_action(&self) -> &MctsAction {
        &self.next_action
    }

    /// Executes a single phase of a round (Selection, Expansion, Simulation or
    /// Backpropagation).
    pub fn execute_action(&mut self) {
        self.next_action = match self.next_action {
            MctsAction::Selection { start } => {
                let leaf = self.select(start);
                match self.tree.get(leaf).map(|node| node.value()) {
                    Some(node) if !node.is_terminal() && node.visits > 0 => {
                        MctsAction::Expansion { leaf }
                    }
                    _ => MctsAction::Simulation { leaf },
                }
            }
            MctsAction::Expansion { leaf } => {
                self.tree.expand(leaf);
                MctsAction::Simulation {
                    leaf: self.select(leaf),
                }
            }
            MctsAction::Simulation { leaf } => MctsAction::Backpropagation {
                leaf,
                outcome: self.simulate(leaf),
            },
            MctsAction::Backpropagation { leaf, outcome } => {
                let reward = self.config.reward.reward(outcome).unwrap_or_default();
                let branch = self.tree.backpropagate(leaf, reward);
                trace!(
                    depth = branch.len() - 1,
                    ?outcome,
                    reward,
                    root_win_rate = self.root_win_rate(),
                    "MCTS round complete"
                );
                MctsAction::Selection {
                    start: self.tree.root_id(),
                }
            }
            MctsAction::RootIsTerminal => MctsAction::RootIsTerminal,
        };
    }

    /// Performs one full round: selection, expansion when due, simulation and
    /// backpropagation. Does nothing when the root position is already decided.
    pub fn advance(&mut self) {
        if self.next_action == MctsAction::RootIsTerminal {
            debug!("root position is terminal, nothing to search");
            return;
        }

        self.execute_action();
        while !matches!(
            self.next_action,
            MctsAction::Selection { .. } | MctsAction::RootIsTerminal
        ) {
            self.execute_action();
        }
    }

    /// Runs `n` rounds.
    pub fn iterate_n_times(&mut self, n: u32) {
        for _ in 0..n {
            self.advance();
        }
    }

    /// Share of rollouts through the root that were credited to player A.
    pub fn root_win_rate(&self) -> f64 {
        self.tree.root().value().win_rate()
    }

    pub fn root_visits(&self) -> u32 {
        self.tree.root().value().visits
    }

    /// The root child with the most visits, ties going to the lowest column.
    /// `None` until the root has been expanded.
    pub fn principal_move(&self) -> Option<usize> {
        let mut best: Option<&MctsNode> = None;
        for child in self.tree.root().children() {
            let node = child.value();
            if best.is_none_or(|b| node.visits > b.visits) {
                best = Some(node);
            }
        }
        best.and_then(|node| node.column)
    }

    /// Column, visits and win rate of every root child.
    pub fn move_statistics(&self) -> Vec<MoveStatistics> {
        self.tree
            .root()
            .children()
            .filter_map(|child| {
                let node = child.value();
                Some(MoveStatistics {
                    column: node.column?,
                    visits: node.visits,
                    win_rate: node.win_rate(),
                })
            })
            .collect()
    }

    /// Depth-bounded snapshot of the tree for debugging.
    pub fn dump_tree(&self, max_depth: usize) -> TreeDump {
        self.tree.dump(max_depth)
    }

    /// Descends from `start` along the best UCB1 children until reaching a node that is
    /// childless, terminal or not yet visited.
    fn select(&self, start: NodeId) -> NodeId {
        let mut current = start;
        while let Some(node) = self.tree.get(current) {
            let value = node.value();
            if value.visits == 0 || value.is_terminal() {
                break;
            }
            match self.tree.select_child(current) {
                Some(child) => current = child,
                None => break,
            }
        }
        current
    }

    /// Plays uniformly random moves from the node's position until the game ends.
    /// The side to move on the node's board plays first, so the empty root starts
    /// with A. The intermediate boards are never attached to the tree.
    fn simulate(&mut self, id: NodeId) -> GameOutcome {
        let Some(node) = self.tree.get(id) else {
            return GameOutcome::Draw;
        };
        let mut board = node.value().board.clone();
        let mut outcome = node.value().outcome;

        while outcome == GameOutcome::Ongoing {
            let moves = board.playable_columns();
            let Some(&column) = self.random.choose(&moves) else {
                break;
            };
            board = board.play(column);
            outcome = board.evaluate_outcome();
        }
        outcome
    }
}

/// Statistics of one candidate move at the root.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveStatistics {
    pub column: usize,
    pub visits: u32,
    pub win_rate: f64,
}

/// Represents the phases of a single MCTS round.
///
/// Holds the phase that `execute_action` will run next.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum MctsAction {
    /// **Selection**: descend from `start` to the most promising leaf.
    Selection {
        /// Where the descent begins; always the root between rounds.
        start: NodeId,
    },
    /// **Expansion**: attach the successors of an already visited leaf.
    Expansion {
        /// The leaf to be expanded.
        leaf: NodeId,
    },
    /// **Simulation**: play a random game out from `leaf`.
    Simulation {
        /// The node the rollout starts from.
        leaf: NodeId,
    },
    /// **Backpropagation**: credit the rollout result from `leaf` up to the root.
    Backpropagation {
        /// The node the rollout started from.
        leaf: NodeId,
        /// How the rollout ended.
        outcome: GameOutcome,
    },
    /// The root position is already decided; rounds are no-ops.
    RootIsTerminal,
}

impl MctsAction {
    /// Returns the name of the current MCTS action as a string.
    pub fn get_name(&self) -> &'static str {
        match self {
            MctsAction::Selection { .. } => "Selection",
            MctsAction::Expansion { .. } => "Expansion",
            MctsAction::Simulation { .. } => "Simulation",
            MctsAction::Backpropagation { .. } => "Backpropagation",
            MctsAction::RootIsTerminal => "RootIsTerminal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SeededRandomGenerator;

    fn seeded(board: Board, seed: u64) -> MonteCarloTreeSearch<SeededRandomGenerator> {
        MonteCarloTreeSearch::builder(board)
            .with_random_generator(SeededRandomGenerator::new(seed))
            .build()
    }

    #[test]
    fn first_round_only_rolls_out_the_root() {
        // arrange
        let mut mcts = seeded(Board::new(), 1);

        // act
        mcts.advance();

        // assert
        let rate = mcts.root_win_rate();
        assert!(rate == 0.0 || rate == 1.0);
        assert_eq!(mcts.root_visits(), 1);
        assert_eq!(mcts.get_tree().len(), 1);
        assert_eq!(mcts.principal_move(), None);
    }

    #[test]
    fn second_round_expands_root_and_visits_lowest_column() {
        let mut mcts = seeded(Board::new(), 2);

        mcts.iterate_n_times(2);

        assert_eq!(mcts.get_tree().len(), 8);
        let visits: Vec<u32> = mcts.move_statistics().iter().map(|s| s.visits).collect();
        assert_eq!(visits, vec![1, 0, 0, 0, 0, 0, 0]);
        assert_eq!(mcts.principal_move(), Some(0));
    }

    #[test]
    fn every_child_is_tried_before_any_is_revisited() {
        let mut mcts = seeded(Board::new(), 3);

        mcts.iterate_n_times(8);

        assert!(mcts.move_statistics().iter().all(|s| s.visits == 1));
    }

    #[test]
    fn phases_run_in_order() {
        let mut mcts = seeded(Board::new(), 4);
        mcts.advance();

        let mut names = Vec::new();
        loop {
            names.push(mcts.get_next_mcts_action().get_name());
            mcts.execute_action();
            if matches!(mcts.get_next_mcts_action(), MctsAction::Selection { .. }) {
                break;
            }
        }
        assert_eq!(
            names,
            vec!["Selection", "Expansion", "Simulation", "Backpropagation"]
        );
    }

    #[test]
    fn terminal_root_is_a_no_op() {
        let board = Board::from_moves(&[0, 1, 0, 1, 0, 1, 0]).unwrap();
        let mut mcts = seeded(board, 5);

        mcts.iterate_n_times(10);

        assert_eq!(mcts.get_next_mcts_action(), &MctsAction::RootIsTerminal);
        assert_eq!(mcts.root_visits(), 0);
        assert_eq!(mcts.root_win_rate(), 0.0);
        assert_eq!(mcts.get_tree().len(), 1);
    }

    #[test]
    fn root_visits_grow_by_one_per_round() {
        let mut mcts = seeded(Board::new(), 6);
        for round in 1..=300 {
            mcts.advance();
            assert_eq!(mcts.root_visits(), round);
            let root = mcts.get_root();
            assert!(root.value().wins <= f64::from(root.value().visits));
        }
    }

    #[test]
    fn same_seed_same_statistics() {
        let mut first = seeded(Board::new(), 99);
        let mut second = seeded(Board::new(), 99);

        first.iterate_n_times(500);
        second.iterate_n_times(500);

        assert_eq!(first.root_win_rate(), second.root_win_rate());
        assert_eq!(first.move_statistics(), second.move_statistics());
        assert_eq!(first.get_tree().len(), second.get_tree().len());
    }

    #[test]
    fn finds_immediate_win() {
        // A has three stacked in column 2 and moves next
        let board = Board::from_moves(&[2, 5, 2, 5, 2, 6]).unwrap();
        let mut mcts = MonteCarloTreeSearch::builder(board)
            .with_random_generator(SeededRandomGenerator::new(7))
            .with_selection_perspective(SelectionPerspective::PlayerToMove)
            .build();

        mcts.iterate_n_times(3000);

        assert_eq!(mcts.principal_move(), Some(2));
    }

    #[test]
    fn draws_score_half_with_half_policy() {
        // one empty cell left; filling it draws
        let board = Board::from_rows(&[
            [1u8, 1, 2, 2, 1, 1, 0],
            [2, 2, 1, 1, 2, 2, 1],
            [1, 1, 2, 2, 1, 1, 2],
            [2, 2, 1, 1, 2, 2, 1],
            [1, 1, 2, 2, 1, 1, 2],
            [2, 2, 1, 1, 2, 2, 1],
        ])
        .unwrap();
        let mut literal = seeded(board.clone(), 8);
        let mut half = MonteCarloTreeSearch::builder(board)
            .with_random_generator(SeededRandomGenerator::new(8))
            .with_reward_policy(RewardPolicy::draw_as_half())
            .build();

        literal.iterate_n_times(5);
        half.iterate_n_times(5);

        assert_eq!(literal.root_win_rate(), 0.0);
        assert_eq!(half.root_win_rate(), 0.5);
    }

    #[test]
    #[should_panic(expected = "reward policy")]
    fn rewards_above_one_are_rejected() {
        let _ = MonteCarloTreeSearch::builder(Board::new())
            .with_reward_policy(RewardPolicy {
                win: 2.0,
                draw: 0.0,
                loss: 0.0,
            })
            .build();
    }

    #[test]
    #[should_panic(expected = "reward policy")]
    fn invalid_config_is_rejected() {
        let config = MctsConfig {
            reward: RewardPolicy {
                win: 1.0,
                draw: 0.5,
                loss: -1.0,
            },
            ..MctsConfig::default()
        };
        let _ = MonteCarloTreeSearch::builder(Board::new())
            .with_config(config)
            .build();
    }

    #[test]
    fn full_rewards_keep_wins_within_visits() {
        // every outcome scores 1, the largest reward a valid policy allows
        let mut mcts = MonteCarloTreeSearch::builder(Board::new())
            .with_random_generator(SeededRandomGenerator::new(12))
            .with_reward_policy(RewardPolicy {
                win: 1.0,
                draw: 1.0,
                loss: 1.0,
            })
            .build();

        mcts.iterate_n_times(200);

        assert_eq!(mcts.root_visits(), 200);
        for node in mcts.get_tree().inner().nodes() {
            let stats = node.value();
            assert!(stats.wins <= f64::from(stats.visits));
        }
        assert_eq!(mcts.root_win_rate(), 1.0);
    }
}

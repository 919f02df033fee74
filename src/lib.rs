//! Monte Carlo tree search evaluation of four-in-a-row positions.
//!
//! The search runs rounds of selection (UCB1), expansion, random rollout and
//! backpropagation against a tree that persists between rounds. After any round the
//! root win rate is an estimate of player A's chances from the evaluated position, and
//! the most visited root child is the recommended move.
//!
//! # Example
//!
//! ```rust
//! use connect4_mcts::board::Board;
//! use connect4_mcts::mcts::MonteCarloTreeSearch;
//! use connect4_mcts::random::SeededRandomGenerator;
//!
//! // Position after A plays the centre column
//! let board = Board::from_moves(&[3]).unwrap();
//!
//! let mut mcts = MonteCarloTreeSearch::builder(board)
//!     .with_random_generator(SeededRandomGenerator::new(42))
//!     .build();
//!
//! mcts.iterate_n_times(1000);
//!
//! assert_eq!(mcts.root_visits(), 1000);
//! println!("A wins {:.1}% of rollouts", mcts.root_win_rate() * 100.0);
//! println!("B should answer in column {:?}", mcts.principal_move());
//! ```

/// The board model: grid, outcome detection, legal moves and move application.
pub mod board;
/// Search configuration and the reward policy.
pub mod config;
/// Stopping policy for running rounds until the estimate settles.
pub mod convergence;
/// The core module of the library, containing the `MonteCarloTreeSearch` implementation.
pub mod mcts;
/// Contains the `MctsNode` struct, which represents a node in the search tree.
pub mod mcts_node;
/// Contains traits and implementations for random number generation.
pub mod random;
/// Named sample positions.
pub mod samples;
/// The persistent search tree.
pub mod tree;

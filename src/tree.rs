//! The persistent search tree.
//!
//! Nodes live in an `ego_tree` arena. A parent owns its children; the parent link of a
//! node is only an id lookup used to walk back to the root, and no node is ever removed,
//! so ids handed out by this tree stay valid for its whole life.

use crate::board::{Board, Player};
use crate::config::SelectionPerspective;
use crate::mcts_node::MctsNode;
use ego_tree::{NodeId, NodeRef, Tree};
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Search tree rooted at the position under evaluation.
#[derive(Debug, Clone)]
pub struct SearchTree {
    tree: Tree<MctsNode>,
    perspective: SelectionPerspective,
}

impl SearchTree {
    /// Creates a tree holding only an unvisited root for `board`.
    pub fn new(board: Board, exploration_constant: f64) -> Self {
        Self {
            tree: Tree::new(MctsNode::new(board, exploration_constant)),
            perspective: SelectionPerspective::default(),
        }
    }

    /// Sets whose win rate `select_child` maximizes.
    pub fn with_perspective(mut self, perspective: SelectionPerspective) -> Self {
        self.perspective = perspective;
        self
    }

    pub fn root_id(&self) -> NodeId {
        self.tree.root().id()
    }

    pub fn root(&self) -> NodeRef<'_, MctsNode> {
        self.tree.root()
    }

    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_, MctsNode>> {
        self.tree.get(id)
    }

    /// Returns the underlying arena.
    pub fn inner(&self) -> &Tree<MctsNode> {
        &self.tree
    }

    /// Number of nodes in the tree. Never zero: the root always exists.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.tree.nodes().count()
    }

    /// UCB1 score of every child of `id`, in child order.
    pub fn ucb_scores(&self, id: NodeId) -> Vec<f64> {
        let Some(node) = self.tree.get(id) else {
            return Vec::new();
        };
        let parent = node.value();
        let flip = self.perspective == SelectionPerspective::PlayerToMove
            && parent.board.to_move() == Player::B;
        node.children()
            .map(|child| {
                let child = child.value();
                let wins = if flip {
                    f64::from(child.visits) - child.wins
                } else {
                    child.wins
                };
                MctsNode::ucb_value(
                    parent.visits,
                    wins,
                    child.visits,
                    parent.exploration_constant,
                )
            })
            .collect()
    }

    /// Child of `id` with the highest UCB1 score. Ties go to the earliest child, which is
    /// the lowest column.
    pub fn select_child(&self, id: NodeId) -> Option<NodeId> {
        let node = self.tree.get(id)?;
        let mut best: Option<(NodeId, f64)> = None;
        for (child, score) in node.children().zip(self.ucb_scores(id)) {
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((child.id(), score));
            }
        }
        best.map(|(child_id, _)| child_id)
    }

    /// Finds a child of `id` whose position equals `board`.
    pub fn find_child_by_board(&self, id: NodeId, board: &Board) -> Option<NodeId> {
        self.tree
            .get(id)?
            .children()
            .find(|child| child.value().board == *board)
            .map(|child| child.id())
    }

    /// Attaches one child per legal column of `id`'s position and returns how many were
    /// created. Successors that already exist are skipped, so expanding twice is a no-op.
    pub fn expand(&mut self, id: NodeId) -> usize {
        let Some(node) = self.tree.get(id) else {
            return 0;
        };
        let parent = node.value();
        if parent.is_terminal() {
            return 0;
        }

        let new_children: Vec<MctsNode> = parent
            .board
            .legal_moves()
            .into_iter()
            .map(|column| (column, parent.board.play(column)))
            .filter(|(_, board)| self.find_child_by_board(id, board).is_none())
            .map(|(column, board)| MctsNode::new_child(parent, column, board))
            .collect();

        let created = new_children.len();
        if let Some(mut node) = self.tree.get_mut(id) {
            for child in new_children {
                node.append(child);
            }
        }
        debug!(node = ?id, created, "expanded node");
        created
    }

    /// Credits `reward` and one visit to `id` and every ancestor up to the root.
    /// Returns the updated path, leaf first.
    pub fn backpropagate(&mut self, id: NodeId, reward: f64) -> Vec<NodeId> {
        let Some(leaf) = self.tree.get(id) else {
            return Vec::new();
        };
        let branch: Vec<NodeId> = std::iter::once(leaf.id())
            .chain(leaf.ancestors().map(|ancestor| ancestor.id()))
            .collect();

        for node_id in &branch {
            if let Some(mut node) = self.tree.get_mut(*node_id) {
                let stats = node.value();
                stats.visits += 1;
                stats.wins += reward;
            }
        }
        branch
    }

    /// Lists every node down to `max_depth` (the root being depth 0) in pre-order.
    pub fn dump(&self, max_depth: usize) -> TreeDump {
        let mut entries = Vec::new();
        let mut stack = vec![self.tree.root()];
        while let Some(node) = stack.pop() {
            let value = node.value();
            entries.push(DumpEntry {
                depth: value.depth,
                column: value.column,
                visits: value.visits,
                win_rate: value.win_rate(),
                board: value.board.to_lines(),
            });
            if value.depth < max_depth {
                let children: Vec<_> = node.children().collect();
                stack.extend(children.into_iter().rev());
            }
        }
        TreeDump { entries }
    }
}

/// One node in a [`TreeDump`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DumpEntry {
    pub depth: usize,
    pub column: Option<usize>,
    pub visits: u32,
    pub win_rate: f64,
    /// Rendered rows, top row first.
    pub board: Vec<String>,
}

/// Depth-bounded snapshot of the tree, for debugging only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeDump {
    pub entries: Vec<DumpEntry>,
}

impl fmt::Display for TreeDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            let indent = "  ".repeat(entry.depth);
            let column = entry
                .column
                .map_or_else(|| "root".to_string(), |c| format!("col {c}"));
            writeln!(
                f,
                "{indent}[depth {}] {column}: {:.4} win rate over {} visits",
                entry.depth, entry.win_rate, entry.visits
            )?;
            for line in &entry.board {
                writeln!(f, "{indent}  {line}")?;
            }
        }
        Ok(())
    }
}

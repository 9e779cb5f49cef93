//! Search node and edge structures.
//!
//! Uses arena allocation with index references (`NodeId`), like the tree
//! that owns them. A node is one (state, action-taken-to-reach-it, depth)
//! triple.

use smallvec::SmallVec;

use crate::core::{Action, PlayerId};

/// Index into the `SearchTree` node arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Sentinel value representing no node.
    pub const NONE: NodeId = NodeId(u32::MAX);

    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Check if this is the NONE sentinel.
    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_none() {
            write!(f, "NodeId(NONE)")
        } else {
            write!(f, "NodeId({})", self.0)
        }
    }
}

/// A candidate action out of a node, expanded or not.
#[derive(Clone, Debug)]
pub struct Edge {
    /// The action this edge represents.
    pub action: Action,

    /// Prior weight, renormalised over the node's candidates.
    pub prior: f32,

    /// Child node (NONE until the action has been simulated).
    pub child: NodeId,
}

impl Edge {
    pub fn new(action: Action, prior: f32) -> Self {
        Self {
            action,
            prior,
            child: NodeId::NONE,
        }
    }

    #[must_use]
    pub fn is_expanded(&self) -> bool {
        !self.child.is_none()
    }
}

/// A node in the search tree.
#[derive(Clone, Debug)]
pub struct SearchNode<S> {
    /// Parent node (NONE for the root).
    pub parent: NodeId,

    /// Action that led here (`None` only for the root).
    pub action: Option<Action>,

    /// Depth in tree (root = 0, always parent + 1).
    pub depth: u16,

    /// The simulated state. Never mutated once stored.
    pub state: S,

    /// Seat to move in `state`.
    pub to_move: PlayerId,

    /// Immediate reward to the searching seat for the transition into this
    /// node.
    pub reward: f64,

    /// The node's own evaluation: evaluator value, or the terminal outcome.
    pub own_value: f64,

    /// Current estimate: `own_value` until children exist, then the
    /// discounted combination of their estimates.
    pub value: f64,

    /// Rollouts that passed through this node.
    pub visits: u32,

    /// Is this a terminal game state?
    pub terminal: bool,

    /// Nothing left to expand anywhere below this node.
    pub complete: bool,

    /// Candidate actions. SmallVec fits the usual branching cap inline.
    pub edges: SmallVec<[Edge; 4]>,
}

impl<S> SearchNode<S> {
    /// Create the decision root. It holds the real state and no action.
    pub fn root(state: S, to_move: PlayerId) -> Self {
        Self {
            parent: NodeId::NONE,
            action: None,
            depth: 0,
            state,
            to_move,
            reward: 0.0,
            own_value: 0.0,
            value: 0.0,
            visits: 0,
            terminal: false,
            complete: false,
            edges: SmallVec::new(),
        }
    }

    /// Create a child reached from `parent` (at `parent_depth`) by `action`.
    pub fn child(
        parent: NodeId,
        parent_depth: u16,
        action: Action,
        state: S,
        to_move: PlayerId,
        reward: f64,
    ) -> Self {
        Self {
            parent,
            action: Some(action),
            depth: parent_depth + 1,
            state,
            to_move,
            reward,
            own_value: 0.0,
            value: 0.0,
            visits: 0,
            terminal: false,
            complete: false,
            edges: SmallVec::new(),
        }
    }

    /// Record the node's own evaluation; it is also the initial estimate.
    pub fn set_evaluation(&mut self, value: f64) {
        self.own_value = value;
        self.value = value;
    }

    /// Check if any edge has been expanded.
    #[must_use]
    pub fn has_children(&self) -> bool {
        self.edges.iter().any(Edge::is_expanded)
    }

    /// Iterate over (edge index, edge) pairs that have a child.
    pub fn expanded_edges(&self) -> impl Iterator<Item = (usize, &Edge)> + '_ {
        self.edges.iter().enumerate().filter(|(_, e)| e.is_expanded())
    }
}

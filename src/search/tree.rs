//! Arena-based search tree.
//!
//! A flat `Vec<SearchNode<S>>` with `NodeId` indices. One tree is owned by
//! one candidate lane for the length of a decision and moves between the
//! coordinator and workers by value, never shared.

use crate::core::PlayerId;

use super::node::{NodeId, SearchNode};

/// Arena-based search tree for one root candidate.
#[derive(Clone, Debug)]
pub struct SearchTree<S> {
    nodes: Vec<SearchNode<S>>,
    root: NodeId,
    /// The seat the search decides for. Its nodes take the max over
    /// children; every other seat's nodes take the prior-weighted mean.
    searcher: PlayerId,
}

impl<S> SearchTree<S> {
    /// Create a tree holding only the decision root.
    pub fn new(root_state: S, to_move: PlayerId, searcher: PlayerId) -> Self {
        let mut nodes = Vec::with_capacity(256);
        nodes.push(SearchNode::root(root_state, to_move));
        Self {
            nodes,
            root: NodeId::new(0),
            searcher,
        }
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[inline]
    #[must_use]
    pub fn searcher(&self) -> PlayerId {
        self.searcher
    }

    /// Get a node by ID.
    #[inline]
    #[must_use]
    pub fn get(&self, id: NodeId) -> &SearchNode<S> {
        &self.nodes[id.0 as usize]
    }

    /// Get a mutable node by ID.
    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut SearchNode<S> {
        &mut self.nodes[id.0 as usize]
    }

    /// Allocate `node` as the child behind `parent`'s edge `edge_idx`.
    pub fn attach(&mut self, parent: NodeId, edge_idx: usize, node: SearchNode<S>) -> NodeId {
        debug_assert_eq!(node.depth, self.get(parent).depth + 1);
        let id = NodeId::new(self.nodes.len() as u32);
        self.nodes.push(node);
        self.get_mut(parent).edges[edge_idx].child = id;
        id
    }

    /// Number of nodes in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Recompute one node's estimate and completeness from its children.
    ///
    /// Childless nodes fall back to their own evaluation. Otherwise the
    /// estimate is `reward + gamma * combine(children)`.
    pub fn backup(&mut self, id: NodeId, gamma: f64) {
        let node = self.get(id);
        let complete = node.edges.is_empty()
            || node
                .edges
                .iter()
                .all(|e| e.is_expanded() && self.get(e.child).complete);
        if !node.has_children() {
            let own = node.own_value;
            let node = self.get_mut(id);
            node.value = own;
            node.complete = complete;
            return;
        }

        let combined = if node.to_move == self.searcher {
            node.expanded_edges()
                .map(|(_, e)| self.get(e.child).value)
                .fold(f64::NEG_INFINITY, f64::max)
        } else {
            let mut weighted = 0.0;
            let mut mass = 0.0;
            let mut plain = 0.0;
            let mut count = 0.0;
            for (_, edge) in node.expanded_edges() {
                let value = self.get(edge.child).value;
                weighted += f64::from(edge.prior) * value;
                mass += f64::from(edge.prior);
                plain += value;
                count += 1.0;
            }
            if mass > 0.0 {
                weighted / mass
            } else {
                plain / count
            }
        };

        let value = node.reward + gamma * combined;
        let node = self.get_mut(id);
        node.value = value;
        node.complete = complete;
    }

    /// Iterate over all nodes.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SearchNode<S>)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId::new(i as u32), n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Action, EdgeId};
    use crate::search::node::Edge;

    const ME: PlayerId = PlayerId(0);
    const THEM: PlayerId = PlayerId(1);

    fn road(i: u8) -> Action {
        Action::BuildRoad(EdgeId(i))
    }

    /// root -> a (to_move = mover) with two children valued 1.0 and 3.0,
    /// priors 0.75 / 0.25.
    fn two_child_tree(mover: PlayerId) -> (SearchTree<()>, NodeId) {
        let mut tree = SearchTree::new((), ME, ME);
        let root = tree.root();
        tree.get_mut(root).edges.push(Edge::new(road(0), 1.0));
        let a = tree.attach(root, 0, SearchNode::child(root, 0, road(0), (), mover, 0.5));
        tree.get_mut(a).set_evaluation(10.0);
        tree.get_mut(a).edges.push(Edge::new(road(1), 0.75));
        tree.get_mut(a).edges.push(Edge::new(road(2), 0.25));
        tree.get_mut(a).edges.push(Edge::new(road(3), 0.0));

        let b = tree.attach(a, 0, SearchNode::child(a, 1, road(1), (), ME, 0.0));
        tree.get_mut(b).set_evaluation(1.0);
        let c = tree.attach(a, 1, SearchNode::child(a, 1, road(2), (), ME, 0.0));
        tree.get_mut(c).set_evaluation(3.0);
        (tree, a)
    }

    #[test]
    fn test_tree_new() {
        let tree = SearchTree::new(7u32, THEM, ME);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.root(), NodeId::new(0));
        assert_eq!(tree.get(tree.root()).state, 7);
        assert_eq!(tree.get(tree.root()).to_move, THEM);
        assert_eq!(tree.searcher(), ME);
    }

    #[test]
    fn test_leaf_backup_uses_own_value() {
        let (mut tree, a) = two_child_tree(ME);
        let b = tree.get(a).edges[0].child;
        tree.get_mut(b).value = 99.0;
        tree.backup(b, 0.9);
        assert_eq!(tree.get(b).value, 1.0);
    }

    #[test]
    fn test_backup_max_for_searcher() {
        let (mut tree, a) = two_child_tree(ME);
        tree.backup(a, 0.5);
        // reward 0.5 + 0.5 * max(1, 3)
        assert!((tree.get(a).value - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_backup_expectation_for_other_seats() {
        let (mut tree, a) = two_child_tree(THEM);
        tree.backup(a, 1.0);
        // reward 0.5 + (0.75 * 1 + 0.25 * 3) / 1.0
        assert!((tree.get(a).value - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_completeness_propagates() {
        let (mut tree, a) = two_child_tree(ME);
        let b = tree.get(a).edges[0].child;
        let c = tree.get(a).edges[1].child;
        tree.backup(b, 1.0);
        tree.backup(c, 1.0);
        // leaves without edges are complete, but edge 2 of `a` is unexpanded
        assert!(tree.get(b).complete);
        tree.backup(a, 1.0);
        assert!(!tree.get(a).complete);

        tree.get_mut(a).edges.pop();
        tree.backup(a, 1.0);
        assert!(tree.get(a).complete);
    }

    #[test]
    fn test_iter_visits_every_node() {
        let (tree, _) = two_child_tree(ME);
        let depths: Vec<u16> = tree.iter().map(|(_, n)| n.depth).collect();

        assert_eq!(depths.len(), 4);
        assert_eq!(depths.iter().max(), Some(&2));
        assert!(tree.iter().all(|(id, n)| id == tree.root() || !n.parent.is_none()));
    }
}

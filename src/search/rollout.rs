//! Rollout and expansion engine.
//!
//! Grows one candidate lane's tree. Every rollout walks from the candidate
//! node down through prior-sampled edges, simulating and evaluating each
//! edge the first time it is taken, then backs the new estimates up the
//! path. Edges whose subtrees are complete are skipped, so a finite tree is
//! eventually exhausted instead of resampled.

use std::sync::atomic::{AtomicBool, Ordering};

use log::trace;

use crate::core::{Action, EvaluatorError, GameRng, SearchError};
use crate::rules::{result_to_rewards, RulesEngine};

use super::budget::Deadline;
use super::candidates::{ActionGenerator, Scope};
use super::config::SearchConfig;
use super::evaluator::Evaluator;
use super::node::{Edge, NodeId, SearchNode};
use super::stats::WorkCounters;
use super::tree::SearchTree;

/// The candidate node of a lane tree (NONE before the lane is seeded).
#[must_use]
pub fn candidate_node<S>(tree: &SearchTree<S>) -> NodeId {
    let root = tree.root();
    tree.get(root).edges.first().map_or(NodeId::NONE, |e| e.child)
}

/// Borrowed collaborators for growing lane trees.
pub struct RolloutEngine<'a, R: RulesEngine, E> {
    rules: &'a R,
    evaluator: &'a E,
    config: &'a SearchConfig,
    deadline: Deadline,
    stop: Option<&'a AtomicBool>,
}

impl<'a, R, E> RolloutEngine<'a, R, E>
where
    R: RulesEngine,
    E: Evaluator<R::State>,
{
    pub fn new(rules: &'a R, evaluator: &'a E, config: &'a SearchConfig, deadline: Deadline) -> Self {
        Self {
            rules,
            evaluator,
            config,
            deadline,
            stop: None,
        }
    }

    /// Also stop once `stop` is raised.
    pub fn with_stop(mut self, stop: &'a AtomicBool) -> Self {
        self.stop = Some(stop);
        self
    }

    fn out_of_time(&self) -> bool {
        self.deadline.expired() || self.stop.is_some_and(|s| s.load(Ordering::Relaxed))
    }

    /// Build the lane tree for one root candidate: the decision root plus the
    /// simulated and evaluated candidate node at depth 1.
    pub fn seed_lane(
        &self,
        root_state: &R::State,
        candidate: &Action,
        rng: &mut GameRng,
        counters: &mut WorkCounters,
    ) -> Result<SearchTree<R::State>, SearchError> {
        let searcher = self.rules.to_move(root_state);
        let mut tree = SearchTree::new(root_state.clone(), searcher, searcher);
        let root = tree.root();
        tree.get_mut(root).edges.push(Edge::new(candidate.clone(), 1.0));

        let node = self.expand(&mut tree, root, 0, rng, counters)?;
        tree.backup(node, self.config.gamma);
        tree.backup(root, self.config.gamma);
        Ok(tree)
    }

    /// Run up to `rollouts` rollouts, stopping early at the deadline or when
    /// the tree is complete.
    pub fn run(
        &self,
        tree: &mut SearchTree<R::State>,
        rng: &mut GameRng,
        rollouts: u32,
        counters: &mut WorkCounters,
    ) -> Result<(), SearchError> {
        let candidate = candidate_node(tree);
        if candidate.is_none() {
            return Ok(());
        }
        for _ in 0..rollouts {
            if self.out_of_time() || tree.get(candidate).complete {
                break;
            }
            self.rollout(tree, candidate, rng, counters)?;
        }
        Ok(())
    }

    /// One descent from the candidate node plus backup.
    fn rollout(
        &self,
        tree: &mut SearchTree<R::State>,
        candidate: NodeId,
        rng: &mut GameRng,
        counters: &mut WorkCounters,
    ) -> Result<(), SearchError> {
        let mut path = vec![candidate];
        let mut current = candidate;

        loop {
            let node = tree.get(current);
            if node.complete || node.edges.is_empty() || self.out_of_time() {
                break;
            }
            let Some(edge_idx) = Self::pick_edge(tree, current, rng) else {
                break;
            };
            let child = tree.get(current).edges[edge_idx].child;
            let child = if child.is_none() {
                self.expand(tree, current, edge_idx, rng, counters)?
            } else {
                child
            };
            path.push(child);
            current = child;
        }

        for &id in path.iter().rev() {
            tree.get_mut(id).visits += 1;
            tree.backup(id, self.config.gamma);
        }
        let root = tree.root();
        tree.get_mut(root).visits += 1;
        tree.backup(root, self.config.gamma);

        counters.rollouts += 1;
        Ok(())
    }

    /// Sample an edge by prior among those with work left below them.
    fn pick_edge(tree: &SearchTree<R::State>, id: NodeId, rng: &mut GameRng) -> Option<usize> {
        let node = tree.get(id);
        let open: Vec<bool> = node
            .edges
            .iter()
            .map(|e| !e.is_expanded() || !tree.get(e.child).complete)
            .collect();
        let weights: Vec<f32> = node
            .edges
            .iter()
            .zip(&open)
            .map(|(e, &o)| if o { e.prior } else { 0.0 })
            .collect();

        if let Some(idx) = rng.choose_weighted(&weights) {
            return Some(idx);
        }
        // Zero-prior edges still get explored once the rest are done.
        let open_idx: Vec<usize> = (0..open.len()).filter(|&i| open[i]).collect();
        if open_idx.is_empty() {
            None
        } else {
            Some(open_idx[rng.gen_range_usize(0..open_idx.len())])
        }
    }

    /// Simulate `parent`'s edge `edge_idx`, attach and evaluate the child.
    fn expand(
        &self,
        tree: &mut SearchTree<R::State>,
        parent: NodeId,
        edge_idx: usize,
        rng: &mut GameRng,
        counters: &mut WorkCounters,
    ) -> Result<NodeId, SearchError> {
        let searcher = tree.searcher();
        let parent_node = tree.get(parent);
        let action = parent_node.edges[edge_idx].action.clone();
        let transition = self.rules.apply(&parent_node.state, &action)?;
        let reward = transition.reward(searcher);
        let to_move = self.rules.to_move(&transition.state);

        trace!(
            "expand {} at depth {}: {} (reward {:.3})",
            parent,
            parent_node.depth,
            action,
            reward
        );
        let node = SearchNode::child(
            parent,
            parent_node.depth,
            action,
            transition.state,
            to_move,
            reward,
        );
        let id = tree.attach(parent, edge_idx, node);
        counters.nodes_expanded += 1;
        counters.max_depth = counters.max_depth.max(tree.get(id).depth);

        self.evaluate(tree, id, rng, counters)?;
        Ok(id)
    }

    /// Give a fresh node its own value and, below the depth limit, its
    /// candidate edges.
    fn evaluate(
        &self,
        tree: &mut SearchTree<R::State>,
        id: NodeId,
        rng: &mut GameRng,
        counters: &mut WorkCounters,
    ) -> Result<(), SearchError> {
        let searcher = tree.searcher();
        let node = tree.get(id);

        if let Some(result) = self.rules.is_terminal(&node.state) {
            let value = result_to_rewards(&result, self.rules.player_count())[searcher];
            let node = tree.get_mut(id);
            node.terminal = true;
            node.complete = true;
            node.set_evaluation(value);
            return Ok(());
        }

        let generator = ActionGenerator::new(self.config);
        let legal = if node.depth >= self.config.effective_max_depth() {
            Vec::new()
        } else {
            match generator.legal(self.rules, &node.state) {
                Ok(legal) => legal,
                // A live state with nothing to do is scored as a leaf.
                Err(SearchError::NoLegalActions { .. }) => Vec::new(),
                Err(err) => return Err(err),
            }
        };

        let eval = self.evaluator.score(&node.state, searcher, &legal)?;
        counters.evaluator_calls += 1;
        if !eval.value.is_finite() {
            return Err(EvaluatorError::NonFiniteValue(eval.value).into());
        }

        let phase = self.rules.phase(&node.state);
        let candidates = if legal.is_empty() {
            Vec::new()
        } else {
            generator.select(legal, Some(&eval), phase, Scope::Interior, rng)
        };

        let node = tree.get_mut(id);
        node.set_evaluation(eval.value);
        node.complete = candidates.is_empty();
        node.edges = candidates
            .into_iter()
            .map(|c| Edge::new(c.action, c.prior))
            .collect();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::core::{EdgeId, EvaluatorError, GamePhase, PlayerId, PlayerMap};
    use crate::rules::{GameResult, Transition};
    use crate::search::evaluator::EvaluationResult;

    /// Counter game: each seat alternately adds 1 or 2; reward to the mover
    /// equals what was added. Ends at 6.
    struct Counter;

    impl RulesEngine for Counter {
        type State = (u8, u8);

        fn player_count(&self) -> usize {
            2
        }
        fn phase(&self, _: &(u8, u8)) -> GamePhase {
            GamePhase::Main
        }
        fn to_move(&self, s: &(u8, u8)) -> PlayerId {
            PlayerId::new(s.1)
        }
        fn legal_actions(&self, s: &(u8, u8)) -> Vec<Action> {
            if s.0 >= 6 {
                Vec::new()
            } else {
                vec![Action::BuildRoad(EdgeId(1)), Action::BuildRoad(EdgeId(2))]
            }
        }
        fn apply(&self, s: &(u8, u8), a: &Action) -> Result<Transition<(u8, u8)>, SearchError> {
            let Action::BuildRoad(EdgeId(n)) = a else {
                return Err(SearchError::illegal(a, "counter only takes roads"));
            };
            let mut rewards = PlayerMap::with_value(2, 0.0);
            rewards[PlayerId::new(s.1)] = f64::from(*n);
            Ok(Transition {
                state: (s.0 + n, 1 - s.1),
                rewards,
            })
        }
        fn is_terminal(&self, s: &(u8, u8)) -> Option<GameResult> {
            (s.0 >= 6).then_some(GameResult::Draw)
        }
    }

    struct Flat(f64);

    impl Evaluator<(u8, u8)> for Flat {
        fn score(
            &self,
            _: &(u8, u8),
            _: PlayerId,
            candidates: &[Action],
        ) -> Result<EvaluationResult, EvaluatorError> {
            Ok(EvaluationResult::with_prior(self.0, vec![1.0; candidates.len()]))
        }
    }

    struct Broken;

    impl Evaluator<(u8, u8)> for Broken {
        fn score(&self, _: &(u8, u8), _: PlayerId, _: &[Action]) -> Result<EvaluationResult, EvaluatorError> {
            Err(EvaluatorError::Inference("offline".into()))
        }
    }

    fn deadline() -> Deadline {
        Deadline::after(Duration::from_secs(60))
    }

    #[test]
    fn test_seed_lane_evaluates_candidate() {
        let config = SearchConfig::default().with_max_depth(0);
        let engine = RolloutEngine::new(&Counter, &Flat(0.25), &config, deadline());
        let mut counters = WorkCounters::default();

        let tree = engine
            .seed_lane(&(0, 0), &Action::BuildRoad(EdgeId(2)), &mut GameRng::new(1), &mut counters)
            .unwrap();

        let cand = candidate_node(&tree);
        assert_eq!(tree.get(cand).depth, 1);
        assert_eq!(tree.get(cand).state, (2, 1));
        assert_eq!(tree.get(cand).value, 0.25);
        assert!(tree.get(cand).complete);
        assert_eq!(counters.evaluator_calls, 1);
    }

    #[test]
    fn test_rollouts_exhaust_finite_tree() {
        let config = SearchConfig::default().with_max_depth(20).with_gamma(1.0);
        let engine = RolloutEngine::new(&Counter, &Flat(0.0), &config, deadline());
        let mut rng = GameRng::new(3);
        let mut counters = WorkCounters::default();

        let mut tree = engine
            .seed_lane(&(0, 0), &Action::BuildRoad(EdgeId(1)), &mut rng, &mut counters)
            .unwrap();
        engine.run(&mut tree, &mut rng, 10_000, &mut counters).unwrap();

        let cand = candidate_node(&tree);
        assert!(tree.get(cand).complete);
        assert!(counters.rollouts < 10_000);
        assert!(tree.iter().all(|(_, n)| n.depth <= 7));
        assert!(tree.iter().any(|(_, n)| n.terminal));
    }

    #[test]
    fn test_depth_limit() {
        let config = SearchConfig::default().with_max_depth(3);
        let engine = RolloutEngine::new(&Counter, &Flat(0.0), &config, deadline());
        let mut rng = GameRng::new(5);
        let mut counters = WorkCounters::default();

        let mut tree = engine
            .seed_lane(&(0, 0), &Action::BuildRoad(EdgeId(1)), &mut rng, &mut counters)
            .unwrap();
        engine.run(&mut tree, &mut rng, 500, &mut counters).unwrap();

        assert_eq!(tree.iter().map(|(_, n)| n.depth).max(), Some(3));
        for (_, node) in tree.iter() {
            if node.depth == 3 {
                assert!(node.edges.is_empty());
            }
        }
    }

    #[test]
    fn test_evaluator_failure_propagates() {
        let config = SearchConfig::default();
        let engine = RolloutEngine::new(&Counter, &Broken, &config, deadline());
        let err = engine
            .seed_lane(&(0, 0), &Action::BuildRoad(EdgeId(1)), &mut GameRng::new(1), &mut WorkCounters::default())
            .unwrap_err();
        assert!(matches!(err, SearchError::EvaluatorUnavailable(_)));
    }

    #[test]
    fn test_non_finite_value_is_an_evaluator_failure() {
        let config = SearchConfig::default();
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let flat = Flat(value);
            let engine = RolloutEngine::new(&Counter, &flat, &config, deadline());
            let err = engine
                .seed_lane(&(0, 0), &Action::BuildRoad(EdgeId(1)), &mut GameRng::new(1), &mut WorkCounters::default())
                .unwrap_err();
            assert!(matches!(
                err,
                SearchError::EvaluatorUnavailable(EvaluatorError::NonFiniteValue(_))
            ));
        }
    }

    #[test]
    fn test_illegal_action_propagates() {
        let config = SearchConfig::default();
        let engine = RolloutEngine::new(&Counter, &Flat(0.0), &config, deadline());
        let err = engine
            .seed_lane(&(0, 0), &Action::EndTurn, &mut GameRng::new(1), &mut WorkCounters::default())
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_expired_deadline_stops_rollouts() {
        let config = SearchConfig::default();
        let engine = RolloutEngine::new(&Counter, &Flat(0.0), &config, Deadline::after(Duration::ZERO));
        let mut rng = GameRng::new(1);
        let mut counters = WorkCounters::default();

        let mut tree = engine
            .seed_lane(&(0, 0), &Action::BuildRoad(EdgeId(1)), &mut rng, &mut counters)
            .unwrap();
        engine.run(&mut tree, &mut rng, 100, &mut counters).unwrap();
        assert_eq!(counters.rollouts, 0);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_stop_flag_stops_rollouts() {
        let config = SearchConfig::default();
        let stop = AtomicBool::new(true);
        let engine = RolloutEngine::new(&Counter, &Flat(0.0), &config, deadline()).with_stop(&stop);
        let mut rng = GameRng::new(1);
        let mut counters = WorkCounters::default();

        let mut tree = engine
            .seed_lane(&(0, 0), &Action::BuildRoad(EdgeId(1)), &mut rng, &mut counters)
            .unwrap();
        engine.run(&mut tree, &mut rng, 100, &mut counters).unwrap();
        assert_eq!(counters.rollouts, 0);
    }
}

//! Worker pool and coordinator.
//!
//! Every root candidate owns one or more lanes. A lane is an independent
//! tree grown in batches: the coordinator hands the lane's tree and RNG to a
//! worker as a `WorkerTask`, the worker runs a batch of rollouts and sends
//! everything back as a `WorkerResult`, and the coordinator merges it and
//! redispatches. Trees are moved, never shared, so there is no locking.
//!
//! With one worker the same loop runs inline, round-robin over lanes. A
//! lane's result only depends on its own task sequence, so with a rollout
//! budget the estimates do not depend on scheduling.
//!
//! Both modes stop dispatching at the deadline. A task dispatched before it
//! may report back until `deadline + result_grace`; later results are
//! discarded.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, trace, warn};

use crate::core::{Action, GameRng, SearchError};
use crate::rules::RulesEngine;

use super::budget::Deadline;
use super::candidates::Candidate;
use super::config::SearchConfig;
use super::evaluator::Evaluator;
use super::rollout::{candidate_node, RolloutEngine};
use super::select::{CandidateEstimate, CandidateStatus};
use super::stats::{SearchStats, WorkCounters};
use super::tree::SearchTree;

/// Read-only collaborators shared by every worker.
pub struct Shared<R, E> {
    pub rules: Arc<R>,
    pub evaluator: Arc<E>,
    pub config: Arc<SearchConfig>,
}

impl<R, E> Clone for Shared<R, E> {
    fn clone(&self) -> Self {
        Self {
            rules: Arc::clone(&self.rules),
            evaluator: Arc::clone(&self.evaluator),
            config: Arc::clone(&self.config),
        }
    }
}

/// One batch of work on one lane.
pub struct WorkerTask<S> {
    pub candidate: usize,
    pub lane: usize,
    pub action: Action,
    /// `None` on the lane's first task; the worker seeds it.
    pub tree: Option<SearchTree<S>>,
    pub rng: GameRng,
    pub rollouts: u32,
}

/// A lane's state after a batch.
pub struct LaneReport<S> {
    pub tree: SearchTree<S>,
    pub rng: GameRng,
    /// Current candidate-node estimate.
    pub value: f64,
    /// Nothing left to expand.
    pub exhausted: bool,
    pub counters: WorkCounters,
}

/// What a worker sends back for a task.
pub struct WorkerResult<S> {
    pub candidate: usize,
    pub lane: usize,
    pub outcome: Result<LaneReport<S>, SearchError>,
}

impl<S: Clone> WorkerTask<S> {
    /// Run the batch. Panics are caught and reported as `WorkerFailed`.
    pub fn run<R, E>(
        self,
        shared: &Shared<R, E>,
        root: &S,
        deadline: Deadline,
        stop: &AtomicBool,
    ) -> WorkerResult<S>
    where
        R: RulesEngine<State = S>,
        E: Evaluator<S>,
    {
        let WorkerTask {
            candidate,
            lane,
            action,
            tree,
            mut rng,
            rollouts,
        } = self;

        let result = panic::catch_unwind(AssertUnwindSafe(|| -> Result<_, SearchError> {
            let engine = RolloutEngine::new(&*shared.rules, &*shared.evaluator, &shared.config, deadline)
                .with_stop(stop);
            let mut counters = WorkCounters::default();
            let mut tree = match tree {
                Some(tree) => tree,
                None => engine.seed_lane(root, &action, &mut rng, &mut counters)?,
            };
            engine.run(&mut tree, &mut rng, rollouts, &mut counters)?;
            Ok((tree, counters))
        }));

        let outcome = match result {
            Ok(Ok((tree, counters))) => {
                let node = tree.get(candidate_node(&tree));
                Ok(LaneReport {
                    value: node.value,
                    exhausted: node.complete,
                    tree,
                    rng,
                    counters,
                })
            }
            Ok(Err(err)) => Err(err),
            Err(payload) => {
                let msg = if let Some(s) = payload.downcast_ref::<&str>() {
                    (*s).to_string()
                } else if let Some(s) = payload.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "unknown panic payload".to_string()
                };
                Err(SearchError::WorkerFailed(msg))
            }
        };

        WorkerResult {
            candidate,
            lane,
            outcome,
        }
    }
}

/// Coordinator-side bookkeeping for one lane.
struct Lane<S> {
    candidate: usize,
    index: usize,
    tree: Option<SearchTree<S>>,
    /// `None` while a task holds the lane.
    rng: Option<GameRng>,
    value: Option<f64>,
    rollouts: u32,
    budget: Option<u32>,
    exhausted: bool,
    failure: Option<SearchError>,
}

impl<S> Lane<S> {
    fn next_task(&mut self, action: &Action, per_task: u32) -> Option<WorkerTask<S>> {
        if self.failure.is_some() || self.exhausted || self.budget == Some(0) {
            return None;
        }
        let rng = self.rng.take()?;
        let rollouts = self.budget.map_or(per_task, |b| b.min(per_task));
        Some(WorkerTask {
            candidate: self.candidate,
            lane: self.index,
            action: action.clone(),
            tree: self.tree.take(),
            rng,
            rollouts,
        })
    }

    fn merge(&mut self, outcome: Result<LaneReport<S>, SearchError>) {
        match outcome {
            Ok(report) => {
                let done = report.counters.rollouts;
                self.rollouts += done;
                self.budget = self.budget.map(|b| b.saturating_sub(done));
                self.value = Some(report.value);
                self.exhausted = report.exhausted;
                self.tree = Some(report.tree);
                self.rng = Some(report.rng);
            }
            Err(err) => self.failure = Some(err),
        }
    }
}

/// Raises the stop flag when the coordinator returns, so stragglers quit
/// instead of holding pool threads into the next decision.
struct StopOnDrop(Arc<AtomicBool>);

impl Drop for StopOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// Fixed-size worker pool.
pub struct WorkerPool {
    pool: Option<rayon::ThreadPool>,
    workers: usize,
}

impl WorkerPool {
    /// Build a pool of `workers` threads. `workers <= 1` runs inline.
    pub fn new(workers: usize) -> Result<Self, SearchError> {
        let workers = workers.max(1);
        let pool = if workers > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("forward-search-{i}"))
                .build()
                .map_err(|e| SearchError::WorkerFailed(e.to_string()))?;
            debug!("worker pool started with {workers} threads");
            Some(pool)
        } else {
            None
        };
        Ok(Self { pool, workers })
    }

    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Lanes per candidate: spare workers go to extra lanes.
    #[must_use]
    pub fn lanes_per_candidate(&self, candidates: usize) -> usize {
        if self.pool.is_none() || candidates == 0 {
            1
        } else {
            (self.workers / candidates).max(1)
        }
    }

    /// Search every candidate until the deadline, the rollout budget or
    /// exhaustion, and return one estimate per candidate in input order.
    ///
    /// Fails only on fatal errors; per-candidate failures are reported in
    /// the estimates.
    pub fn evaluate<R, E>(
        &self,
        shared: &Shared<R, E>,
        root: &Arc<R::State>,
        candidates: &[Candidate],
        deadline: Deadline,
        stats: &mut SearchStats,
    ) -> Result<Vec<CandidateEstimate>, SearchError>
    where
        R: RulesEngine + 'static,
        R::State: 'static,
        E: Evaluator<R::State> + 'static,
    {
        let config = &shared.config;
        let lanes_per = self.lanes_per_candidate(candidates.len());
        let lane_budget = config
            .max_rollouts
            .map(|total| total.div_ceil(lanes_per as u32));
        let base_rng = GameRng::new(config.seed);

        let mut lanes: Vec<Lane<R::State>> = Vec::with_capacity(candidates.len() * lanes_per);
        for candidate in 0..candidates.len() {
            for index in 0..lanes_per {
                lanes.push(Lane {
                    candidate,
                    index,
                    tree: None,
                    rng: Some(base_rng.derive(&[candidate as u64, index as u64])),
                    value: None,
                    rollouts: 0,
                    budget: lane_budget,
                    exhausted: false,
                    failure: None,
                });
            }
        }
        debug!(
            "searching {} candidates on {} lanes ({} workers)",
            candidates.len(),
            lanes.len(),
            self.workers
        );

        let stop = StopOnDrop(Arc::new(AtomicBool::new(false)));
        let cutoff = deadline.collection_cutoff(config.result_grace);

        match &self.pool {
            None => Self::run_inline(shared, root, candidates, &mut lanes, deadline, cutoff, &stop.0, stats)?,
            Some(pool) => Self::run_parallel(
                pool, shared, root, candidates, &mut lanes, lanes_per, deadline, cutoff, &stop.0, stats,
            )?,
        }

        Ok(Self::estimates(candidates, &lanes))
    }

    #[allow(clippy::too_many_arguments)]
    fn run_inline<R, E>(
        shared: &Shared<R, E>,
        root: &Arc<R::State>,
        candidates: &[Candidate],
        lanes: &mut [Lane<R::State>],
        deadline: Deadline,
        cutoff: Instant,
        stop: &AtomicBool,
        stats: &mut SearchStats,
    ) -> Result<(), SearchError>
    where
        R: RulesEngine,
        E: Evaluator<R::State>,
    {
        let per_task = shared.config.rollouts_per_task;
        let mut queue: VecDeque<usize> = (0..lanes.len()).collect();

        while let Some(i) = queue.pop_front() {
            if deadline.expired() {
                break;
            }
            let lane = &mut lanes[i];
            let Some(task) = lane.next_task(&candidates[lane.candidate].action, per_task) else {
                continue;
            };
            stats.tasks_dispatched += 1;
            let result = task.run(shared, root, deadline, stop);
            if Instant::now() > cutoff {
                stats.tasks_discarded += 1;
                debug!("discarding late result for candidate {}", result.candidate);
                break;
            }
            Self::merge(lanes, result, stats)?;
            queue.push_back(i);
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn run_parallel<R, E>(
        pool: &rayon::ThreadPool,
        shared: &Shared<R, E>,
        root: &Arc<R::State>,
        candidates: &[Candidate],
        lanes: &mut [Lane<R::State>],
        lanes_per: usize,
        deadline: Deadline,
        cutoff: Instant,
        stop: &Arc<AtomicBool>,
        stats: &mut SearchStats,
    ) -> Result<(), SearchError>
    where
        R: RulesEngine + 'static,
        R::State: 'static,
        E: Evaluator<R::State> + 'static,
    {
        let per_task = shared.config.rollouts_per_task;
        let (tx, rx) = crossbeam_channel::unbounded::<WorkerResult<R::State>>();
        let mut in_flight = 0u32;

        // Nothing goes out once the deadline has passed, so only work started
        // in time can be merged, as in the inline loop.
        let dispatch = |lane: &mut Lane<R::State>, stats: &mut SearchStats| -> bool {
            if deadline.expired() {
                return false;
            }
            let Some(task) = lane.next_task(&candidates[lane.candidate].action, per_task) else {
                return false;
            };
            trace!("dispatch candidate {} lane {}", task.candidate, task.lane);
            let shared = shared.clone();
            let root = Arc::clone(root);
            let stop = Arc::clone(stop);
            let tx = tx.clone();
            pool.spawn(move || {
                let result = task.run(&shared, &root, deadline, &stop);
                // The coordinator may have stopped listening.
                let _ = tx.send(result);
            });
            stats.tasks_dispatched += 1;
            true
        };

        for lane in lanes.iter_mut() {
            if dispatch(lane, stats) {
                in_flight += 1;
            }
        }

        while in_flight > 0 {
            let Ok(result) = rx.recv_deadline(cutoff) else {
                break;
            };
            in_flight -= 1;
            let i = result.candidate * lanes_per + result.lane;
            Self::merge(lanes, result, stats)?;
            if dispatch(&mut lanes[i], stats) {
                in_flight += 1;
            }
        }

        if in_flight > 0 {
            stats.tasks_discarded += in_flight;
            debug!("discarded {in_flight} tasks still running at the cut-off");
        }
        Ok(())
    }

    /// Fold one result into its lane. Fatal errors abort the decision.
    fn merge<S>(lanes: &mut [Lane<S>], result: WorkerResult<S>, stats: &mut SearchStats) -> Result<(), SearchError> {
        let WorkerResult {
            candidate,
            lane,
            outcome,
        } = result;

        match &outcome {
            Ok(report) => stats.absorb(&report.counters),
            Err(err) if err.is_fatal() => return Err(err.clone()),
            Err(err) => warn!("candidate {candidate} lane {lane} failed: {err}"),
        }
        stats.tasks_merged += 1;

        if let Some(slot) = lanes.iter_mut().find(|l| l.candidate == candidate && l.index == lane) {
            slot.merge(outcome);
        }
        Ok(())
    }

    /// One estimate per candidate: rollout-weighted mean over lanes.
    fn estimates<S>(candidates: &[Candidate], lanes: &[Lane<S>]) -> Vec<CandidateEstimate> {
        candidates
            .iter()
            .enumerate()
            .map(|(order, c)| {
                let mut estimate = CandidateEstimate::pending(c.action.clone(), order, c.prior);
                let mine = lanes.iter().filter(|l| l.candidate == order);

                let mut weighted = 0.0;
                let mut weight = 0.0;
                for lane in mine {
                    estimate.rollouts += lane.rollouts;
                    if let Some(err) = &lane.failure {
                        estimate.status = CandidateStatus::Failed(err.clone());
                    }
                    if let Some(value) = lane.value {
                        let w = f64::from(lane.rollouts.max(1));
                        weighted += w * value;
                        weight += w;
                    }
                }

                if estimate.is_failed() {
                    estimate.value = f64::NEG_INFINITY;
                } else if weight > 0.0 {
                    estimate.value = weighted / weight;
                    estimate.status = CandidateStatus::Evaluated;
                }
                estimate
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::core::{EdgeId, EvaluatorError, GamePhase, PlayerId, PlayerMap};
    use crate::rules::{GameResult, Transition};
    use crate::search::evaluator::EvaluationResult;

    /// Single-seat game: pick a road worth its id, three picks per game.
    struct Roads;

    impl RulesEngine for Roads {
        type State = u8;

        fn player_count(&self) -> usize {
            1
        }
        fn phase(&self, _: &u8) -> GamePhase {
            GamePhase::Main
        }
        fn to_move(&self, _: &u8) -> PlayerId {
            PlayerId::new(0)
        }
        fn legal_actions(&self, s: &u8) -> Vec<Action> {
            if *s >= 3 {
                Vec::new()
            } else {
                (1..=3).map(|i| Action::BuildRoad(EdgeId(i))).collect()
            }
        }
        fn apply(&self, s: &u8, a: &Action) -> Result<Transition<u8>, SearchError> {
            match a {
                Action::BuildRoad(EdgeId(n)) => Ok(Transition {
                    state: s + 1,
                    rewards: PlayerMap::with_value(1, f64::from(*n)),
                }),
                _ => Err(SearchError::illegal(a, "roads only")),
            }
        }
        fn is_terminal(&self, s: &u8) -> Option<GameResult> {
            (*s >= 3).then_some(GameResult::Draw)
        }
    }

    struct Zero;

    impl Evaluator<u8> for Zero {
        fn score(&self, _: &u8, _: PlayerId, _: &[Action]) -> Result<EvaluationResult, EvaluatorError> {
            Ok(EvaluationResult::value_only(0.0))
        }
    }

    fn shared<E>(evaluator: E, config: SearchConfig) -> Shared<Roads, E> {
        Shared {
            rules: Arc::new(Roads),
            evaluator: Arc::new(evaluator),
            config: Arc::new(config),
        }
    }

    fn candidates() -> Vec<Candidate> {
        (1..=3)
            .map(|i| Candidate {
                action: Action::BuildRoad(EdgeId(i)),
                prior: 1.0 / 3.0,
            })
            .collect()
    }

    fn config() -> SearchConfig {
        SearchConfig::default()
            .with_gamma(1.0)
            .with_thinking_time(Duration::from_secs(30))
            .with_max_rollouts(64)
    }

    #[test]
    fn test_lanes_per_candidate() {
        assert_eq!(WorkerPool::new(1).unwrap().lanes_per_candidate(5), 1);
        assert_eq!(WorkerPool::new(8).unwrap().lanes_per_candidate(3), 2);
        assert_eq!(WorkerPool::new(2).unwrap().lanes_per_candidate(6), 1);
    }

    #[test]
    fn test_inline_estimates() {
        let pool = WorkerPool::new(1).unwrap();
        let shared = shared(Zero, config());
        let deadline = Deadline::after(shared.config.max_thinking_time);
        let mut stats = SearchStats::new();

        let estimates = pool
            .evaluate(&shared, &Arc::new(0), &candidates(), deadline, &mut stats)
            .unwrap();

        // road i, then the best road (3), then a terminal leaf worth 1
        let values: Vec<f64> = estimates.iter().map(|e| e.value).collect();
        assert_eq!(values, vec![5.0, 6.0, 7.0]);
        assert!(estimates.iter().all(|e| e.status == CandidateStatus::Evaluated));
        assert_eq!(stats.tasks_merged, stats.tasks_dispatched);
        assert_eq!(stats.tasks_discarded, 0);
    }

    #[test]
    fn test_parallel_matches_inline_on_exhausted_trees() {
        let mut stats = SearchStats::new();
        let shared = shared(Zero, config());
        let deadline = Deadline::after(shared.config.max_thinking_time);

        let inline = WorkerPool::new(1)
            .unwrap()
            .evaluate(&shared, &Arc::new(0), &candidates(), deadline, &mut stats)
            .unwrap();
        let parallel = WorkerPool::new(4)
            .unwrap()
            .evaluate(&shared, &Arc::new(0), &candidates(), deadline, &mut stats)
            .unwrap();

        let values = |es: &[CandidateEstimate]| es.iter().map(|e| e.value).collect::<Vec<_>>();
        assert_eq!(values(&inline), values(&parallel));
    }

    #[test]
    fn test_failed_lane_marks_candidate() {
        struct Trap;
        impl Evaluator<u8> for Trap {
            fn score(&self, _: &u8, _: PlayerId, c: &[Action]) -> Result<EvaluationResult, EvaluatorError> {
                // candidate nodes are scored with their three children
                if c.is_empty() {
                    Ok(EvaluationResult::value_only(0.0))
                } else {
                    Err(EvaluatorError::Inference("offline".into()))
                }
            }
        }

        let pool = WorkerPool::new(1).unwrap();
        let shared = shared(Trap, config());
        let deadline = Deadline::after(shared.config.max_thinking_time);
        let mut stats = SearchStats::new();

        let estimates = pool
            .evaluate(&shared, &Arc::new(0), &candidates(), deadline, &mut stats)
            .unwrap();
        assert!(estimates.iter().all(CandidateEstimate::is_failed));
        assert!(estimates.iter().all(|e| e.value == f64::NEG_INFINITY));
    }

    #[test]
    fn test_illegal_candidate_is_fatal() {
        let pool = WorkerPool::new(1).unwrap();
        let shared = shared(Zero, config());
        let deadline = Deadline::after(shared.config.max_thinking_time);
        let bad = vec![Candidate {
            action: Action::EndTurn,
            prior: 1.0,
        }];

        let err = pool
            .evaluate(&shared, &Arc::new(0), &bad, deadline, &mut SearchStats::new())
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_expired_deadline_reports_nothing() {
        let pool = WorkerPool::new(1).unwrap();
        let shared = shared(Zero, config());
        let mut stats = SearchStats::new();

        let estimates = pool
            .evaluate(&shared, &Arc::new(0), &candidates(), Deadline::after(Duration::ZERO), &mut stats)
            .unwrap();
        assert!(estimates.iter().all(|e| e.status == CandidateStatus::NoResult));
        assert_eq!(stats.tasks_dispatched, 0);
    }

    #[test]
    fn test_parallel_expired_deadline_dispatches_nothing() {
        let pool = WorkerPool::new(4).unwrap();
        let shared = shared(Zero, config());
        let mut stats = SearchStats::new();

        let estimates = pool
            .evaluate(&shared, &Arc::new(0), &candidates(), Deadline::after(Duration::ZERO), &mut stats)
            .unwrap();
        assert!(estimates.iter().all(|e| e.status == CandidateStatus::NoResult));
        assert_eq!(stats.tasks_dispatched, 0);
        assert_eq!(stats.tasks_merged, 0);
    }

    #[test]
    fn test_spare_workers_split_rollout_budget() {
        // 8 workers over 3 candidates: 2 lanes each, ceil(5 / 2) = 3 rollouts
        // per lane, and 3 rollouts never finish a 9-leaf tree.
        let pool = WorkerPool::new(8).unwrap();
        assert_eq!(pool.lanes_per_candidate(3), 2);

        let shared = shared(Zero, config().with_max_rollouts(5));
        let deadline = Deadline::after(shared.config.max_thinking_time);
        let mut stats = SearchStats::new();

        let estimates = pool
            .evaluate(&shared, &Arc::new(0), &candidates(), deadline, &mut stats)
            .unwrap();
        assert!(estimates.iter().all(|e| e.rollouts == 6));
        assert!(estimates.iter().all(|e| e.status == CandidateStatus::Evaluated));
        assert_eq!(stats.tasks_dispatched, 6);
        assert_eq!(stats.rollouts, 18);
    }

    #[test]
    fn test_spare_lanes_agree_with_inline_when_exhausted() {
        let shared = shared(Zero, config());
        let deadline = Deadline::after(shared.config.max_thinking_time);

        let inline = WorkerPool::new(1)
            .unwrap()
            .evaluate(&shared, &Arc::new(0), &candidates(), deadline, &mut SearchStats::new())
            .unwrap();
        let laned = WorkerPool::new(8)
            .unwrap()
            .evaluate(&shared, &Arc::new(0), &candidates(), deadline, &mut SearchStats::new())
            .unwrap();

        for (a, b) in inline.iter().zip(&laned) {
            assert_eq!(a.value, b.value);
            // both lanes walk the whole tree
            assert_eq!(b.rollouts, 2 * a.rollouts);
        }
    }

    #[test]
    fn test_lane_values_are_rollout_weighted() {
        let lane = |index, value, rollouts| Lane::<u8> {
            candidate: 0,
            index,
            tree: None,
            rng: None,
            value: Some(value),
            rollouts,
            budget: None,
            exhausted: false,
            failure: None,
        };
        let lanes = vec![lane(0, 1.0, 1), lane(1, 4.0, 3)];

        let estimates = WorkerPool::estimates(&candidates()[..1], &lanes);
        assert_eq!(estimates[0].rollouts, 4);
        assert!((estimates[0].value - 3.25).abs() < 1e-12);
        assert_eq!(estimates[0].status, CandidateStatus::Evaluated);
    }
}

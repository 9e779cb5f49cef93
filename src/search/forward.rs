//! The decision entry point.
//!
//! `ForwardSearch` ties the pieces together: it generates the root
//! candidates, hands them to the worker pool under a deadline, and asks the
//! selector for the winner. `decide` never fails; every error path ends in
//! the configured fallback action.

use std::sync::Arc;

use log::{debug, error, warn};

use crate::core::{Action, GameRng, PlayerId, SearchError};
use crate::rules::RulesEngine;

use super::budget::Deadline;
use super::candidates::{ActionGenerator, Candidate, Scope};
use super::config::SearchConfig;
use super::evaluator::Evaluator;
use super::pool::{Shared, WorkerPool};
use super::select::{fallback_action, CandidateEstimate, CandidateStatus, DecisionSelector};
use super::stats::SearchStats;

/// Result of a completed search.
#[derive(Clone, Debug)]
pub struct SearchOutcome {
    /// The chosen action.
    pub action: Action,
    /// The seat the search decided for.
    pub searcher: PlayerId,
    /// Every root candidate in generator order.
    pub estimates: Vec<CandidateEstimate>,
    pub stats: SearchStats,
}

impl SearchOutcome {
    /// Estimate of the chosen action.
    #[must_use]
    pub fn chosen(&self) -> Option<&CandidateEstimate> {
        self.estimates.iter().find(|e| e.action == self.action)
    }

    /// Root candidate actions in generator order.
    pub fn candidates(&self) -> impl Iterator<Item = &Action> {
        self.estimates.iter().map(|e| &e.action)
    }
}

/// Forward-search decision policy for one seat, or several.
///
/// Holds the rules engine, evaluator and config behind `Arc`s so workers can
/// share them, and a worker pool sized once at construction.
pub struct ForwardSearch<R, E> {
    shared: Shared<R, E>,
    pool: WorkerPool,
}

impl<R, E> ForwardSearch<R, E>
where
    R: RulesEngine + 'static,
    R::State: 'static,
    E: Evaluator<R::State> + 'static,
{
    /// Create a search policy. Fails on an invalid config or if the worker
    /// pool cannot be started.
    pub fn new(rules: R, evaluator: E, config: SearchConfig) -> Result<Self, SearchError> {
        Self::from_shared(Arc::new(rules), Arc::new(evaluator), config)
    }

    /// Create a search policy around already shared collaborators.
    pub fn from_shared(rules: Arc<R>, evaluator: Arc<E>, config: SearchConfig) -> Result<Self, SearchError> {
        config.validate()?;
        let pool = WorkerPool::new(config.num_workers)?;
        Ok(Self {
            shared: Shared {
                rules,
                evaluator,
                config: Arc::new(config),
            },
            pool,
        })
    }

    #[must_use]
    pub fn config(&self) -> &SearchConfig {
        &self.shared.config
    }

    #[must_use]
    pub fn rules(&self) -> &R {
        &self.shared.rules
    }

    /// Choose an action for the seat to move.
    ///
    /// Always returns an action: the search result when there is one,
    /// otherwise the fallback (the default action if legal, else the first
    /// candidate).
    pub fn decide(&self, state: &R::State) -> Action {
        match self.search(state) {
            Ok(outcome) => outcome.action,
            Err(err) => {
                if matches!(err, SearchError::IllegalAction { .. }) {
                    error!("decision aborted: {err}");
                } else {
                    warn!("search failed, falling back: {err}");
                }
                self.fallback(state)
            }
        }
    }

    /// Run the full search and report every candidate's estimate.
    pub fn search(&self, state: &R::State) -> Result<SearchOutcome, SearchError> {
        let config = &self.shared.config;
        let rules = &*self.shared.rules;
        let deadline = Deadline::after(config.max_thinking_time);
        let searcher = rules.to_move(state);
        let mut stats = SearchStats::new();

        if rules.is_terminal(state).is_some() {
            return Err(SearchError::NoLegalActions { player: searcher });
        }

        let mut rng = GameRng::new(config.seed);
        let candidates = self.root_candidates(state, &mut rng, &mut stats)?;
        stats.candidates = candidates.len() as u32;

        if let [only] = candidates.as_slice() {
            debug!("{searcher}: single candidate {}, no search", only.action);
            let mut estimate = CandidateEstimate::pending(only.action.clone(), 0, only.prior);
            estimate.status = CandidateStatus::Forced;
            stats.time_us = deadline.elapsed().as_micros() as u64;
            return Ok(SearchOutcome {
                action: only.action.clone(),
                searcher,
                estimates: vec![estimate],
                stats,
            });
        }

        let root = Arc::new(state.clone());
        let estimates = self.pool.evaluate(&self.shared, &root, &candidates, deadline, &mut stats)?;
        let action = DecisionSelector::new(config).select(&estimates)?.action.clone();
        stats.time_us = deadline.elapsed().as_micros() as u64;

        debug!(
            "{searcher}: chose {action} from {} candidates ({} rollouts, {} nodes, {} ms)",
            estimates.len(),
            stats.rollouts,
            stats.nodes_expanded,
            stats.time_us / 1000
        );
        Ok(SearchOutcome {
            action,
            searcher,
            estimates,
            stats,
        })
    }

    /// Root candidates for `state`, in generator order.
    ///
    /// The evaluator is only asked for a prior when the legal set has to be
    /// cut down. If it fails, sampling falls back to a uniform prior.
    pub fn root_candidates(
        &self,
        state: &R::State,
        rng: &mut GameRng,
        stats: &mut SearchStats,
    ) -> Result<Vec<Candidate>, SearchError> {
        let rules = &*self.shared.rules;
        let generator = ActionGenerator::new(&self.shared.config);
        let legal = generator.legal(rules, state)?;
        let phase = rules.phase(state);

        let evaluation = if generator.needs_prior(phase, Scope::Root, legal.len()) {
            stats.evaluator_calls += 1;
            match self.shared.evaluator.score(state, rules.to_move(state), &legal) {
                Ok(eval) => Some(eval),
                Err(err) => {
                    warn!("root prior unavailable, sampling uniformly: {err}");
                    None
                }
            }
        } else {
            None
        };

        Ok(generator.select(legal, evaluation.as_ref(), phase, Scope::Root, rng))
    }

    /// Action to play when the search cannot produce one.
    fn fallback(&self, state: &R::State) -> Action {
        let config = &self.shared.config;
        let legal = ActionGenerator::new(config)
            .legal(&*self.shared.rules, state)
            .unwrap_or_default();
        fallback_action(&config.default_action, &legal)
    }
}

//! Action generator: bounded, phase-aware candidate sets.
//!
//! Root candidates follow the opening/main caps from `SearchConfig`; interior
//! nodes use `max_branching`. Sampling is prior-weighted and without
//! replacement, and the chosen subset keeps the rules engine's order so that
//! "earliest candidate" is a stable tie-break.

use rustc_hash::FxHashSet;

use crate::core::{Action, GamePhase, GameRng, SearchError};
use crate::rules::RulesEngine;

use super::config::SearchConfig;
use super::evaluator::EvaluationResult;

/// Where in the tree candidates are being generated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    /// The decision root.
    Root,
    /// Any node below the root, for any seat.
    Interior,
}

/// A candidate action and its (renormalised) prior.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub action: Action,
    pub prior: f32,
}

/// Produces ordered, duplicate-free candidate sets.
#[derive(Clone, Copy, Debug)]
pub struct ActionGenerator<'a> {
    config: &'a SearchConfig,
}

impl<'a> ActionGenerator<'a> {
    pub fn new(config: &'a SearchConfig) -> Self {
        Self { config }
    }

    /// Legal actions for the seat to move, deduplicated, with trade proposals
    /// removed when they are switched off.
    ///
    /// Fails with `NoLegalActions` if nothing is left.
    pub fn legal<R: RulesEngine>(
        &self,
        rules: &R,
        state: &R::State,
    ) -> Result<Vec<Action>, SearchError> {
        let mut seen = FxHashSet::default();
        let legal: Vec<Action> = rules
            .legal_actions(state)
            .into_iter()
            .filter(|a| !(self.config.dont_propose_trades && a.is_trade_proposal()))
            .filter(|a| seen.insert(a.clone()))
            .collect();

        if legal.is_empty() {
            return Err(SearchError::NoLegalActions {
                player: rules.to_move(state),
            });
        }
        Ok(legal)
    }

    /// Candidate cap for a phase and scope. `None` means take everything.
    #[must_use]
    pub fn cap(&self, phase: GamePhase, scope: Scope) -> Option<usize> {
        match scope {
            Scope::Root if phase.is_placement() => {
                if self.config.consider_all_opening_moves {
                    None
                } else {
                    Some(self.config.max_init_actions)
                }
            }
            Scope::Root => Some(self.config.main_phase_cap()),
            Scope::Interior => Some(self.config.max_branching),
        }
    }

    /// Whether choosing among `legal_count` actions needs the evaluator's
    /// prior. Exhaustive sets are taken as they are.
    #[must_use]
    pub fn needs_prior(&self, phase: GamePhase, scope: Scope, legal_count: usize) -> bool {
        self.cap(phase, scope).is_some_and(|cap| legal_count > cap)
    }

    /// Pick the candidate subset.
    ///
    /// `evaluation` supplies the prior over `legal` (uniform if absent).
    pub fn select(
        &self,
        legal: Vec<Action>,
        evaluation: Option<&EvaluationResult>,
        phase: GamePhase,
        scope: Scope,
        rng: &mut GameRng,
    ) -> Vec<Candidate> {
        let prior = match evaluation {
            Some(eval) => eval.normalized_prior(legal.len()),
            None => EvaluationResult::value_only(0.0).normalized_prior(legal.len()),
        };

        let keep: Vec<usize> = match self.cap(phase, scope) {
            Some(cap) if legal.len() > cap => {
                let mut picked = rng.sample_weighted_distinct(&prior, cap);
                picked.sort_unstable();
                picked
            }
            _ => (0..legal.len()).collect(),
        };

        let mass: f32 = keep.iter().map(|&i| prior[i]).sum();
        let mut slots: Vec<Option<Action>> = legal.into_iter().map(Some).collect();

        keep.into_iter()
            .filter_map(|i| {
                let action = slots[i].take()?;
                let prior = if mass > 0.0 { prior[i] / mass } else { 0.0 };
                Some(Candidate { action, prior })
            })
            .collect()
    }
}

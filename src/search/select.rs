//! Decision selector: turns per-candidate estimates into one action.

use serde::Serialize;

use crate::core::{Action, SearchError};

use super::config::SearchConfig;

/// Values closer than this (relative, floor 1.0) count as tied.
pub const VALUE_TOLERANCE: f64 = 1e-9;

/// How a candidate's estimate came about.
#[derive(Clone, Debug, PartialEq)]
pub enum CandidateStatus {
    /// At least one lane reported and none failed.
    Evaluated,
    /// The only candidate; returned without searching.
    Forced,
    /// A lane hit an evaluator or worker failure. Ranked below everything
    /// that evaluated cleanly.
    Failed(SearchError),
    /// Nothing reported before the collection cut-off.
    NoResult,
}

/// Aggregated estimate for one root candidate.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CandidateEstimate {
    pub action: Action,
    /// Position in generator order.
    pub order: usize,
    pub prior: f32,
    /// Discounted value for the searching seat. `-inf` without a usable
    /// result.
    pub value: f64,
    pub rollouts: u32,
    #[serde(skip)]
    pub status: CandidateStatus,
}

impl CandidateEstimate {
    /// An estimate with no result yet.
    #[must_use]
    pub fn pending(action: Action, order: usize, prior: f32) -> Self {
        Self {
            action,
            order,
            prior,
            value: f64::NEG_INFINITY,
            rollouts: 0,
            status: CandidateStatus::NoResult,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_trade(&self) -> bool {
        self.action.is_trade_proposal()
    }

    /// Can this candidate be chosen on its merits?
    #[must_use]
    pub fn is_selectable(&self) -> bool {
        matches!(self.status, CandidateStatus::Evaluated | CandidateStatus::Forced)
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self.status, CandidateStatus::Failed(_))
    }
}

fn tied(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    let scale = 1.0_f64.max(a.abs()).max(b.abs());
    (a - b).abs() <= VALUE_TOLERANCE * scale
}

/// Picks the best candidate with deterministic tie-breaking.
#[derive(Clone, Copy, Debug)]
pub struct DecisionSelector {
    discourage_trades: bool,
}

impl DecisionSelector {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            discourage_trades: config.dont_propose_trades,
        }
    }

    /// Select the winning estimate.
    ///
    /// Failed candidates compete only when nothing evaluated cleanly. Ties
    /// go to a non-proposal when trades are discouraged, then to the
    /// earliest candidate.
    pub fn select<'e>(
        &self,
        estimates: &'e [CandidateEstimate],
    ) -> Result<&'e CandidateEstimate, SearchError> {
        let mut pool: Vec<&CandidateEstimate> =
            estimates.iter().filter(|e| e.is_selectable()).collect();
        if pool.is_empty() {
            pool = estimates.iter().filter(|e| e.is_failed()).collect();
        }

        pool.into_iter()
            .reduce(|best, e| if self.prefers(e, best) { e } else { best })
            .ok_or(SearchError::BudgetExceededBeforeAnyResult)
    }

    /// Is `a` strictly preferred to `b`?
    fn prefers(&self, a: &CandidateEstimate, b: &CandidateEstimate) -> bool {
        if !tied(a.value, b.value) {
            return a.value > b.value;
        }
        if self.discourage_trades && a.is_trade() != b.is_trade() {
            return !a.is_trade();
        }
        a.order < b.order
    }
}

/// Action to return when the search cannot decide.
///
/// The configured default if it is a candidate, else the first candidate,
/// else the configured default.
#[must_use]
pub fn fallback_action(default: &Action, candidates: &[Action]) -> Action {
    if candidates.contains(default) {
        return default.clone();
    }
    candidates.first().unwrap_or(default).clone()
}

//! Evaluator seam between the search and a learned model.
//!
//! An evaluator scores a state from one seat's perspective and, when given a
//! candidate set, returns a prior over it. Implementations are shared across
//! workers and must be read-only with respect to their weights.

use crate::core::{Action, EvaluatorError, PlayerId};

/// Value estimate and optional action prior for one state.
#[derive(Clone, Debug, PartialEq)]
pub struct EvaluationResult {
    /// Expected outcome for the perspective seat.
    pub value: f64,

    /// Prior over the candidate actions passed to `score`, same order.
    /// It describes the seat to move, not necessarily the perspective seat.
    pub prior: Option<Vec<f32>>,
}

impl EvaluationResult {
    /// A value with no prior.
    #[must_use]
    pub fn value_only(value: f64) -> Self {
        Self { value, prior: None }
    }

    /// A value with a prior.
    #[must_use]
    pub fn with_prior(value: f64, prior: Vec<f32>) -> Self {
        Self {
            value,
            prior: Some(prior),
        }
    }

    /// The prior normalised to sum to 1 over `len` candidates.
    ///
    /// Missing, mis-shaped or all-zero priors become uniform. Negative and
    /// non-finite entries count as zero.
    #[must_use]
    pub fn normalized_prior(&self, len: usize) -> Vec<f32> {
        if len == 0 {
            return Vec::new();
        }
        let uniform = || vec![1.0 / len as f32; len];

        let Some(prior) = self.prior.as_ref().filter(|p| p.len() == len) else {
            return uniform();
        };
        let cleaned: Vec<f32> = prior
            .iter()
            .map(|&p| if p.is_finite() && p > 0.0 { p } else { 0.0 })
            .collect();
        let total: f32 = cleaned.iter().sum();
        if total <= 0.0 {
            return uniform();
        }
        cleaned.into_iter().map(|p| p / total).collect()
    }
}

/// Scores states for the search.
pub trait Evaluator<S>: Send + Sync {
    /// Score `state` for `perspective`, with a prior over `candidates`.
    ///
    /// An empty candidate slice asks for the value only.
    fn score(
        &self,
        state: &S,
        perspective: PlayerId,
        candidates: &[Action],
    ) -> Result<EvaluationResult, EvaluatorError>;
}

impl<S, E: Evaluator<S> + ?Sized> Evaluator<S> for std::sync::Arc<E> {
    fn score(
        &self,
        state: &S,
        perspective: PlayerId,
        candidates: &[Action],
    ) -> Result<EvaluationResult, EvaluatorError> {
        (**self).score(state, perspective, candidates)
    }
}

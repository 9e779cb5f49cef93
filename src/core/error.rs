//! Error types for the decision policy and its collaborators.
//!
//! None of these ever escape `ForwardSearch::decide`: every failure path ends
//! in a usable action. They do escape `ForwardSearch::search` so callers and
//! tests can see what went wrong.

use thiserror::Error;

use super::action::Action;
use super::player::PlayerId;

/// Failure of a single evaluator (model inference) call.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EvaluatorError {
    #[error("model inference failed: {0}")]
    Inference(String),

    #[error("prior has {got} entries for {expected} candidates")]
    PriorShape { expected: usize, got: usize },

    #[error("value {0} is not finite")]
    NonFiniteValue(f64),
}

/// Failure of a decision or of one unit of work inside it.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SearchError {
    /// The rules engine reported nothing to do in a non-terminal state.
    #[error("no legal actions for {player} in a non-terminal state")]
    NoLegalActions { player: PlayerId },

    /// The simulator was handed an action it does not accept.
    #[error("illegal action `{action}`: {reason}")]
    IllegalAction { action: Action, reason: String },

    #[error("evaluator unavailable: {0}")]
    EvaluatorUnavailable(#[from] EvaluatorError),

    #[error("deadline expired before any candidate produced a result")]
    BudgetExceededBeforeAnyResult,

    /// A worker panicked or its result channel closed.
    #[error("worker failed: {0}")]
    WorkerFailed(String),

    #[error("invalid config: {msg}")]
    InvalidConfig { msg: &'static str },
}

impl SearchError {
    /// Convenience constructor used by rules engines.
    pub fn illegal(action: &Action, reason: impl Into<String>) -> Self {
        SearchError::IllegalAction {
            action: action.clone(),
            reason: reason.into(),
        }
    }

    /// True for errors that invalidate the whole decision rather than one
    /// candidate.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SearchError::IllegalAction { .. } | SearchError::InvalidConfig { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = SearchError::NoLegalActions {
            player: PlayerId::new(2),
        };
        assert_eq!(err.to_string(), "no legal actions for Seat 2 in a non-terminal state");

        let err = SearchError::illegal(&Action::EndTurn, "dice not rolled");
        assert_eq!(err.to_string(), "illegal action `end turn`: dice not rolled");
    }

    #[test]
    fn test_evaluator_error_converts() {
        let err: SearchError = EvaluatorError::Inference("cuda oom".into()).into();
        assert!(matches!(err, SearchError::EvaluatorUnavailable(_)));
        assert!(!err.is_fatal());
        assert!(SearchError::illegal(&Action::RollDice, "twice").is_fatal());

        let err: SearchError = EvaluatorError::NonFiniteValue(f64::NAN).into();
        assert_eq!(err.to_string(), "evaluator unavailable: value NaN is not finite");
        assert!(!err.is_fatal());
    }
}

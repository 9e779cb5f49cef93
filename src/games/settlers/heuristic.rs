//! Hand-written evaluator for the settlers game.

use crate::core::{Action, EvaluatorError, PlayerId};
use crate::search::{EvaluationResult, Evaluator};

use super::state::SettlersState;

/// Scores a position by victory points and expected production.
///
/// The value is the perspective seat's share of the table's total strength,
/// where strength is `points + pip_weight * production_pips`. It lies in
/// `[0, 1]` like the terminal outcome values. The prior favours building
/// over trading and opening sites by their pips.
#[derive(Clone, Debug)]
pub struct HeuristicEvaluator {
    pip_weight: f64,
}

impl Default for HeuristicEvaluator {
    fn default() -> Self {
        Self { pip_weight: 0.1 }
    }
}

impl HeuristicEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Points one production pip is worth.
    pub fn with_pip_weight(mut self, weight: f64) -> Self {
        self.pip_weight = weight;
        self
    }

    fn strength(&self, state: &SettlersState, seat: PlayerId) -> f64 {
        f64::from(state.points(seat)) + self.pip_weight * f64::from(state.production_pips(seat))
    }

    fn weight(state: &SettlersState, action: &Action) -> f32 {
        match action {
            Action::PlaceSettlement(v) => 1.0 + f32::from(state.board().vertex_pips(*v)),
            Action::BuildCity(_) => 6.0,
            Action::BuildSettlement(_) => 5.0,
            Action::BuildRoad(_) => 1.5,
            Action::MoveRobber { victim: Some(_), .. } => 2.0,
            Action::BankTrade { .. } => 1.0,
            Action::ProposeTrade { .. } => 0.5,
            _ => 1.0,
        }
    }
}

impl Evaluator<SettlersState> for HeuristicEvaluator {
    fn score(
        &self,
        state: &SettlersState,
        perspective: PlayerId,
        candidates: &[Action],
    ) -> Result<EvaluationResult, EvaluatorError> {
        let n = state.player_count();
        let total: f64 = PlayerId::all(n).map(|p| self.strength(state, p)).sum();
        let value = if total > 0.0 {
            self.strength(state, perspective) / total
        } else {
            1.0 / n as f64
        };

        if candidates.is_empty() {
            return Ok(EvaluationResult::value_only(value));
        }
        let prior = candidates.iter().map(|a| Self::weight(state, a)).collect();
        Ok(EvaluationResult::with_prior(value, prior))
    }
}

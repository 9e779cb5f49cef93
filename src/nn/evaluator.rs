//! Adapter from a policy-value network to the search's `Evaluator`.

use crate::core::{Action, EvaluatorError, PlayerId};
use crate::search::{EvaluationResult, Evaluator};

use super::encoder::StateEncoder;
use super::traits::PolicyValueNetwork;

/// Scores states with a network.
///
/// The policy head is read at each candidate's slot and renormalised over
/// the candidates; actions the head does not cover get zero mass. The
/// value is the head's entry for the perspective seat.
#[derive(Clone, Debug)]
pub struct NetworkEvaluator<Enc, Net> {
    encoder: Enc,
    network: Net,
}

impl<Enc, Net> NetworkEvaluator<Enc, Net> {
    pub fn new(encoder: Enc, network: Net) -> Self {
        Self { encoder, network }
    }

    pub fn encoder(&self) -> &Enc {
        &self.encoder
    }

    pub fn network(&self) -> &Net {
        &self.network
    }
}

impl<S, Enc, Net> Evaluator<S> for NetworkEvaluator<Enc, Net>
where
    Enc: StateEncoder<S>,
    Net: PolicyValueNetwork,
{
    fn score(
        &self,
        state: &S,
        perspective: PlayerId,
        candidates: &[Action],
    ) -> Result<EvaluationResult, EvaluatorError> {
        let encoded = self.encoder.encode(state, perspective);
        let out = self.network.predict(&encoded)?;

        let value = out
            .values
            .get(perspective.index())
            .copied()
            .ok_or_else(|| EvaluatorError::Inference(format!("value head has no entry for {perspective}")))?;

        if candidates.is_empty() {
            return Ok(EvaluationResult::value_only(f64::from(value)));
        }

        let expected = self.encoder.action_space_size();
        if out.policy.len() != expected {
            return Err(EvaluatorError::PriorShape {
                expected,
                got: out.policy.len(),
            });
        }
        let prior = candidates
            .iter()
            .map(|a| {
                self.encoder
                    .action_index(a)
                    .and_then(|i| out.policy.get(i).copied())
                    .unwrap_or(0.0)
            })
            .collect();

        Ok(EvaluationResult::with_prior(f64::from(value), prior))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EdgeId;
    use crate::nn::traits::{EncodedState, NetworkOutput, UniformPolicyZeroValue};

    /// Encodes a `u8` as one feature; roads 0..4 map to policy slots.
    struct TinyEncoder;

    impl StateEncoder<u8> for TinyEncoder {
        fn encode(&self, state: &u8, _: PlayerId) -> EncodedState {
            EncodedState::new(vec![f32::from(*state)], vec![1])
        }
        fn output_shape(&self) -> Vec<usize> {
            vec![1]
        }
        fn action_space_size(&self) -> usize {
            4
        }
        fn action_index(&self, action: &Action) -> Option<usize> {
            match action {
                Action::BuildRoad(EdgeId(i)) if *i < 4 => Some(usize::from(*i)),
                _ => None,
            }
        }
    }

    /// Policy favours higher slots; seat `i` is worth `i / 10`.
    struct Ramp;

    impl PolicyValueNetwork for Ramp {
        fn predict(&self, _: &EncodedState) -> Result<NetworkOutput, EvaluatorError> {
            Ok(NetworkOutput {
                policy: vec![0.1, 0.2, 0.3, 0.4],
                values: vec![0.0, 0.1, 0.2, 0.3],
            })
        }
    }

    #[test]
    fn test_prior_follows_policy_slots() {
        let eval = NetworkEvaluator::new(TinyEncoder, Ramp);
        let candidates = vec![Action::BuildRoad(EdgeId(3)), Action::EndTurn, Action::BuildRoad(EdgeId(1))];
        let result = eval.score(&0, PlayerId::new(2), &candidates).unwrap();

        assert!((result.value - 0.2).abs() < 1e-6);
        let prior = result.normalized_prior(3);
        assert!((prior[0] - 4.0 / 6.0).abs() < 1e-6);
        assert_eq!(prior[1], 0.0);
        assert!((prior[2] - 2.0 / 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_value_only_without_candidates() {
        let eval = NetworkEvaluator::new(TinyEncoder, Ramp);
        let result = eval.score(&0, PlayerId::new(3), &[]).unwrap();
        assert!(result.prior.is_none());
        assert!((result.value - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_shape_errors() {
        let wrong_head = NetworkEvaluator::new(TinyEncoder, UniformPolicyZeroValue::new(7, 4));
        let err = wrong_head
            .score(&0, PlayerId::new(0), &[Action::EndTurn])
            .unwrap_err();
        assert_eq!(err, EvaluatorError::PriorShape { expected: 4, got: 7 });

        let two_seats = NetworkEvaluator::new(TinyEncoder, UniformPolicyZeroValue::new(4, 2));
        assert!(matches!(
            two_seats.score(&0, PlayerId::new(3), &[]),
            Err(EvaluatorError::Inference(_))
        ));
    }
}

//! Network traits for policy and value prediction.
//!
//! The search never talks to a model directly; `NetworkEvaluator` adapts a
//! `PolicyValueNetwork` to the search's `Evaluator` seam. Model loading and
//! weights stay with the implementor.

use serde::{Deserialize, Serialize};

use crate::core::EvaluatorError;

/// Encoded game state as a flat tensor for network input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncodedState {
    /// Flattened tensor data (row-major order).
    pub tensor: Vec<f32>,

    /// Shape of the tensor, e.g. `[features]`.
    pub shape: Vec<usize>,
}

impl EncodedState {
    pub fn new(tensor: Vec<f32>, shape: Vec<usize>) -> Self {
        debug_assert_eq!(
            tensor.len(),
            shape.iter().product::<usize>(),
            "Tensor length must match shape product"
        );
        Self { tensor, shape }
    }

    /// Zero-filled tensor of the given shape.
    pub fn zeros(shape: Vec<usize>) -> Self {
        let size = shape.iter().product();
        Self {
            tensor: vec![0.0; size],
            shape,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tensor.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tensor.is_empty()
    }
}

/// One forward pass: a policy over the encoder's action space and one
/// value per seat.
#[derive(Clone, Debug, PartialEq)]
pub struct NetworkOutput {
    pub policy: Vec<f32>,
    pub values: Vec<f32>,
}

/// Combined policy-value network.
///
/// Inference may fail (device loss, bad weights); the search treats such a
/// failure as the evaluator being unavailable for that state.
pub trait PolicyValueNetwork: Send + Sync {
    fn predict(&self, encoded: &EncodedState) -> Result<NetworkOutput, EvaluatorError>;
}

/// Uniform policy and zero value (baseline for tests and cold starts).
#[derive(Clone, Debug, Default)]
pub struct UniformPolicyZeroValue {
    action_space_size: usize,
    player_count: usize,
}

impl UniformPolicyZeroValue {
    pub fn new(action_space_size: usize, player_count: usize) -> Self {
        Self {
            action_space_size,
            player_count,
        }
    }
}

impl PolicyValueNetwork for UniformPolicyZeroValue {
    fn predict(&self, _encoded: &EncodedState) -> Result<NetworkOutput, EvaluatorError> {
        let policy = if self.action_space_size == 0 {
            vec![]
        } else {
            vec![1.0 / self.action_space_size as f32; self.action_space_size]
        };
        Ok(NetworkOutput {
            policy,
            values: vec![0.0; self.player_count],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoded_state() {
        let state = EncodedState::new(vec![1.0, 2.0, 3.0, 4.0], vec![2, 2]);
        assert_eq!(state.len(), 4);
        assert_eq!(state.shape, vec![2, 2]);
        assert!(EncodedState::zeros(vec![0]).is_empty());
        assert!(EncodedState::zeros(vec![3, 4]).tensor.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_uniform_policy_zero_value() {
        let network = UniformPolicyZeroValue::new(5, 4);
        let out = network.predict(&EncodedState::zeros(vec![10])).unwrap();

        assert_eq!(out.policy.len(), 5);
        assert_eq!(out.values, vec![0.0; 4]);
        assert!((out.policy.iter().sum::<f32>() - 1.0).abs() < 0.001);

        let empty = UniformPolicyZeroValue::default()
            .predict(&EncodedState::zeros(vec![1]))
            .unwrap();
        assert!(empty.policy.is_empty());
    }

    #[test]
    fn test_serialization() {
        let state = EncodedState::new(vec![1.0, 2.0, 3.0], vec![3]);
        let json = serde_json::to_string(&state).unwrap();
        let deserialized: EncodedState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, deserialized);
    }
}

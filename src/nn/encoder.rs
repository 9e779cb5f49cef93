//! State encoding for network input.
//!
//! Turns a game state into a tensor from one seat's perspective and maps
//! concrete actions onto the network's fixed policy head.

use crate::core::{Action, PlayerId};
use crate::nn::traits::EncodedState;

/// Encodes states of one game for a network.
///
/// Each encoder defines:
/// - How to convert a state to a tensor from a seat's perspective
/// - The shape of the output tensor
/// - The size of the policy head and where each action sits in it
pub trait StateEncoder<S>: Send + Sync {
    /// Encode `state` from `perspective`. Hidden information (other seats'
    /// hands) should be reduced to what the seat can see.
    fn encode(&self, state: &S, perspective: PlayerId) -> EncodedState;

    fn output_shape(&self) -> Vec<usize>;

    /// Size of the policy output vector.
    fn action_space_size(&self) -> usize;

    /// Policy-head slot of `action`, `None` if the head does not cover it.
    fn action_index(&self, action: &Action) -> Option<usize>;
}

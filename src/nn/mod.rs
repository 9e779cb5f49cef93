//! Learned-model integration.
//!
//! ## Overview
//!
//! - **Traits**: `PolicyValueNetwork` with a `UniformPolicyZeroValue` baseline
//! - **Encoding**: `StateEncoder` maps states to tensors and actions to
//!   policy slots
//! - **Adapter**: `NetworkEvaluator` plugs a network into the search
//!
//! ## Usage
//!
//! ```rust
//! use hexsettle_search::core::PlayerId;
//! use hexsettle_search::games::settlers::{SettlersEncoder, SettlersGame};
//! use hexsettle_search::nn::{NetworkEvaluator, StateEncoder, UniformPolicyZeroValue};
//! use hexsettle_search::rules::RulesEngine;
//! use hexsettle_search::search::Evaluator;
//!
//! let game = SettlersGame::builder().build();
//! let state = game.initial_state();
//!
//! let encoder = SettlersEncoder::new(game.board(), game.player_count());
//! let network = UniformPolicyZeroValue::new(encoder.action_space_size(), game.player_count());
//! let evaluator = NetworkEvaluator::new(encoder, network);
//!
//! let legal = game.legal_actions(&state);
//! let scored = evaluator.score(&state, PlayerId::new(0), &legal).unwrap();
//! assert_eq!(scored.value, 0.0);
//! ```

pub mod encoder;
pub mod evaluator;
pub mod traits;

pub use encoder::StateEncoder;
pub use evaluator::NetworkEvaluator;
pub use traits::{EncodedState, NetworkOutput, PolicyValueNetwork, UniformPolicyZeroValue};

//! Core types shared by the search and its collaborators: seats, per-seat
//! storage, actions, phases, errors and the seeded RNG.
//!
//! Nothing in here knows how the board works. The rules engine owns the
//! meaning of an action; the search only clones, compares and hashes them.

pub mod action;
pub mod error;
pub mod phase;
pub mod player;
pub mod rng;

pub use action::{Action, ActionRecord, EdgeId, HexId, Resource, Resources, VertexId};
pub use error::{EvaluatorError, SearchError};
pub use phase::GamePhase;
pub use player::{PlayerId, PlayerMap};
pub use rng::GameRng;

//! # hexsettle-search
//!
//! An anytime forward-search decision policy for a four-seat hex settlement
//! and trading game.
//!
//! ## Design Principles
//!
//! 1. **Rules Stay Outside**: The search only talks to a `RulesEngine` and an
//!    `Evaluator`. It never interprets board concepts.
//!
//! 2. **Always An Answer**: `ForwardSearch::decide` returns a legal action
//!    (or the configured default) whatever goes wrong underneath.
//!
//! 3. **Reproducible**: Every lane of work derives its randomness from the
//!    seed and its position, never from the worker that ran it.
//!
//! ## Architecture
//!
//! - **Bounded Candidates**: Phase-aware caps at the root and at interior
//!   nodes, prior-weighted sampling without replacement.
//!
//! - **Depth-Limited Lookahead**: Discounted backup, best child at the
//!   searching seat's nodes, prior-weighted expectation elsewhere.
//!
//! - **Parallel Lanes**: Candidates are farmed out to a fixed worker pool and
//!   collected against a wall-clock deadline.
//!
//! ## Modules
//!
//! - `core`: Seats, actions, phases, errors, RNG
//! - `rules`: `RulesEngine` trait for game implementations
//! - `search`: Forward search and its parts
//! - `nn`: Network traits and the learned-model evaluator adapter
//! - `games`: Reference game implementations

pub mod core;
pub mod games;
pub mod nn;
pub mod rules;
pub mod search;

// Re-export commonly used types
pub use crate::core::{
    Action, ActionRecord, EdgeId, EvaluatorError, GamePhase, GameRng, HexId, PlayerId, PlayerMap, Resource,
    Resources, SearchError, VertexId,
};

pub use crate::rules::{GameResult, RulesEngine, Transition};

pub use crate::search::{
    CandidateEstimate, CandidateStatus, EvaluationResult, Evaluator, ForwardSearch, PolicyTable, SearchConfig,
    SearchOutcome, SearchStats, SeatPolicy,
};

pub use crate::nn::{NetworkEvaluator, PolicyValueNetwork, StateEncoder};

//! Forward search for one seat's decision.
//!
//! ## Overview
//!
//! Each decision enumerates a bounded set of root candidates and estimates
//! every one of them with depth-limited, discounted lookahead:
//!
//! - **Candidates**: phase-aware caps, prior-weighted sampling without
//!   replacement, trade proposals filtered when switched off
//! - **Lookahead**: rollouts grow a small tree per candidate; the searching
//!   seat's nodes take the best child, every other seat's nodes the
//!   prior-weighted mean
//! - **Parallelism**: candidate lanes are farmed out to a fixed worker pool
//!   and merged by a coordinator that stops collecting at the deadline
//! - **Robustness**: `decide` always returns an action
//!
//! ## Usage
//!
//! ```rust
//! use std::time::Duration;
//!
//! use hexsettle_search::games::settlers::{HeuristicEvaluator, SettlersGame};
//! use hexsettle_search::rules::RulesEngine;
//! use hexsettle_search::search::{ForwardSearch, SearchConfig};
//!
//! let game = SettlersGame::builder().seed(7).build();
//! let state = game.initial_state();
//!
//! let config = SearchConfig::default()
//!     .with_thinking_time(Duration::from_millis(50))
//!     .with_max_depth(4);
//! let search = ForwardSearch::new(game, HeuristicEvaluator::default(), config).unwrap();
//!
//! let action = search.decide(&state);
//! assert!(search.rules().legal_actions(&state).contains(&action));
//! ```

pub mod budget;
pub mod candidates;
pub mod config;
pub mod evaluator;
pub mod forward;
pub mod node;
pub mod pool;
pub mod rollout;
pub mod seats;
pub mod select;
pub mod stats;
pub mod tree;

pub use budget::Deadline;
pub use candidates::{ActionGenerator, Candidate, Scope};
pub use config::SearchConfig;
pub use evaluator::{EvaluationResult, Evaluator};
pub use forward::{ForwardSearch, SearchOutcome};
pub use node::{Edge, NodeId, SearchNode};
pub use pool::{WorkerPool, WorkerResult, WorkerTask};
pub use rollout::RolloutEngine;
pub use seats::{PolicyTable, SeatPolicy, SeatPolicyError};
pub use select::{fallback_action, CandidateEstimate, CandidateStatus, DecisionSelector};
pub use stats::{SearchStats, WorkCounters};
pub use tree::SearchTree;

//! Rules engine seam.
//!
//! The board and its rules live outside this crate. Games implement
//! `RulesEngine` to tell the search:
//! - Which seat decides next and which actions it may take
//! - How an action turns one state into the next
//! - When the game is over
//!
//! The search calls into `RulesEngine` but never interprets board concepts.

pub mod engine;

pub use engine::{result_to_rewards, GameResult, RulesEngine, Transition};

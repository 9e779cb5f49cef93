//! Compact hex settlement and trading game.
//!
//! A deterministic stand-in for the full board game, small enough to search
//! through and rich enough to exercise every part of the decision policy:
//! - One to four seats on a radius-2 board (19 hexes, 54 sites, 72 roads)
//! - Snake-order opening with free settlements and roads
//! - Seeded dice, production, the robber on a 7
//! - Roads, settlements and cities; 4:1 bank trades
//! - 1-for-1 trade offers answered seat by seat, capped per turn
//!
//! First seat to the target points wins; at the turn limit the leader does.
//! Every building is worth its victory points as an immediate reward.

mod board;
mod encoder;
mod game;
mod heuristic;
mod state;

pub use board::{pips, Board, HexTile};
pub use encoder::SettlersEncoder;
pub use game::{SettlersGame, SettlersGameBuilder};
pub use heuristic::HeuristicEvaluator;
pub use state::{Building, SettlersState, Step, TradeOffer};

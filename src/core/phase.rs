//! Game phase marker.

use serde::{Deserialize, Serialize};

/// Coarse phase of the game as seen by the decision policy.
///
/// The search only distinguishes the opening placement rounds, where every
/// seat puts down its first settlements and roads, from the rest of the game.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    /// Opening settlement and road placement.
    InitialPlacement,
    /// Dice, production, building and trading.
    #[default]
    Main,
}

impl GamePhase {
    /// True during the opening placement rounds.
    #[must_use]
    pub const fn is_placement(self) -> bool {
        matches!(self, GamePhase::InitialPlacement)
    }
}

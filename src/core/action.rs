//! Action representation.
//!
//! An `Action` is a tagged variant over the move kinds of the hex settlement
//! game, carrying everything needed to apply it. Actions are immutable values:
//! the search clones, compares and hashes them but never interprets them
//! beyond the trade-proposal and placement checks below.

use serde::{Deserialize, Serialize};

use super::player::PlayerId;

/// Board vertex (settlement/city site).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VertexId(pub u8);

/// Board edge (road site).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeId(pub u8);

/// Board hex (production tile, robber location).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HexId(pub u8);

/// Tradeable resource kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Resource {
    Brick,
    Lumber,
    Wool,
    Grain,
    Ore,
}

impl Resource {
    /// All resources in a fixed order.
    pub const ALL: [Resource; 5] = [
        Resource::Brick,
        Resource::Lumber,
        Resource::Wool,
        Resource::Grain,
        Resource::Ore,
    ];

    /// Position of this resource in `Resource::ALL`.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// A bundle of resource counts, indexed by `Resource`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resources(pub [u8; 5]);

impl Resources {
    /// Empty bundle.
    pub const EMPTY: Resources = Resources([0; 5]);

    /// Bundle holding `count` of a single resource.
    #[must_use]
    pub fn of(resource: Resource, count: u8) -> Self {
        let mut bundle = Self::EMPTY;
        bundle.0[resource.index()] = count;
        bundle
    }

    /// Count of one resource.
    #[must_use]
    pub fn get(&self, resource: Resource) -> u8 {
        self.0[resource.index()]
    }

    /// Total number of cards in the bundle.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.0.iter().map(|&c| u32::from(c)).sum()
    }

    /// True if every count in `other` is covered by `self`.
    #[must_use]
    pub fn covers(&self, other: &Resources) -> bool {
        self.0.iter().zip(other.0.iter()).all(|(have, need)| have >= need)
    }

    /// Add `other` to this bundle, saturating at `u8::MAX`.
    #[must_use]
    pub fn plus(&self, other: &Resources) -> Self {
        let mut out = *self;
        for (slot, add) in out.0.iter_mut().zip(other.0.iter()) {
            *slot = slot.saturating_add(*add);
        }
        out
    }

    /// Remove `other` from this bundle. `None` if it is not covered.
    #[must_use]
    pub fn minus(&self, other: &Resources) -> Option<Self> {
        if !self.covers(other) {
            return None;
        }
        let mut out = *self;
        for (slot, sub) in out.0.iter_mut().zip(other.0.iter()) {
            *slot -= *sub;
        }
        Some(out)
    }
}

/// A complete game action.
///
/// ```
/// use hexsettle_search::core::{Action, Resource, Resources, VertexId};
///
/// let opening = Action::PlaceSettlement(VertexId(4));
/// assert!(opening.is_placement());
///
/// let offer = Action::ProposeTrade {
///     give: Resources::of(Resource::Ore, 1),
///     get: Resources::of(Resource::Wool, 1),
/// };
/// assert!(offer.is_trade_proposal());
/// assert!(!Action::AcceptTrade.is_trade_proposal());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Opening round: free settlement.
    PlaceSettlement(VertexId),
    /// Opening round: free road next to the settlement just placed.
    PlaceRoad(EdgeId),
    /// Roll the dice to start the main part of a turn.
    RollDice,
    BuildSettlement(VertexId),
    BuildCity(VertexId),
    BuildRoad(EdgeId),
    /// Move the robber and optionally steal from a seat touching the hex.
    MoveRobber {
        hex: HexId,
        victim: Option<PlayerId>,
    },
    /// Give cards to the bank at the bank rate.
    BankTrade { give: Resource, get: Resource },
    /// Offer a trade to the other seats.
    ProposeTrade { give: Resources, get: Resources },
    /// Respond to a pending offer.
    AcceptTrade,
    RejectTrade,
    EndTurn,
}

impl Action {
    /// True for actions that put a new trade offer on the table.
    ///
    /// Responses to someone else's offer are not proposals.
    #[must_use]
    pub fn is_trade_proposal(&self) -> bool {
        matches!(self, Action::ProposeTrade { .. })
    }

    /// True for opening-round placements.
    #[must_use]
    pub fn is_placement(&self) -> bool {
        matches!(self, Action::PlaceSettlement(_) | Action::PlaceRoad(_))
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::PlaceSettlement(v) => write!(f, "place settlement @v{}", v.0),
            Action::PlaceRoad(e) => write!(f, "place road @e{}", e.0),
            Action::RollDice => write!(f, "roll"),
            Action::BuildSettlement(v) => write!(f, "settlement @v{}", v.0),
            Action::BuildCity(v) => write!(f, "city @v{}", v.0),
            Action::BuildRoad(e) => write!(f, "road @e{}", e.0),
            Action::MoveRobber { hex, victim } => match victim {
                Some(p) => write!(f, "robber @h{} steal from {}", hex.0, p),
                None => write!(f, "robber @h{}", hex.0),
            },
            Action::BankTrade { give, get } => write!(f, "bank {:?} -> {:?}", give, get),
            Action::ProposeTrade { give, get } => {
                write!(f, "propose {:?} for {:?}", give.0, get.0)
            }
            Action::AcceptTrade => write!(f, "accept trade"),
            Action::RejectTrade => write!(f, "reject trade"),
            Action::EndTurn => write!(f, "end turn"),
        }
    }
}

/// A recorded action with the seat that took it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// The seat that acted.
    pub player: PlayerId,

    /// The action taken.
    pub action: Action,

    /// Turn number when the action was taken.
    pub turn: u32,
}

impl ActionRecord {
    /// Create a new action record.
    #[must_use]
    pub fn new(player: PlayerId, action: Action, turn: u32) -> Self {
        Self {
            player,
            action,
            turn,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_arithmetic() {
        let hand = Resources([2, 1, 0, 0, 3]);
        let cost = Resources([1, 1, 0, 0, 0]);

        assert!(hand.covers(&cost));
        assert_eq!(hand.minus(&cost), Some(Resources([1, 0, 0, 0, 3])));
        assert_eq!(cost.minus(&hand), None);
        assert_eq!(hand.plus(&cost).total(), 8);
        assert_eq!(Resources::of(Resource::Wool, 2).get(Resource::Wool), 2);
    }

    #[test]
    fn test_action_kinds() {
        assert!(Action::PlaceRoad(EdgeId(1)).is_placement());
        assert!(!Action::BuildRoad(EdgeId(1)).is_placement());
        assert!(!Action::BankTrade {
            give: Resource::Ore,
            get: Resource::Brick
        }
        .is_trade_proposal());
        assert!(!Action::RejectTrade.is_trade_proposal());
    }

    #[test]
    fn test_action_hash_and_equality() {
        use rustc_hash::FxHashSet;

        let mut seen = FxHashSet::default();
        assert!(seen.insert(Action::BuildCity(VertexId(3))));
        assert!(!seen.insert(Action::BuildCity(VertexId(3))));
        assert!(seen.insert(Action::BuildSettlement(VertexId(3))));
    }

    #[test]
    fn test_action_display() {
        assert_eq!(Action::EndTurn.to_string(), "end turn");
        let robber = Action::MoveRobber {
            hex: HexId(2),
            victim: Some(PlayerId::new(1)),
        };
        assert_eq!(robber.to_string(), "robber @h2 steal from Seat 1");
    }

    #[test]
    fn test_action_serialization() {
        let action = Action::ProposeTrade {
            give: Resources::of(Resource::Brick, 2),
            get: Resources::of(Resource::Ore, 1),
        };
        let json = serde_json::to_string(&action).unwrap();
        let deserialized: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(action, deserialized);
    }
}

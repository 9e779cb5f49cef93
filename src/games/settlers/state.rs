//! Game state for the settlers game.
//!
//! Persistent maps (`im::OrdMap`) make a clone O(1), which is what the
//! search does once per simulated transition. Ordered maps keep iteration
//! deterministic across clones.

use std::sync::Arc;

use im::{OrdMap, Vector};

use crate::core::{ActionRecord, EdgeId, GamePhase, HexId, PlayerId, PlayerMap, Resources, VertexId};

use super::board::Board;

/// A settlement or city.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Building {
    pub owner: PlayerId,
    pub city: bool,
}

impl Building {
    /// Victory points and production multiplier.
    #[must_use]
    pub fn points(&self) -> u8 {
        if self.city {
            2
        } else {
            1
        }
    }
}

/// An open 1-for-1 style offer waiting for answers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TradeOffer {
    pub from: PlayerId,
    /// What the proposer hands over.
    pub give: Resources,
    /// What the proposer wants back.
    pub get: Resources,
    /// Seat currently asked.
    pub responder: PlayerId,
}

/// What the state is waiting for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    PlaceSettlement,
    /// Opening road, which must touch the settlement just placed.
    PlaceRoad { from: VertexId },
    Roll,
    MoveRobber,
    /// Build, trade or end the turn.
    Act,
    Respond(TradeOffer),
}

/// Full game state.
#[derive(Clone, Debug)]
pub struct SettlersState {
    pub(crate) board: Arc<Board>,
    pub(crate) seed: u64,
    pub(crate) phase: GamePhase,
    pub(crate) turn: u32,
    /// Position in the snake placement order.
    pub(crate) placement: usize,
    pub(crate) current: PlayerId,
    pub(crate) step: Step,
    pub(crate) hands: PlayerMap<Resources>,
    pub(crate) buildings: OrdMap<VertexId, Building>,
    pub(crate) roads: OrdMap<EdgeId, PlayerId>,
    pub(crate) robber: HexId,
    pub(crate) trades_this_turn: u8,
    pub(crate) last_roll: Option<u8>,
    pub(crate) history: Vector<ActionRecord>,
}

impl SettlersState {
    pub(crate) fn new(board: Arc<Board>, player_count: usize, seed: u64) -> Self {
        let robber = board.desert();
        Self {
            board,
            seed,
            phase: GamePhase::InitialPlacement,
            turn: 0,
            placement: 0,
            current: PlayerId::new(0),
            step: Step::PlaceSettlement,
            hands: PlayerMap::with_value(player_count, Resources::EMPTY),
            buildings: OrdMap::new(),
            roads: OrdMap::new(),
            robber,
            trades_this_turn: 0,
            last_roll: None,
            history: Vector::new(),
        }
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.hands.player_count()
    }

    #[must_use]
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Main-phase turn number, 0 during placement.
    #[must_use]
    pub fn turn(&self) -> u32 {
        self.turn
    }

    /// Seat whose turn it is (not necessarily the one to move).
    #[must_use]
    pub fn current(&self) -> PlayerId {
        self.current
    }

    #[must_use]
    pub fn step(&self) -> Step {
        self.step
    }

    /// Seat that decides next: the responder while an offer is open.
    #[must_use]
    pub fn to_move(&self) -> PlayerId {
        match self.step {
            Step::Respond(offer) => offer.responder,
            _ => self.current,
        }
    }

    #[must_use]
    pub fn hand(&self, player: PlayerId) -> Resources {
        self.hands[player]
    }

    #[must_use]
    pub fn building(&self, v: VertexId) -> Option<Building> {
        self.buildings.get(&v).copied()
    }

    #[must_use]
    pub fn road(&self, e: EdgeId) -> Option<PlayerId> {
        self.roads.get(&e).copied()
    }

    #[must_use]
    pub fn robber(&self) -> HexId {
        self.robber
    }

    #[must_use]
    pub fn last_roll(&self) -> Option<u8> {
        self.last_roll
    }

    #[must_use]
    pub fn trades_this_turn(&self) -> u8 {
        self.trades_this_turn
    }

    /// Every action taken so far, in order.
    #[must_use]
    pub fn history(&self) -> &Vector<ActionRecord> {
        &self.history
    }

    /// Victory points of one seat.
    #[must_use]
    pub fn points(&self, player: PlayerId) -> u8 {
        self.buildings
            .values()
            .filter(|b| b.owner == player)
            .map(Building::points)
            .sum()
    }

    /// Victory points of every seat.
    #[must_use]
    pub fn all_points(&self) -> PlayerMap<u8> {
        PlayerMap::new(self.player_count(), |p| self.points(p))
    }

    /// Pieces on the board: (settlements, cities, roads).
    #[must_use]
    pub fn pieces(&self, player: PlayerId) -> (usize, usize, usize) {
        let (mut settlements, mut cities) = (0, 0);
        for b in self.buildings.values().filter(|b| b.owner == player) {
            if b.city {
                cities += 1;
            } else {
                settlements += 1;
            }
        }
        let roads = self.roads.values().filter(|&&p| p == player).count();
        (settlements, cities, roads)
    }

    /// Pips a seat collects per 36 rolls, cities counted twice, robber
    /// ignored.
    #[must_use]
    pub fn production_pips(&self, player: PlayerId) -> u32 {
        self.buildings
            .iter()
            .filter(|(_, b)| b.owner == player)
            .map(|(&v, b)| u32::from(self.board.vertex_pips(v)) * u32::from(b.points()))
            .sum()
    }
}

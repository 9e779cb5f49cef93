//! Network encoding for the settlers game.
//!
//! Seats are encoded relative to the perspective seat (slot 0 is always
//! "me"), so one network serves every seat. Opponent hands are reduced to
//! their card count.

use std::sync::Arc;

use crate::core::{Action, PlayerId, Resource, Resources};
use crate::nn::{EncodedState, StateEncoder};

use super::board::{pips, Board};
use super::state::{SettlersState, Step};

const HEX_FEATURES: usize = 8;
const SEAT_FEATURES: usize = 8;
const STEP_FEATURES: usize = 6;

/// Encoder for `SettlersState`.
///
/// Features:
/// - Per hex: terrain one-hot (5 resources + desert), pips / 5, robber
/// - Per vertex: settlement and city flags per relative seat
/// - Per edge: road flag per relative seat
/// - Per relative seat: hand (own cards only), card count, points, to-move
/// - Step one-hot
///
/// Policy head layout, in order: opening settlements (V), opening roads (E),
/// roll (1), settlements (V), cities (V), roads (E), robber moves
/// (H x (seats + 1), slot 0 = nobody robbed), bank trades (5 x 5), 1-for-1
/// proposals (5 x 5), accept, reject, end turn.
#[derive(Clone, Debug)]
pub struct SettlersEncoder {
    board: Arc<Board>,
    player_count: usize,
}

impl SettlersEncoder {
    pub fn new(board: Arc<Board>, player_count: usize) -> Self {
        Self { board, player_count }
    }

    fn relative(&self, seat: PlayerId, perspective: PlayerId) -> usize {
        (seat.index() + self.player_count - perspective.index()) % self.player_count
    }

    fn vertex_offset(&self) -> usize {
        self.board.hex_count() * HEX_FEATURES
    }

    fn edge_offset(&self) -> usize {
        self.vertex_offset() + self.board.vertex_count() * 2 * self.player_count
    }

    fn seat_offset(&self) -> usize {
        self.edge_offset() + self.board.edge_count() * self.player_count
    }

    fn step_offset(&self) -> usize {
        self.seat_offset() + self.player_count * SEAT_FEATURES
    }

    fn feature_count(&self) -> usize {
        self.step_offset() + STEP_FEATURES
    }
}

/// The single resource of a one-card bundle.
fn single(bundle: &Resources) -> Option<Resource> {
    if bundle.total() != 1 {
        return None;
    }
    Resource::ALL.into_iter().find(|&r| bundle.get(r) == 1)
}

impl StateEncoder<SettlersState> for SettlersEncoder {
    fn encode(&self, state: &SettlersState, perspective: PlayerId) -> EncodedState {
        let mut tensor = vec![0.0f32; self.feature_count()];
        let n = self.player_count;

        for hex in self.board.hex_ids() {
            let base = hex.0 as usize * HEX_FEATURES;
            let tile = self.board.hex(hex);
            let terrain = tile.resource.map_or(5, Resource::index);
            tensor[base + terrain] = 1.0;
            tensor[base + 6] = f32::from(pips(tile.number)) / 5.0;
            if state.robber() == hex {
                tensor[base + 7] = 1.0;
            }
        }

        for (&v, building) in state.buildings.iter() {
            let seat = self.relative(building.owner, perspective);
            let slot = if building.city { n + seat } else { seat };
            tensor[self.vertex_offset() + v.0 as usize * 2 * n + slot] = 1.0;
        }

        for (&e, &owner) in state.roads.iter() {
            let seat = self.relative(owner, perspective);
            tensor[self.edge_offset() + e.0 as usize * n + seat] = 1.0;
        }

        for seat in PlayerId::all(n) {
            let base = self.seat_offset() + self.relative(seat, perspective) * SEAT_FEATURES;
            let hand = state.hand(seat);
            if seat == perspective {
                for r in Resource::ALL {
                    tensor[base + r.index()] = f32::from(hand.get(r)) / 10.0;
                }
            }
            tensor[base + 5] = hand.total() as f32 / 20.0;
            tensor[base + 6] = f32::from(state.points(seat)) / 10.0;
            if state.to_move() == seat {
                tensor[base + 7] = 1.0;
            }
        }

        let step = match state.step() {
            Step::PlaceSettlement => 0,
            Step::PlaceRoad { .. } => 1,
            Step::Roll => 2,
            Step::MoveRobber => 3,
            Step::Act => 4,
            Step::Respond(_) => 5,
        };
        tensor[self.step_offset() + step] = 1.0;

        EncodedState::new(tensor, vec![self.feature_count()])
    }

    fn output_shape(&self) -> Vec<usize> {
        vec![self.feature_count()]
    }

    fn action_space_size(&self) -> usize {
        let (h, v, e) = (self.board.hex_count(), self.board.vertex_count(), self.board.edge_count());
        3 * v + 2 * e + 1 + h * (self.player_count + 1) + 25 + 25 + 3
    }

    fn action_index(&self, action: &Action) -> Option<usize> {
        let (h, v, e) = (self.board.hex_count(), self.board.vertex_count(), self.board.edge_count());
        let n = self.player_count;

        let place_road = v;
        let roll = place_road + e;
        let settlement = roll + 1;
        let city = settlement + v;
        let road = city + v;
        let robber = road + e;
        let bank = robber + h * (n + 1);
        let propose = bank + 25;
        let respond = propose + 25;

        let index = match action {
            Action::PlaceSettlement(x) => x.0 as usize,
            Action::PlaceRoad(x) => place_road + x.0 as usize,
            Action::RollDice => roll,
            Action::BuildSettlement(x) => settlement + x.0 as usize,
            Action::BuildCity(x) => city + x.0 as usize,
            Action::BuildRoad(x) => road + x.0 as usize,
            Action::MoveRobber { hex, victim } => {
                let slot = victim.map_or(0, |p| p.index() + 1);
                if slot > n {
                    return None;
                }
                robber + hex.0 as usize * (n + 1) + slot
            }
            Action::BankTrade { give, get } => bank + give.index() * 5 + get.index(),
            Action::ProposeTrade { give, get } => propose + single(give)?.index() * 5 + single(get)?.index(),
            Action::AcceptTrade => respond,
            Action::RejectTrade => respond + 1,
            Action::EndTurn => respond + 2,
        };
        (index < self.action_space_size()).then_some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EdgeId, HexId, VertexId};
    use crate::games::settlers::state::Building;
    use crate::games::settlers::SettlersGame;
    use crate::rules::RulesEngine;
    use rustc_hash::FxHashSet;

    fn setup() -> (SettlersGame, SettlersEncoder) {
        let game = SettlersGame::builder().seed(3).build();
        let encoder = SettlersEncoder::new(game.board(), game.player_count());
        (game, encoder)
    }

    #[test]
    fn test_shape() {
        let (game, encoder) = setup();
        let encoded = encoder.encode(&game.initial_state(), PlayerId::new(0));
        assert_eq!(encoded.shape, encoder.output_shape());
        assert_eq!(encoded.len(), 19 * 8 + 54 * 8 + 72 * 4 + 4 * 8 + 6);
    }

    #[test]
    fn test_perspective_is_relative() {
        let (game, encoder) = setup();
        let mut state = game.initial_state();
        state.buildings.insert(VertexId(7), Building { owner: PlayerId::new(2), city: false });

        let mine = encoder.encode(&state, PlayerId::new(2));
        let theirs = encoder.encode(&state, PlayerId::new(0));
        let slot = encoder.vertex_offset() + 7 * 8;
        assert_eq!(mine.tensor[slot], 1.0);
        assert_eq!(theirs.tensor[slot + 2], 1.0);
        assert_ne!(mine, theirs);
    }

    #[test]
    fn test_opponent_hands_hidden() {
        let (game, encoder) = setup();
        let mut state = game.initial_state();
        state.hands[PlayerId::new(1)] = Resources([3, 0, 0, 0, 0]);

        let encoded = encoder.encode(&state, PlayerId::new(0));
        let base = encoder.seat_offset() + SEAT_FEATURES;
        assert_eq!(encoded.tensor[base], 0.0);
        assert!(encoded.tensor[base + 5] > 0.0);

        let own = encoder.encode(&state, PlayerId::new(1));
        assert!((own.tensor[encoder.seat_offset()] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_action_indices_are_distinct() {
        let (_, encoder) = setup();
        let mut actions = vec![
            Action::RollDice,
            Action::AcceptTrade,
            Action::RejectTrade,
            Action::EndTurn,
            Action::PlaceSettlement(VertexId(53)),
            Action::PlaceRoad(EdgeId(0)),
            Action::BuildSettlement(VertexId(0)),
            Action::BuildCity(VertexId(53)),
            Action::BuildRoad(EdgeId(71)),
            Action::MoveRobber { hex: HexId(18), victim: Some(PlayerId::new(3)) },
            Action::MoveRobber { hex: HexId(0), victim: None },
        ];
        for give in Resource::ALL {
            for get in Resource::ALL {
                actions.push(Action::BankTrade { give, get });
                actions.push(Action::ProposeTrade {
                    give: Resources::of(give, 1),
                    get: Resources::of(get, 1),
                });
            }
        }

        let mut seen = FxHashSet::default();
        for action in &actions {
            let index = encoder.action_index(action).unwrap();
            assert!(index < encoder.action_space_size());
            assert!(seen.insert(index), "{action} collides");
        }
        assert_eq!(encoder.action_index(&Action::EndTurn), Some(encoder.action_space_size() - 1));
    }

    #[test]
    fn test_uncovered_actions() {
        let (_, encoder) = setup();
        let bulk = Action::ProposeTrade {
            give: Resources::of(Resource::Ore, 2),
            get: Resources::of(Resource::Wool, 1),
        };
        assert_eq!(encoder.action_index(&bulk), None);
        let seat_nine = Action::MoveRobber { hex: HexId(1), victim: Some(PlayerId::new(9)) };
        assert_eq!(encoder.action_index(&seat_nine), None);
    }

    #[test]
    fn test_legal_actions_all_covered() {
        let (game, encoder) = setup();
        let state = game.initial_state();
        for action in game.legal_actions(&state) {
            assert!(encoder.action_index(&action).is_some());
        }
    }
}

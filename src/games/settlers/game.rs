//! Rules of the settlers game.

use std::sync::Arc;

use crate::core::{
    Action, ActionRecord, EdgeId, GamePhase, GameRng, HexId, PlayerId, PlayerMap, Resource, Resources, SearchError,
    VertexId,
};
use crate::rules::{GameResult, RulesEngine, Transition};

use super::board::Board;
use super::state::{Building, SettlersState, Step, TradeOffer};

const ROAD_COST: Resources = Resources([1, 1, 0, 0, 0]);
const SETTLEMENT_COST: Resources = Resources([1, 1, 1, 1, 0]);
const CITY_COST: Resources = Resources([0, 0, 0, 2, 3]);
const BANK_RATE: u8 = 4;

const MAX_SETTLEMENTS: usize = 5;
const MAX_CITIES: usize = 4;
const MAX_ROADS: usize = 15;

/// Compact four-seat settlement game.
///
/// Opening placement in snake order, then turns of roll, robber on a 7,
/// building, 4:1 bank trades and 1-for-1 offers to the other seats. Dice are
/// derived from the game seed and the turn number, so `apply` is a pure
/// function of its inputs. Rewards are victory-point changes.
#[derive(Clone, Debug)]
pub struct SettlersGame {
    board: Arc<Board>,
    player_count: usize,
    target_points: u8,
    turn_limit: u32,
    max_trades_per_turn: u8,
    seed: u64,
}

/// Builder for creating a SettlersGame.
pub struct SettlersGameBuilder {
    player_count: usize,
    board_radius: u8,
    target_points: u8,
    turn_limit: u32,
    max_trades_per_turn: u8,
    seed: u64,
}

impl Default for SettlersGameBuilder {
    fn default() -> Self {
        Self {
            player_count: 4,
            board_radius: 2,
            target_points: 10,
            turn_limit: 200,
            max_trades_per_turn: 4,
            seed: 0,
        }
    }
}

impl SettlersGameBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn player_count(mut self, count: usize) -> Self {
        assert!((1..=4).contains(&count), "Player count must be 1-4");
        self.player_count = count;
        self
    }

    pub fn board_radius(mut self, radius: u8) -> Self {
        self.board_radius = radius;
        self
    }

    pub fn target_points(mut self, points: u8) -> Self {
        self.target_points = points;
        self
    }

    /// Last main-phase turn; the game ends after it.
    pub fn turn_limit(mut self, turns: u32) -> Self {
        self.turn_limit = turns;
        self
    }

    /// Offers a seat may make per turn. 0 switches proposals off.
    pub fn max_trades_per_turn(mut self, trades: u8) -> Self {
        self.max_trades_per_turn = trades;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn build(self) -> SettlersGame {
        let board = Board::generate(self.board_radius, &mut GameRng::new(self.seed));
        SettlersGame {
            board: Arc::new(board),
            player_count: self.player_count,
            target_points: self.target_points,
            turn_limit: self.turn_limit,
            max_trades_per_turn: self.max_trades_per_turn,
            seed: self.seed,
        }
    }
}

impl SettlersGame {
    pub fn builder() -> SettlersGameBuilder {
        SettlersGameBuilder::new()
    }

    /// Fresh state at the start of opening placement.
    #[must_use]
    pub fn initial_state(&self) -> SettlersState {
        SettlersState::new(Arc::clone(&self.board), self.player_count, self.seed)
    }

    #[must_use]
    pub fn board(&self) -> Arc<Board> {
        Arc::clone(&self.board)
    }

    #[must_use]
    pub fn target_points(&self) -> u8 {
        self.target_points
    }

    #[must_use]
    pub fn max_trades_per_turn(&self) -> u8 {
        self.max_trades_per_turn
    }

    /// Seat placing at position `i` of the snake order.
    fn placement_seat(&self, i: usize) -> PlayerId {
        let n = self.player_count;
        let idx = if i < n { i } else { 2 * n - 1 - i };
        PlayerId::new(idx as u8)
    }

    /// Dice for the current turn: two d6 from (seed, turn).
    #[must_use]
    pub fn dice(&self, state: &SettlersState) -> (u8, u8) {
        let mut rng = GameRng::new(state.seed).derive(&[u64::from(state.turn)]);
        (rng.roll(6), rng.roll(6))
    }

    // === Legality ===

    fn site_free(state: &SettlersState, v: VertexId) -> bool {
        state.building(v).is_none()
            && state.board.neighbors(v).iter().all(|&w| state.building(w).is_none())
    }

    fn can_place_settlement(state: &SettlersState, v: VertexId) -> bool {
        (v.0 as usize) < state.board.vertex_count() && Self::site_free(state, v)
    }

    fn can_place_road(state: &SettlersState, from: VertexId, e: EdgeId) -> bool {
        (e.0 as usize) < state.board.edge_count()
            && state.road(e).is_none()
            && state.board.endpoints(e).contains(&from)
    }

    fn can_build_settlement(state: &SettlersState, player: PlayerId, v: VertexId) -> bool {
        (v.0 as usize) < state.board.vertex_count()
            && state.hand(player).covers(&SETTLEMENT_COST)
            && state.pieces(player).0 < MAX_SETTLEMENTS
            && Self::site_free(state, v)
            && state.board.edges_at(v).iter().any(|&e| state.road(e) == Some(player))
    }

    fn can_build_city(state: &SettlersState, player: PlayerId, v: VertexId) -> bool {
        state.hand(player).covers(&CITY_COST)
            && state.pieces(player).1 < MAX_CITIES
            && state.building(v) == Some(Building { owner: player, city: false })
    }

    fn can_build_road(state: &SettlersState, player: PlayerId, e: EdgeId) -> bool {
        if (e.0 as usize) >= state.board.edge_count()
            || state.road(e).is_some()
            || !state.hand(player).covers(&ROAD_COST)
            || state.pieces(player).2 >= MAX_ROADS
        {
            return false;
        }
        state.board.endpoints(e).iter().any(|&v| match state.building(v) {
            Some(b) => b.owner == player,
            None => state.board.edges_at(v).iter().any(|&f| state.road(f) == Some(player)),
        })
    }

    /// Opponents with a building on `hex` and at least one card, in seat
    /// order.
    fn victims(state: &SettlersState, thief: PlayerId, hex: HexId) -> Vec<PlayerId> {
        let mut victims: Vec<PlayerId> = state
            .board
            .corners(hex)
            .iter()
            .filter_map(|&v| state.building(v))
            .map(|b| b.owner)
            .filter(|&p| p != thief && state.hand(p).total() > 0)
            .collect();
        victims.sort_unstable();
        victims.dedup();
        victims
    }

    fn can_propose(&self, state: &SettlersState) -> bool {
        self.player_count > 1 && state.trades_this_turn < self.max_trades_per_turn
    }

    fn is_legal(&self, state: &SettlersState, action: &Action) -> Result<(), &'static str> {
        let player = state.to_move();
        let ok = match (state.step, action) {
            (Step::PlaceSettlement, Action::PlaceSettlement(v)) => Self::can_place_settlement(state, *v),
            (Step::PlaceRoad { from }, Action::PlaceRoad(e)) => Self::can_place_road(state, from, *e),
            (Step::Roll, Action::RollDice) => true,
            (Step::MoveRobber, Action::MoveRobber { hex, victim }) => {
                (hex.0 as usize) < state.board.hex_count()
                    && *hex != state.robber
                    && match victim {
                        Some(p) => Self::victims(state, player, *hex).contains(p),
                        None => Self::victims(state, player, *hex).is_empty(),
                    }
            }
            (Step::Act, Action::BuildSettlement(v)) => Self::can_build_settlement(state, player, *v),
            (Step::Act, Action::BuildCity(v)) => Self::can_build_city(state, player, *v),
            (Step::Act, Action::BuildRoad(e)) => Self::can_build_road(state, player, *e),
            (Step::Act, Action::BankTrade { give, get }) => {
                give != get && state.hand(player).get(*give) >= BANK_RATE
            }
            (Step::Act, Action::ProposeTrade { give, get }) => {
                self.can_propose(state)
                    && give.total() > 0
                    && get.total() > 0
                    && state.hand(player).covers(give)
            }
            (Step::Act, Action::EndTurn) => true,
            (Step::Respond(offer), Action::AcceptTrade) => state.hand(offer.responder).covers(&offer.get),
            (Step::Respond(_), Action::RejectTrade) => true,
            _ => return Err("not available at this step"),
        };
        if ok {
            Ok(())
        } else {
            Err("requirements not met")
        }
    }

    // === Transitions ===

    fn produce(state: &mut SettlersState, roll: u8) {
        let board = Arc::clone(&state.board);
        for hex in board.hex_ids() {
            let tile = board.hex(hex);
            let Some(resource) = tile.resource else {
                continue;
            };
            if tile.number != roll || hex == state.robber {
                continue;
            }
            for &v in board.corners(hex) {
                if let Some(b) = state.building(v) {
                    let gain = Resources::of(resource, b.points());
                    state.hands[b.owner] = state.hands[b.owner].plus(&gain);
                }
            }
        }
    }

    fn steal(state: &mut SettlersState, thief: PlayerId, victim: PlayerId) {
        let hand = state.hand(victim);
        let weights: Vec<f32> = hand.0.iter().map(|&c| f32::from(c)).collect();
        let mut rng = GameRng::new(state.seed).derive(&[u64::from(state.turn), 7]);
        if let Some(i) = rng.choose_weighted(&weights) {
            let card = Resources::of(Resource::ALL[i], 1);
            if let Some(rest) = hand.minus(&card) {
                state.hands[victim] = rest;
                state.hands[thief] = state.hands[thief].plus(&card);
            }
        }
    }

    fn pay(state: &mut SettlersState, player: PlayerId, cost: &Resources) {
        if let Some(rest) = state.hand(player).minus(cost) {
            state.hands[player] = rest;
        }
    }

    fn advance_placement(&self, state: &mut SettlersState) {
        state.placement += 1;
        if state.placement >= 2 * self.player_count {
            state.phase = GamePhase::Main;
            state.turn = 1;
            state.current = PlayerId::new(0);
            state.step = Step::Roll;
        } else {
            state.current = self.placement_seat(state.placement);
            state.step = Step::PlaceSettlement;
        }
    }

    fn step(&self, state: &mut SettlersState, action: &Action) {
        let player = state.to_move();
        match (state.step, action) {
            (_, Action::PlaceSettlement(v)) => {
                state.buildings.insert(*v, Building { owner: player, city: false });
                // second round placements pay out their surroundings
                if state.placement >= self.player_count {
                    let board = Arc::clone(&state.board);
                    for &h in board.hexes_at(*v) {
                        if let Some(resource) = board.hex(h).resource {
                            state.hands[player] = state.hands[player].plus(&Resources::of(resource, 1));
                        }
                    }
                }
                state.step = Step::PlaceRoad { from: *v };
            }
            (_, Action::PlaceRoad(e)) => {
                state.roads.insert(*e, player);
                self.advance_placement(state);
            }
            (_, Action::RollDice) => {
                let (a, b) = self.dice(state);
                let roll = a + b;
                state.last_roll = Some(roll);
                if roll == 7 {
                    state.step = Step::MoveRobber;
                } else {
                    Self::produce(state, roll);
                    state.step = Step::Act;
                }
            }
            (_, Action::MoveRobber { hex, victim }) => {
                state.robber = *hex;
                if let Some(victim) = victim {
                    Self::steal(state, player, *victim);
                }
                state.step = Step::Act;
            }
            (_, Action::BuildSettlement(v)) => {
                Self::pay(state, player, &SETTLEMENT_COST);
                state.buildings.insert(*v, Building { owner: player, city: false });
            }
            (_, Action::BuildCity(v)) => {
                Self::pay(state, player, &CITY_COST);
                state.buildings.insert(*v, Building { owner: player, city: true });
            }
            (_, Action::BuildRoad(e)) => {
                Self::pay(state, player, &ROAD_COST);
                state.roads.insert(*e, player);
            }
            (_, Action::BankTrade { give, get }) => {
                Self::pay(state, player, &Resources::of(*give, BANK_RATE));
                state.hands[player] = state.hands[player].plus(&Resources::of(*get, 1));
            }
            (_, Action::ProposeTrade { give, get }) => {
                state.trades_this_turn += 1;
                state.step = Step::Respond(TradeOffer {
                    from: player,
                    give: *give,
                    get: *get,
                    responder: player.next(self.player_count),
                });
            }
            (Step::Respond(offer), Action::AcceptTrade) => {
                Self::pay(state, offer.from, &offer.give);
                Self::pay(state, offer.responder, &offer.get);
                state.hands[offer.from] = state.hands[offer.from].plus(&offer.get);
                state.hands[offer.responder] = state.hands[offer.responder].plus(&offer.give);
                state.step = Step::Act;
            }
            (Step::Respond(offer), Action::RejectTrade) => {
                let next = offer.responder.next(self.player_count);
                state.step = if next == offer.from {
                    Step::Act
                } else {
                    Step::Respond(TradeOffer { responder: next, ..offer })
                };
            }
            (_, Action::EndTurn) => {
                state.turn += 1;
                state.current = state.current.next(self.player_count);
                state.step = Step::Roll;
                state.trades_this_turn = 0;
                state.last_roll = None;
            }
            _ => {}
        }
    }
}

impl RulesEngine for SettlersGame {
    type State = SettlersState;

    fn player_count(&self) -> usize {
        self.player_count
    }

    fn phase(&self, state: &SettlersState) -> GamePhase {
        state.phase
    }

    fn to_move(&self, state: &SettlersState) -> PlayerId {
        state.to_move()
    }

    fn legal_actions(&self, state: &SettlersState) -> Vec<Action> {
        if self.is_terminal(state).is_some() {
            return Vec::new();
        }
        let player = state.to_move();
        let board = &state.board;

        match state.step {
            Step::PlaceSettlement => board
                .vertex_ids()
                .filter(|&v| Self::can_place_settlement(state, v))
                .map(Action::PlaceSettlement)
                .collect(),
            Step::PlaceRoad { from } => board
                .edges_at(from)
                .iter()
                .filter(|&&e| Self::can_place_road(state, from, e))
                .map(|&e| Action::PlaceRoad(e))
                .collect(),
            Step::Roll => vec![Action::RollDice],
            Step::MoveRobber => {
                let mut actions = Vec::new();
                for hex in board.hex_ids().filter(|&h| h != state.robber) {
                    let victims = Self::victims(state, player, hex);
                    if victims.is_empty() {
                        actions.push(Action::MoveRobber { hex, victim: None });
                    }
                    actions.extend(victims.into_iter().map(|p| Action::MoveRobber { hex, victim: Some(p) }));
                }
                actions
            }
            Step::Act => {
                let mut actions: Vec<Action> = Vec::new();
                actions.extend(
                    board
                        .vertex_ids()
                        .filter(|&v| Self::can_build_settlement(state, player, v))
                        .map(Action::BuildSettlement),
                );
                actions.extend(
                    board
                        .vertex_ids()
                        .filter(|&v| Self::can_build_city(state, player, v))
                        .map(Action::BuildCity),
                );
                actions.extend(
                    board
                        .edge_ids()
                        .filter(|&e| Self::can_build_road(state, player, e))
                        .map(Action::BuildRoad),
                );

                let hand = state.hand(player);
                for give in Resource::ALL.into_iter().filter(|&r| hand.get(r) >= BANK_RATE) {
                    for get in Resource::ALL.into_iter().filter(|&r| r != give) {
                        actions.push(Action::BankTrade { give, get });
                    }
                }
                if self.can_propose(state) {
                    for give in Resource::ALL.into_iter().filter(|&r| hand.get(r) > 0) {
                        for get in Resource::ALL.into_iter().filter(|&r| r != give) {
                            actions.push(Action::ProposeTrade {
                                give: Resources::of(give, 1),
                                get: Resources::of(get, 1),
                            });
                        }
                    }
                }
                actions.push(Action::EndTurn);
                actions
            }
            Step::Respond(offer) => {
                let mut actions = Vec::with_capacity(2);
                if state.hand(offer.responder).covers(&offer.get) {
                    actions.push(Action::AcceptTrade);
                }
                actions.push(Action::RejectTrade);
                actions
            }
        }
    }

    fn apply(&self, state: &SettlersState, action: &Action) -> Result<Transition<SettlersState>, SearchError> {
        if self.is_terminal(state).is_some() {
            return Err(SearchError::illegal(action, "game is over"));
        }
        self.is_legal(state, action)
            .map_err(|reason| SearchError::illegal(action, reason))?;

        let before = state.all_points();
        let mut next = state.clone();
        let record = ActionRecord::new(state.to_move(), action.clone(), state.turn);
        self.step(&mut next, action);
        next.history.push_back(record);

        let after = next.all_points();
        let rewards = PlayerMap::new(self.player_count, |p| f64::from(after[p]) - f64::from(before[p]));
        Ok(Transition { state: next, rewards })
    }

    fn is_terminal(&self, state: &SettlersState) -> Option<GameResult> {
        let points = state.all_points();
        let winners: Vec<PlayerId> = points
            .iter()
            .filter(|&(_, &p)| p >= self.target_points)
            .map(|(seat, _)| seat)
            .collect();
        match winners.len() {
            0 if state.turn > self.turn_limit => Some(match points.leader() {
                Some(leader) => GameResult::Winner(leader),
                None => {
                    let best = points.iter().map(|(_, &p)| p).max().unwrap_or(0);
                    GameResult::Winners(points.iter().filter(|&(_, &p)| p == best).map(|(s, _)| s).collect())
                }
            }),
            0 => None,
            1 => Some(GameResult::Winner(winners[0])),
            _ => Some(GameResult::Winners(winners)),
        }
    }
}

//! Rules engine trait for game implementations.

use crate::core::{Action, GamePhase, PlayerId, PlayerMap, SearchError};

/// Result of a completed game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameResult {
    /// Single winner.
    Winner(PlayerId),
    /// Draw (no winner).
    Draw,
    /// Shared victory.
    Winners(Vec<PlayerId>),
}

impl GameResult {
    /// Check if a seat won.
    #[must_use]
    pub fn is_winner(&self, player: PlayerId) -> bool {
        match self {
            GameResult::Winner(p) => *p == player,
            GameResult::Winners(ps) => ps.contains(&player),
            GameResult::Draw => false,
        }
    }
}

/// Outcome of applying one action: the successor state plus the immediate
/// reward each seat received for it.
#[derive(Clone, Debug)]
pub struct Transition<S> {
    pub state: S,
    pub rewards: PlayerMap<f64>,
}

impl<S> Transition<S> {
    /// Reward for one seat.
    #[must_use]
    pub fn reward(&self, player: PlayerId) -> f64 {
        self.rewards[player]
    }
}

/// Rules engine trait.
///
/// ## Implementation Notes
///
/// - `legal_actions`: return an empty vec only for terminal states; an empty
///   set in a live state is reported as `NoLegalActions`
/// - `apply`: must not touch its input and must be deterministic for a given
///   state, otherwise seeded searches stop being reproducible
/// - `is_terminal`: `None` while the game continues
///
/// Implementations are shared read-only across workers, hence `Send + Sync`.
pub trait RulesEngine: Send + Sync {
    /// Immutable game snapshot. Cloned once per simulated transition, so it
    /// should be cheap to clone (persistent collections, `Arc`ed boards).
    type State: Clone + Send + Sync;

    /// Number of seats at the table.
    fn player_count(&self) -> usize;

    /// Phase marker of a state.
    fn phase(&self, state: &Self::State) -> GamePhase;

    /// The seat whose decision the state is waiting for.
    fn to_move(&self, state: &Self::State) -> PlayerId;

    /// All legal actions for the seat to move, in a stable order.
    fn legal_actions(&self, state: &Self::State) -> Vec<Action>;

    /// Apply an action, producing a new state and per-seat rewards.
    ///
    /// Fails with `SearchError::IllegalAction` if the action is not legal.
    fn apply(
        &self,
        state: &Self::State,
        action: &Action,
    ) -> Result<Transition<Self::State>, SearchError>;

    /// Check if the game is over.
    fn is_terminal(&self, state: &Self::State) -> Option<GameResult>;
}

/// Convert a game result to per-seat outcome values (1 win, 0 loss, ties
/// split).
pub fn result_to_rewards(result: &GameResult, player_count: usize) -> PlayerMap<f64> {
    PlayerMap::new(player_count, |player| match result {
        GameResult::Winner(winner) => {
            if *winner == player {
                1.0
            } else {
                0.0
            }
        }
        GameResult::Winners(winners) => {
            if winners.contains(&player) {
                1.0 / winners.len() as f64
            } else {
                0.0
            }
        }
        GameResult::Draw => 1.0 / player_count as f64,
    })
}

//! Forward-search configuration parameters.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{Action, SearchError};

/// Configuration snapshot for one decision.
///
/// Built once by the caller and passed by reference into every decision;
/// it is never modified while a decision runs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Maximum candidate actions considered at the root.
    pub max_init_actions: usize,

    /// Dedicated root cap for the main phase (`None` = use `max_init_actions`).
    pub max_main_actions: Option<usize>,

    /// Maximum distinct children expanded below any interior node.
    pub max_branching: usize,

    /// Maximum node depth. The root is depth 0 and its candidates depth 1;
    /// candidate successors are always evaluated, even with `max_depth = 0`.
    pub max_depth: u16,

    /// Discount factor for future rewards, `0 < gamma <= 1`.
    pub gamma: f64,

    /// Wall-clock thinking budget per decision.
    pub max_thinking_time: Duration,

    /// How long past the deadline in-flight tasks may still report back.
    /// Anything later is discarded.
    pub result_grace: Duration,

    /// Number of parallel workers (`<= 1` runs everything on the caller).
    pub num_workers: usize,

    /// During initial placement, evaluate every legal placement instead of a
    /// sampled subset.
    pub consider_all_opening_moves: bool,

    /// Never propose trades. Responses to other seats' offers are still
    /// considered.
    pub dont_propose_trades: bool,

    /// Rollouts run by one dispatched task before it reports back.
    pub rollouts_per_task: u32,

    /// Optional per-candidate rollout budget. When it binds before the
    /// deadline, results no longer depend on the clock.
    pub max_rollouts: Option<u32>,

    /// Action returned when the search cannot produce one.
    pub default_action: Action,

    /// Random seed for candidate sampling and rollouts.
    /// Same seed produces deterministic searches.
    pub seed: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_init_actions: 10,
            max_main_actions: None,
            max_branching: 3,
            max_depth: 15,
            gamma: 0.999,
            max_thinking_time: Duration::from_secs(10),
            result_grace: Duration::from_millis(50),
            num_workers: 1,
            consider_all_opening_moves: true,
            dont_propose_trades: true,
            rollouts_per_task: 8,
            max_rollouts: None,
            default_action: Action::EndTurn,
            seed: 42,
        }
    }
}

impl SearchConfig {
    /// Set the root candidate cap.
    pub fn with_max_init_actions(mut self, n: usize) -> Self {
        self.max_init_actions = n;
        self
    }

    /// Set a dedicated main-phase root cap.
    pub fn with_max_main_actions(mut self, n: usize) -> Self {
        self.max_main_actions = Some(n);
        self
    }

    /// Set the interior branching cap.
    pub fn with_max_branching(mut self, n: usize) -> Self {
        self.max_branching = n;
        self
    }

    /// Set the maximum node depth.
    pub fn with_max_depth(mut self, depth: u16) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the discount factor.
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    /// Set the thinking budget.
    pub fn with_thinking_time(mut self, budget: Duration) -> Self {
        self.max_thinking_time = budget;
        self
    }

    /// Set the worker count.
    pub fn with_workers(mut self, n: usize) -> Self {
        self.num_workers = n;
        self
    }

    /// Toggle exhaustive opening placement.
    pub fn with_all_opening_moves(mut self, all: bool) -> Self {
        self.consider_all_opening_moves = all;
        self
    }

    /// Toggle trade proposals.
    pub fn with_trades(mut self, allow_proposals: bool) -> Self {
        self.dont_propose_trades = !allow_proposals;
        self
    }

    /// Set the per-candidate rollout budget.
    pub fn with_max_rollouts(mut self, n: u32) -> Self {
        self.max_rollouts = Some(n);
        self
    }

    /// Set the rollouts per task.
    pub fn with_rollouts_per_task(mut self, n: u32) -> Self {
        self.rollouts_per_task = n;
        self
    }

    /// Set the fallback action.
    pub fn with_default_action(mut self, action: Action) -> Self {
        self.default_action = action;
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Root candidate cap for the main phase.
    #[must_use]
    pub fn main_phase_cap(&self) -> usize {
        self.max_main_actions.unwrap_or(self.max_init_actions)
    }

    /// Depth at which nodes stop being expanded.
    #[must_use]
    pub fn effective_max_depth(&self) -> u16 {
        self.max_depth.max(1)
    }

    /// Reject configurations the search cannot run with.
    pub fn validate(&self) -> Result<(), SearchError> {
        if !(self.gamma > 0.0 && self.gamma <= 1.0) {
            return Err(SearchError::InvalidConfig {
                msg: "gamma must be in (0, 1]",
            });
        }
        if self.max_init_actions == 0 || self.main_phase_cap() == 0 {
            return Err(SearchError::InvalidConfig {
                msg: "root candidate cap must be at least 1",
            });
        }
        if self.max_branching == 0 {
            return Err(SearchError::InvalidConfig {
                msg: "max_branching must be at least 1",
            });
        }
        if self.rollouts_per_task == 0 {
            return Err(SearchError::InvalidConfig {
                msg: "rollouts_per_task must be at least 1",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SearchConfig::default();
        assert_eq!(config.max_init_actions, 10);
        assert_eq!(config.max_depth, 15);
        assert!((config.gamma - 0.999).abs() < 1e-12);
        assert_eq!(config.max_thinking_time, Duration::from_secs(10));
        assert!(config.consider_all_opening_moves);
        assert!(config.dont_propose_trades);
        assert_eq!(config.default_action, Action::EndTurn);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = SearchConfig::default()
            .with_max_init_actions(4)
            .with_max_main_actions(6)
            .with_max_depth(0)
            .with_workers(4)
            .with_trades(true)
            .with_seed(123);

        assert_eq!(config.max_init_actions, 4);
        assert_eq!(config.main_phase_cap(), 6);
        assert_eq!(config.effective_max_depth(), 1);
        assert_eq!(config.num_workers, 4);
        assert!(!config.dont_propose_trades);
        assert_eq!(config.seed, 123);
    }

    #[test]
    fn test_validate() {
        let bad_gamma = SearchConfig::default().with_gamma(0.0);
        assert!(matches!(
            bad_gamma.validate(),
            Err(SearchError::InvalidConfig { .. })
        ));
        assert!(SearchConfig::default().with_gamma(1.0).validate().is_ok());
        assert!(SearchConfig::default().with_gamma(1.5).validate().is_err());
        assert!(SearchConfig::default().with_max_branching(0).validate().is_err());
        assert!(SearchConfig::default().with_max_main_actions(0).validate().is_err());
    }

    #[test]
    fn test_serialization() {
        let config = SearchConfig::default()
            .with_thinking_time(Duration::from_millis(1500))
            .with_max_rollouts(64);
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: SearchConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.max_thinking_time, Duration::from_millis(1500));
        assert_eq!(deserialized.max_rollouts, Some(64));
        assert_eq!(deserialized.seed, config.seed);
    }
}

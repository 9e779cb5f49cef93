//! Search statistics for diagnostics and tuning.

use serde::{Deserialize, Serialize};

/// Statistics collected during one decision.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Root candidates searched.
    pub candidates: u32,

    /// Tasks handed to workers.
    pub tasks_dispatched: u32,

    /// Task results merged into the candidate estimates.
    pub tasks_merged: u32,

    /// Task results that arrived too late, or never.
    pub tasks_discarded: u32,

    /// Rollouts completed across all candidates.
    pub rollouts: u64,

    /// Nodes added to the trees.
    pub nodes_expanded: u64,

    /// Evaluator calls, including the root prior.
    pub evaluator_calls: u64,

    /// Maximum depth reached.
    pub max_depth: u16,

    /// Wall-clock time for the decision (microseconds).
    pub time_us: u64,
}

impl SearchStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold per-task counters into the decision totals.
    pub fn absorb(&mut self, work: &WorkCounters) {
        self.rollouts += u64::from(work.rollouts);
        self.nodes_expanded += u64::from(work.nodes_expanded);
        self.evaluator_calls += u64::from(work.evaluator_calls);
        self.max_depth = self.max_depth.max(work.max_depth);
    }

    /// Rollouts per second.
    #[must_use]
    pub fn rollouts_per_second(&self) -> f64 {
        if self.time_us == 0 {
            0.0
        } else {
            self.rollouts as f64 / (self.time_us as f64 / 1_000_000.0)
        }
    }
}

/// Counters for one unit of worker output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkCounters {
    pub rollouts: u32,
    pub nodes_expanded: u32,
    pub evaluator_calls: u32,
    pub max_depth: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absorb() {
        let mut stats = SearchStats::new();
        stats.absorb(&WorkCounters {
            rollouts: 4,
            nodes_expanded: 10,
            evaluator_calls: 10,
            max_depth: 3,
        });
        stats.absorb(&WorkCounters {
            rollouts: 2,
            nodes_expanded: 1,
            evaluator_calls: 1,
            max_depth: 2,
        });

        assert_eq!(stats.rollouts, 6);
        assert_eq!(stats.nodes_expanded, 11);
        assert_eq!(stats.evaluator_calls, 11);
        assert_eq!(stats.max_depth, 3);
    }

    #[test]
    fn test_rollouts_per_second() {
        let mut stats = SearchStats::new();
        assert_eq!(stats.rollouts_per_second(), 0.0);
        stats.rollouts = 500;
        stats.time_us = 250_000;
        assert_eq!(stats.rollouts_per_second(), 2000.0);
    }

    #[test]
    fn test_stats_serialization() {
        let mut stats = SearchStats::new();
        stats.tasks_discarded = 3;

        let json = serde_json::to_string(&stats).unwrap();
        let deserialized: SearchStats = serde_json::from_str(&json).unwrap();
        assert_eq!(stats, deserialized);
    }
}

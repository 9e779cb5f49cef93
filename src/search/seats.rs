//! Per-seat policy table.
//!
//! A table says who drives each seat: a person, a network acting greedily
//! on its own prior, or a forward search backed by a network. Seat specs use
//! the command-line spelling `human`, `RL_<model>` and
//! `forward_search_<model>`. Loading the models is the caller's job.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{PlayerId, PlayerMap};

/// Who decides for one seat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeatPolicy {
    Human,
    Network { model: u32 },
    ForwardSearch { model: u32 },
}

impl SeatPolicy {
    /// Model checkpoint behind this seat, if any.
    #[must_use]
    pub fn model(&self) -> Option<u32> {
        match self {
            SeatPolicy::Human => None,
            SeatPolicy::Network { model } | SeatPolicy::ForwardSearch { model } => Some(*model),
        }
    }

    #[must_use]
    pub fn is_search(&self) -> bool {
        matches!(self, SeatPolicy::ForwardSearch { .. })
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SeatPolicyError {
    #[error("unknown seat policy `{0}`")]
    Unknown(String),

    #[error("bad model id in `{0}`")]
    BadModel(String),

    #[error("expected {expected} seat policies, got {got}")]
    SeatCount { expected: usize, got: usize },
}

impl FromStr for SeatPolicy {
    type Err = SeatPolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let model = |rest: &str| rest.parse::<u32>().map_err(|_| SeatPolicyError::BadModel(s.to_string()));

        if s == "human" {
            Ok(SeatPolicy::Human)
        } else if let Some(rest) = s.strip_prefix("forward_search_") {
            Ok(SeatPolicy::ForwardSearch { model: model(rest)? })
        } else if let Some(rest) = s.strip_prefix("RL_") {
            Ok(SeatPolicy::Network { model: model(rest)? })
        } else {
            Err(SeatPolicyError::Unknown(s.to_string()))
        }
    }
}

impl fmt::Display for SeatPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeatPolicy::Human => write!(f, "human"),
            SeatPolicy::Network { model } => write!(f, "RL_{model}"),
            SeatPolicy::ForwardSearch { model } => write!(f, "forward_search_{model}"),
        }
    }
}

/// Seat policies for a whole table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyTable {
    seats: PlayerMap<SeatPolicy>,
}

impl PolicyTable {
    /// Every seat human.
    pub fn all_human(player_count: usize) -> Self {
        Self {
            seats: PlayerMap::with_value(player_count, SeatPolicy::Human),
        }
    }

    /// Parse one spec per seat, in seat order.
    pub fn parse(player_count: usize, specs: &[&str]) -> Result<Self, SeatPolicyError> {
        if specs.len() != player_count {
            return Err(SeatPolicyError::SeatCount {
                expected: player_count,
                got: specs.len(),
            });
        }
        let parsed = specs
            .iter()
            .map(|s| s.parse())
            .collect::<Result<Vec<SeatPolicy>, _>>()?;
        Ok(Self {
            seats: PlayerMap::new(player_count, |p| parsed[p.index()]),
        })
    }

    pub fn set(&mut self, seat: PlayerId, policy: SeatPolicy) {
        self.seats[seat] = policy;
    }

    #[must_use]
    pub fn policy(&self, seat: PlayerId) -> SeatPolicy {
        self.seats[seat]
    }

    /// Seats driven by forward search, in seat order.
    pub fn search_seats(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.seats.iter().filter(|(_, p)| p.is_search()).map(|(seat, _)| seat)
    }

    /// Distinct model ids the table needs loaded.
    #[must_use]
    pub fn models(&self) -> Vec<u32> {
        let mut models: Vec<u32> = self.seats.iter().filter_map(|(_, p)| p.model()).collect();
        models.sort_unstable();
        models.dedup();
        models
    }

    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &SeatPolicy)> {
        self.seats.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_policies() {
        assert_eq!("human".parse::<SeatPolicy>().unwrap(), SeatPolicy::Human);
        assert_eq!("RL_7".parse::<SeatPolicy>().unwrap(), SeatPolicy::Network { model: 7 });
        assert_eq!(
            "forward_search_12".parse::<SeatPolicy>().unwrap(),
            SeatPolicy::ForwardSearch { model: 12 }
        );
        assert!(matches!("RL_x".parse::<SeatPolicy>(), Err(SeatPolicyError::BadModel(_))));
        assert!(matches!("mcts".parse::<SeatPolicy>(), Err(SeatPolicyError::Unknown(_))));
    }

    #[test]
    fn test_display_matches_parse() {
        for policy in [
            SeatPolicy::Human,
            SeatPolicy::Network { model: 3 },
            SeatPolicy::ForwardSearch { model: 9 },
        ] {
            assert_eq!(policy.to_string().parse::<SeatPolicy>().unwrap(), policy);
        }
    }

    #[test]
    fn test_table() {
        let table = PolicyTable::parse(4, &["human", "forward_search_5", "RL_5", "forward_search_2"]).unwrap();

        let seats: Vec<PlayerId> = table.search_seats().collect();
        assert_eq!(seats, vec![PlayerId::new(1), PlayerId::new(3)]);
        assert_eq!(table.models(), vec![2, 5]);
        assert_eq!(table.policy(PlayerId::new(0)), SeatPolicy::Human);

        assert_eq!(
            PolicyTable::parse(4, &["human"]).unwrap_err(),
            SeatPolicyError::SeatCount { expected: 4, got: 1 }
        );
    }

    #[test]
    fn test_set() {
        let mut table = PolicyTable::all_human(4);
        assert_eq!(table.search_seats().count(), 0);
        table.set(PlayerId::new(2), SeatPolicy::ForwardSearch { model: 1 });
        assert_eq!(table.search_seats().collect::<Vec<_>>(), vec![PlayerId::new(2)]);
    }
}

//! Configuration types for arena play
//!
//! Level 4 - Utilities and configuration

use serde::{Deserialize, Serialize};

/// Action source driving every agent in an environment
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PilotKind {
    /// Never acts
    Idle,
    /// Uniform random discrete actions
    Random,
    /// Turn toward the nearest enemy, close in and swing
    #[default]
    Chaser,
}

impl PilotKind {
    /// Parse a pilot name as given on the command line
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "idle" => Some(PilotKind::Idle),
            "random" => Some(PilotKind::Random),
            "chaser" => Some(PilotKind::Chaser),
            _ => None,
        }
    }
}

/// Match configuration
#[derive(Clone, Debug)]
pub struct ArenaConfig {
    /// Action source for every agent
    pub pilot: PilotKind,
    /// Episodes per environment
    pub episodes: usize,
    /// Independent environments (each with its own seed)
    pub environments: usize,
    /// Whether to run environments in parallel
    pub parallel: bool,
    /// Base seed; environment i uses seed + i (None = 42)
    pub seed: Option<u64>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            pilot: PilotKind::Chaser,
            episodes: 10,
            environments: 4,
            parallel: true,
            seed: None,
        }
    }
}

impl ArenaConfig {
    /// Create config with the given episode and environment counts
    pub fn new(episodes: usize, environments: usize) -> Self {
        Self {
            episodes,
            environments,
            ..Default::default()
        }
    }

    /// Set pilot kind
    pub fn with_pilot(mut self, pilot: PilotKind) -> Self {
        self.pilot = pilot;
        self
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Run environments one after another
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Seed for environment `index`
    pub fn env_seed(&self, index: usize) -> u64 {
        self.seed.unwrap_or(42).wrapping_add(index as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_config_defaults() {
        let config = ArenaConfig::default();
        assert_eq!(config.pilot, PilotKind::Chaser);
        assert_eq!(config.episodes, 10);
        assert_eq!(config.environments, 4);
        assert!(config.parallel);
    }

    #[test]
    fn test_arena_config_builders() {
        let config = ArenaConfig::new(3, 2)
            .with_pilot(PilotKind::Random)
            .with_seed(100)
            .sequential();
        assert_eq!(config.episodes, 3);
        assert_eq!(config.environments, 2);
        assert_eq!(config.pilot, PilotKind::Random);
        assert!(!config.parallel);
        assert_eq!(config.env_seed(0), 100);
        assert_eq!(config.env_seed(2), 102);
    }

    #[test]
    fn test_pilot_from_name() {
        assert_eq!(PilotKind::from_name("Idle"), Some(PilotKind::Idle));
        assert_eq!(PilotKind::from_name("random"), Some(PilotKind::Random));
        assert_eq!(PilotKind::from_name("chaser"), Some(PilotKind::Chaser));
        assert_eq!(PilotKind::from_name("mcts"), None);
    }
}

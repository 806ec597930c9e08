//! Scenario configuration - roster and environment settings

use std::path::Path;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::agent::{AgentKind, Team};
use crate::error::BattleError;
use crate::geometry::Pose;

/// Environment-wide settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvConfig {
    /// Episode length in ticks (0 disables timeout)
    pub max_tick: u32,
    /// Sample spawn positions instead of using each agent's fixed pose
    pub random_spawn: bool,
    /// Random spawns land in [-h, h] on both ground axes
    pub spawn_half_extent: f32,
    /// Random spawns must be farther than this from every other agent
    pub min_spawn_separation: f32,
    /// Rejection-sampling budget before falling back to the fixed pose
    ///
    /// Agents placed by the fallback may sit closer than
    /// `min_spawn_separation` to others.
    pub max_spawn_attempts: u32,
    /// Simulated seconds per tick
    pub tick_seconds: f32,
    /// Turn rate in degrees per second
    pub rotate_speed: f32,
    /// Move speed restored on reset
    pub base_move_speed: f32,
    /// Random seed for spawn sampling (None = 42)
    pub seed: Option<u64>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            max_tick: 1000,
            random_spawn: false,
            spawn_half_extent: 10.0,
            min_spawn_separation: 5.0,
            max_spawn_attempts: 10_000,
            tick_seconds: 0.02,
            rotate_speed: 300.0,
            base_move_speed: 1.0,
            seed: None,
        }
    }
}

impl EnvConfig {
    /// Set episode length
    pub fn with_max_tick(mut self, max_tick: u32) -> Self {
        self.max_tick = max_tick;
        self
    }

    /// Enable random spawn positions
    pub fn with_random_spawn(mut self) -> Self {
        self.random_spawn = true;
        self
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// One agent in the roster
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub name: String,
    pub team: Team,
    #[serde(default)]
    pub kind: AgentKind,
    #[serde(default)]
    pub spawn: Pose,
}

impl AgentSpec {
    pub fn new(name: &str, team: Team, kind: AgentKind, spawn: Pose) -> Self {
        Self {
            name: name.to_string(),
            team,
            kind,
            spawn,
        }
    }

    /// Spawn pose with its facing scaled to unit length
    pub fn spawn_pose(&self) -> Result<Pose, BattleError> {
        self.spawn.normalized().ok_or_else(|| {
            BattleError::InvalidConfig(format!(
                "agent {} has a zero-length spawn facing",
                self.name
            ))
        })
    }
}

/// Complete scenario: environment settings plus roster
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,
    #[serde(default)]
    pub env: EnvConfig,
    pub agents: Vec<AgentSpec>,
}

impl ScenarioConfig {
    /// One knight per team facing each other across the arena
    pub fn duel() -> Self {
        Self::skirmish(1).named("duel")
    }

    /// `per_team` knights per side lined up on opposite edges
    pub fn skirmish(per_team: usize) -> Self {
        let mut agents = Vec::with_capacity(per_team * 2);
        let spacing = 6.0;
        let offset = (per_team.saturating_sub(1)) as f32 * spacing / 2.0;

        for i in 0..per_team {
            let x = i as f32 * spacing - offset;
            agents.push(AgentSpec::new(
                &format!("red-{}", i + 1),
                Team::Red,
                AgentKind::melee(),
                Pose::at(x, -6.0, 0.0),
            ));
        }
        for i in 0..per_team {
            let x = i as f32 * spacing - offset;
            agents.push(AgentSpec::new(
                &format!("yellow-{}", i + 1),
                Team::Yellow,
                AgentKind::melee(),
                Pose::at(x, 6.0, 180.0),
            ));
        }

        Self {
            name: format!("skirmish-{}v{}", per_team, per_team),
            env: EnvConfig::default(),
            agents,
        }
    }

    fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Check roster and settings before building an episode
    pub fn validate(&self) -> Result<(), BattleError> {
        for team in Team::ALL {
            if !self.agents.iter().any(|a| a.team == team) {
                return Err(BattleError::EmptyTeam(team));
            }
        }

        let mut names = FxHashSet::default();
        for agent in &self.agents {
            if !names.insert(agent.name.as_str()) {
                return Err(BattleError::InvalidConfig(format!(
                    "duplicate agent name: {}",
                    agent.name
                )));
            }
            agent.spawn_pose()?;
        }

        let env = &self.env;
        if !(env.tick_seconds.is_finite() && env.tick_seconds > 0.0) {
            return Err(BattleError::InvalidConfig(format!(
                "tick_seconds must be positive, got {}",
                env.tick_seconds
            )));
        }
        if !(env.base_move_speed.is_finite() && env.base_move_speed >= 0.0) {
            return Err(BattleError::InvalidConfig(format!(
                "base_move_speed must be non-negative, got {}",
                env.base_move_speed
            )));
        }
        if env.random_spawn && !(env.spawn_half_extent.is_finite() && env.spawn_half_extent > 0.0) {
            return Err(BattleError::InvalidConfig(format!(
                "spawn_half_extent must be positive, got {}",
                env.spawn_half_extent
            )));
        }

        Ok(())
    }

    /// Load from JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let scenario: ScenarioConfig = serde_json::from_str(&content)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Save to JSON file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self::duel()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vec3;

    #[test]
    fn test_duel_is_valid() {
        let scenario = ScenarioConfig::duel();
        assert_eq!(scenario.name, "duel");
        assert_eq!(scenario.agents.len(), 2);
        assert!(scenario.validate().is_ok());
    }

    #[test]
    fn test_skirmish_layout() {
        let scenario = ScenarioConfig::skirmish(3);
        assert_eq!(scenario.agents.len(), 6);
        assert_eq!(scenario.agents.iter().filter(|a| a.team == Team::Red).count(), 3);
        assert!(scenario.validate().is_ok());
    }

    #[test]
    fn test_empty_team_rejected() {
        let mut scenario = ScenarioConfig::duel();
        scenario.agents.retain(|a| a.team == Team::Red);
        assert!(matches!(scenario.validate(), Err(BattleError::EmptyTeam(Team::Yellow))));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut scenario = ScenarioConfig::skirmish(2);
        scenario.agents[1].name = scenario.agents[0].name.clone();
        assert!(matches!(scenario.validate(), Err(BattleError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_facing_rejected() {
        let json = r#"{
            "name": "frozen",
            "agents": [
                {"name": "a", "team": "Red", "spawn": {
                    "position": {"x": 0.0, "y": 0.0, "z": 0.0},
                    "facing": {"x": 0.0, "y": 0.0, "z": 0.0}
                }},
                {"name": "b", "team": "Yellow"}
            ]
        }"#;
        let scenario: ScenarioConfig = serde_json::from_str(json).unwrap();
        assert!(matches!(scenario.validate(), Err(BattleError::InvalidConfig(_))));
    }

    #[test]
    fn test_long_facing_normalized() {
        let mut scenario = ScenarioConfig::duel();
        scenario.agents[0].spawn.facing = Vec3::new(0.0, 0.0, 4.0);
        assert!(scenario.validate().is_ok());
        let pose = scenario.agents[0].spawn_pose().unwrap();
        assert_eq!(pose.facing, Vec3::FORWARD);
        assert_eq!(pose.position, scenario.agents[0].spawn.position);
    }

    #[test]
    fn test_json_defaults() {
        let json = r#"{
            "name": "sparse",
            "agents": [
                {"name": "a", "team": "Red"},
                {"name": "b", "team": "Yellow", "kind": "Generic"}
            ]
        }"#;
        let scenario: ScenarioConfig = serde_json::from_str(json).unwrap();
        assert_eq!(scenario.env, EnvConfig::default());
        assert!(scenario.agents[0].kind.is_melee());
        assert_eq!(scenario.agents[1].kind, AgentKind::Generic);
        assert!(scenario.validate().is_ok());
    }
}

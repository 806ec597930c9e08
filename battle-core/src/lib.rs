//! Battle Core - Combat resolution and episode rewards
//!
//! This crate provides the rules engine for team-based melee training:
//! - Agent combat state (hp, stamina, stance, reward accumulators)
//! - Hit classification, damage and shield blocks
//! - Team groups and the persistent scoreboard
//! - Episode controller (tick clock, timeout, elimination, reset)
//!
//! Physics, animation and collision detection are collaborators: the
//! engine consumes their events and queues [`EngineCommand`]s for them.

pub mod geometry;
pub mod rules;
pub mod clock;
pub mod error;
pub mod agent;
pub mod team;
pub mod scoreboard;
pub mod config;
pub mod action;
pub mod report;
pub mod combat;
pub mod episode;

// Re-exports for convenient access
pub use geometry::{Vec3, Pose, angle_between};
pub use clock::TimeStepClock;
pub use error::{BattleError, Result};
pub use agent::{
    AgentId, AgentKind, AgentState, AttackRefusal, CombatStance, LastHit, MeleeKit, Team,
};
pub use team::{GroupSignal, TeamGroup};
pub use scoreboard::ScoreBoard;
pub use config::{AgentSpec, EnvConfig, ScenarioConfig};
pub use action::{ActionVector, MeleeIntent};
pub use report::{AgentDisplay, DisplayFrame, EngineCommand, EpisodeEnd, StepReport, Termination};
pub use combat::{
    BlockEvent, BlockOutcome, BlockReport, HitEvent, HitKind, HitOutcome, HitReport, ShieldSide,
    SkipReason,
};
pub use episode::{ActionOutcome, EpisodeController, EpisodeState, TickInput};

//! Outbound data: collaborator commands, step reports, display frames

use serde::{Deserialize, Serialize};

use crate::agent::{AgentId, Team};
use crate::geometry::{Pose, Vec3};
use crate::team::GroupSignal;

/// Request for the physics or animation layer
///
/// The engine queues these instead of calling into collaborators; the
/// driver drains them once per tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum EngineCommand {
    /// Instantaneous velocity change
    ApplyImpulse { agent: AgentId, impulse: Vec3 },
    /// Teleport (reset / spawn)
    PlaceAgent { agent: AgentId, pose: Pose },
    /// Start the attack animation
    StartAttackAnimation { agent: AgentId },
    /// Drop transient visuals (hit flash, sword pose, attack state)
    ClearCombatVisuals { agent: AgentId },
}

/// Why an episode ended
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// Every member of one team is dead
    AllEliminated { winner: Team },
    /// Tick limit reached; None is a true draw
    TimedOut { winner: Option<Team> },
}

impl Termination {
    pub fn winner(&self) -> Option<Team> {
        match *self {
            Termination::AllEliminated { winner } => Some(winner),
            Termination::TimedOut { winner } => winner,
        }
    }

    pub fn group_signal(&self) -> GroupSignal {
        match self {
            Termination::AllEliminated { .. } => GroupSignal::Ended,
            Termination::TimedOut { .. } => GroupSignal::Interrupted,
        }
    }
}

/// Episode summary emitted on the tick the episode ends
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpisodeEnd {
    pub termination: Termination,
    /// Tick at which the episode ended
    pub tick: u32,
    /// Episode index (0-based) since the controller was built
    pub episode: u32,
    /// Group rewards accumulated over the episode, indexed by team
    pub team_rewards: [f32; 2],
}

/// Everything the learner receives for one tick
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    pub tick: u32,
    /// Reward delta per agent, indexed by agent id
    pub rewards: Vec<f32>,
    /// Group reward delta per team
    pub group_rewards: [f32; 2],
    /// Observation per agent (hp, stamina) after the tick, before any reset
    pub observations: Vec<[f32; 2]>,
    pub episode_end: Option<EpisodeEnd>,
}

impl StepReport {
    pub fn is_episode_end(&self) -> bool {
        self.episode_end.is_some()
    }

    pub fn group_reward(&self, team: Team) -> f32 {
        self.group_rewards[team.index()]
    }
}

/// Read-only presentation state for the display sink
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DisplayFrame {
    pub agents: Vec<AgentDisplay>,
    /// Ticks until timeout (None when timeout is disabled)
    pub remaining_ticks: Option<u32>,
    pub red_score: String,
    pub yellow_score: String,
}

/// Per-agent presentation state
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentDisplay {
    pub name: String,
    pub team: Team,
    pub hp: f32,
    pub stamina: f32,
    pub dead: bool,
    pub flashing: bool,
    pub pose: Pose,
}

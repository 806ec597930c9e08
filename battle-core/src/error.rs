//! Error types for episode setup

use crate::agent::{AgentId, Team};

/// Fatal problems detected while setting up an episode
///
/// Per-tick inputs (hits, blocks, actions) never produce these; they are
/// skipped instead.
#[derive(Debug, thiserror::Error)]
pub enum BattleError {
    #[error("team {0:?} has no agents")]
    EmptyTeam(Team),

    #[error("unknown agent id: {0}")]
    UnknownAgent(AgentId),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, BattleError>;

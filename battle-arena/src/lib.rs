//! Battle Arena - Episode and match play for the combat engine
//!
//! This crate drives the engine the way a training host would:
//! - A kinematic stand-in for the physics and animation layers
//! - Idle, random and chasing pilots as action sources
//! - Episode runs and multi-environment match play (optionally parallel)
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: callers (CLI, training host)
//! - Level 2: play_match, play_match_parallel (phases)
//! - Level 3: EpisodeRunner, ArenaWorld, Pilot (steps)
//! - Level 4: configuration

mod config;
mod episode_runner;
mod match_play;
mod pilot;
mod world;

pub use config::{ArenaConfig, PilotKind};
pub use episode_runner::{EpisodeOutcome, EpisodeRunner};
pub use match_play::{play_match, play_match_parallel, MatchResult};
pub use pilot::Pilot;
pub use world::{
    within_arc, ArenaWorld, ACTIVE_END, ACTIVE_START, ATTACK_TICKS, OBSTACLE_BOUND, SWORD_REACH,
};

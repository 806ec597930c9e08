//! Episode runner - drives one environment through whole episodes
//!
//! Level 3 - Step-level implementation

use serde::{Deserialize, Serialize};

use battle_core::{
    BattleError, EpisodeController, EpisodeEnd, Result, ScenarioConfig, ScoreBoard, Team,
    Termination,
};

use crate::config::PilotKind;
use crate::pilot::Pilot;
use crate::world::ArenaWorld;

/// Outcome of a single episode
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpisodeOutcome {
    /// How the episode ended
    pub termination: Termination,
    /// Ticks played
    pub ticks: u32,
    /// Group reward per team over the episode
    pub team_rewards: [f32; 2],
}

impl EpisodeOutcome {
    /// Get winner (None for draw)
    pub fn winner(&self) -> Option<Team> {
        self.termination.winner()
    }

    /// Check if red won
    pub fn red_wins(&self) -> bool {
        self.winner() == Some(Team::Red)
    }

    /// Check if yellow won
    pub fn yellow_wins(&self) -> bool {
        self.winner() == Some(Team::Yellow)
    }

    /// Check if the episode timed out with no winner
    pub fn is_draw(&self) -> bool {
        self.winner().is_none()
    }

    /// Check if one team was wiped out
    pub fn is_elimination(&self) -> bool {
        matches!(self.termination, Termination::AllEliminated { .. })
    }
}

impl From<EpisodeEnd> for EpisodeOutcome {
    fn from(end: EpisodeEnd) -> Self {
        Self {
            termination: end.termination,
            ticks: end.tick,
            team_rewards: end.team_rewards,
        }
    }
}

/// One environment: engine, stand-in world and pilot
pub struct EpisodeRunner {
    controller: EpisodeController,
    world: ArenaWorld,
    pilot: Pilot,
}

impl EpisodeRunner {
    /// Create a runner; `seed` drives both spawn sampling and the pilot
    ///
    /// Arena play needs a tick limit so every episode ends.
    pub fn new(scenario: &ScenarioConfig, pilot: PilotKind, seed: u64) -> Result<Self> {
        if scenario.env.max_tick == 0 {
            return Err(BattleError::InvalidConfig(
                "arena play needs max_tick > 0".to_string(),
            ));
        }

        let mut scenario = scenario.clone();
        scenario.env.seed = Some(seed);

        let mut controller = EpisodeController::new(&scenario)?;
        let mut world = ArenaWorld::new(controller.agents().len());
        world.apply_commands(&mut controller)?;

        Ok(Self {
            controller,
            world,
            pilot: Pilot::new(pilot, seed),
        })
    }

    /// Play ticks until the current episode ends
    pub fn play_episode(&mut self) -> Result<EpisodeOutcome> {
        loop {
            let actions = self.pilot.choose_all(&self.controller);
            let mut input = self.world.detect_contacts(&self.controller);
            input.actions = actions;

            let report = self.controller.step(input);
            self.world.apply_commands(&mut self.controller)?;
            self.world.update(&mut self.controller)?;

            if let Some(end) = report.episode_end {
                let outcome = EpisodeOutcome::from(end);
                tracing::debug!(
                    "Episode {}: {:?} after {} ticks",
                    end.episode,
                    outcome.termination,
                    outcome.ticks
                );
                return Ok(outcome);
            }
        }
    }

    /// Play several episodes back to back
    pub fn play(&mut self, episodes: usize) -> Result<Vec<EpisodeOutcome>> {
        (0..episodes).map(|_| self.play_episode()).collect()
    }

    pub fn controller(&self) -> &EpisodeController {
        &self.controller
    }

    pub fn scoreboard(&self) -> &ScoreBoard {
        self.controller.scoreboard()
    }
}

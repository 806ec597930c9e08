//! Match play - many episodes over independent environments
//!
//! Level 2 - Phase-level implementation

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use battle_core::{Result, ScenarioConfig, ScoreBoard};

use crate::config::ArenaConfig;
use crate::episode_runner::{EpisodeOutcome, EpisodeRunner};

/// Result of a match (episodes across all environments)
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MatchResult {
    /// Episodes won by red
    pub red_wins: u32,
    /// Episodes won by yellow
    pub yellow_wins: u32,
    /// Timeouts with no winner
    pub draws: u32,
    /// Episodes ended by wiping out a team
    pub eliminations: u32,
    /// Episodes ended by the tick limit (draws included)
    pub timeouts: u32,
    /// Average episode length in ticks
    pub avg_ticks: f32,
    /// Total episodes played
    pub episodes_played: u32,
    /// Win tally summed over environments
    pub scoreboard: ScoreBoard,
    /// Individual episode outcomes, environment by environment
    pub outcomes: Vec<EpisodeOutcome>,
}

impl MatchResult {
    /// Create empty result
    pub fn empty() -> Self {
        Self::default()
    }

    /// Combine two results
    pub fn combine(&self, other: &MatchResult) -> MatchResult {
        let total = self.episodes_played + other.episodes_played;
        let avg_ticks = if total > 0 {
            (self.avg_ticks * self.episodes_played as f32
                + other.avg_ticks * other.episodes_played as f32)
                / total as f32
        } else {
            0.0
        };

        let mut outcomes = self.outcomes.clone();
        outcomes.extend(other.outcomes.iter().copied());

        MatchResult {
            red_wins: self.red_wins + other.red_wins,
            yellow_wins: self.yellow_wins + other.yellow_wins,
            draws: self.draws + other.draws,
            eliminations: self.eliminations + other.eliminations,
            timeouts: self.timeouts + other.timeouts,
            avg_ticks,
            episodes_played: total,
            scoreboard: self.scoreboard.merge(&other.scoreboard),
            outcomes,
        }
    }

    /// Get win rate for red
    pub fn red_win_rate(&self) -> f32 {
        self.rate(self.red_wins)
    }

    /// Get win rate for yellow
    pub fn yellow_win_rate(&self) -> f32 {
        self.rate(self.yellow_wins)
    }

    /// Get draw rate
    pub fn draw_rate(&self) -> f32 {
        self.rate(self.draws)
    }

    fn rate(&self, count: u32) -> f32 {
        if self.episodes_played == 0 {
            0.0
        } else {
            count as f32 / self.episodes_played as f32
        }
    }
}

/// Play a match with environments run one after another (Level 2 phase)
pub fn play_match(scenario: &ScenarioConfig, config: &ArenaConfig) -> Result<MatchResult> {
    if config.episodes == 0 || config.environments == 0 {
        return Ok(MatchResult::empty());
    }

    let results = (0..config.environments)
        .map(|index| play_environment(scenario, config, index))
        .collect::<Result<Vec<_>>>()?;
    Ok(aggregate_results(results))
}

/// Play a match with environments spread over the rayon pool (Level 2 phase)
///
/// Each environment is seeded from its index, so the result matches
/// [`play_match`] for the same configuration.
pub fn play_match_parallel(scenario: &ScenarioConfig, config: &ArenaConfig) -> Result<MatchResult> {
    if config.episodes == 0 || config.environments == 0 {
        return Ok(MatchResult::empty());
    }

    let results = (0..config.environments)
        .into_par_iter()
        .map(|index| play_environment(scenario, config, index))
        .collect::<Result<Vec<_>>>()?;
    Ok(aggregate_results(results))
}

// ============================================================================
// Level 3 - Steps
// ============================================================================

/// Outcomes of one environment plus its final scoreboard
struct EnvironmentResult {
    outcomes: Vec<EpisodeOutcome>,
    scoreboard: ScoreBoard,
}

/// Run every episode of one environment
fn play_environment(
    scenario: &ScenarioConfig,
    config: &ArenaConfig,
    index: usize,
) -> Result<EnvironmentResult> {
    let seed = config.env_seed(index);
    let mut runner = EpisodeRunner::new(scenario, config.pilot, seed)?;
    let outcomes = runner.play(config.episodes)?;

    tracing::debug!(
        "Environment {} (seed {}): red {} - yellow {}",
        index,
        seed,
        runner.scoreboard().display(battle_core::Team::Red),
        runner.scoreboard().display(battle_core::Team::Yellow)
    );

    Ok(EnvironmentResult {
        outcomes,
        scoreboard: *runner.scoreboard(),
    })
}

/// Aggregate environment outcomes into a match result
fn aggregate_results(results: Vec<EnvironmentResult>) -> MatchResult {
    results
        .into_iter()
        .map(|env| summarize(env.outcomes, env.scoreboard))
        .fold(MatchResult::empty(), |acc, r| acc.combine(&r))
}

/// Tally one environment's outcomes
fn summarize(outcomes: Vec<EpisodeOutcome>, scoreboard: ScoreBoard) -> MatchResult {
    let episodes_played = outcomes.len() as u32;
    let count = |f: fn(&EpisodeOutcome) -> bool| outcomes.iter().filter(|o| f(o)).count() as u32;

    let red_wins = count(EpisodeOutcome::red_wins);
    let yellow_wins = count(EpisodeOutcome::yellow_wins);
    let draws = count(EpisodeOutcome::is_draw);
    let eliminations = count(EpisodeOutcome::is_elimination);

    let total_ticks: u64 = outcomes.iter().map(|o| o.ticks as u64).sum();
    let avg_ticks = if episodes_played > 0 {
        total_ticks as f32 / episodes_played as f32
    } else {
        0.0
    };

    MatchResult {
        red_wins,
        yellow_wins,
        draws,
        eliminations,
        timeouts: episodes_played - eliminations,
        avg_ticks,
        episodes_played,
        scoreboard,
        outcomes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use battle_core::{Team, Termination};

    fn outcome(termination: Termination, ticks: u32) -> EpisodeOutcome {
        EpisodeOutcome {
            termination,
            ticks,
            team_rewards: [0.0, 0.0],
        }
    }

    fn short_duel() -> ScenarioConfig {
        let mut scenario = ScenarioConfig::duel();
        scenario.env.max_tick = 40;
        scenario
    }

    #[test]
    fn test_match_result_empty() {
        let result = MatchResult::empty();
        assert_eq!(result.episodes_played, 0);
        assert_eq!(result.red_win_rate(), 0.0);
    }

    #[test]
    fn test_summarize() {
        let result = summarize(
            vec![
                outcome(Termination::AllEliminated { winner: Team::Red }, 100),
                outcome(Termination::TimedOut { winner: Some(Team::Yellow) }, 200),
                outcome(Termination::TimedOut { winner: None }, 200),
                outcome(Termination::AllEliminated { winner: Team::Red }, 300),
            ],
            ScoreBoard::new(),
        );
        assert_eq!(result.red_wins, 2);
        assert_eq!(result.yellow_wins, 1);
        assert_eq!(result.draws, 1);
        assert_eq!(result.eliminations, 2);
        assert_eq!(result.timeouts, 2);
        assert_eq!(result.avg_ticks, 200.0);
        assert_eq!(result.red_win_rate(), 0.5);
        assert_eq!(result.draw_rate(), 0.25);
    }

    #[test]
    fn test_match_result_combine() {
        let r1 = MatchResult {
            red_wins: 2,
            draws: 2,
            timeouts: 2,
            eliminations: 2,
            avg_ticks: 20.0,
            episodes_played: 4,
            ..Default::default()
        };
        let r2 = MatchResult {
            yellow_wins: 3,
            draws: 1,
            timeouts: 4,
            avg_ticks: 30.0,
            episodes_played: 4,
            ..Default::default()
        };

        let combined = r1.combine(&r2);
        assert_eq!(combined.red_wins, 2);
        assert_eq!(combined.yellow_wins, 3);
        assert_eq!(combined.draws, 3);
        assert_eq!(combined.timeouts, 6);
        assert_eq!(combined.episodes_played, 8);
        assert!((combined.avg_ticks - 25.0).abs() < 0.01);
    }

    #[test]
    fn test_play_match_zero_episodes() {
        let config = ArenaConfig::new(0, 4);
        let result = play_match(&short_duel(), &config).unwrap();
        assert_eq!(result.episodes_played, 0);
    }

    #[test]
    fn test_play_match_counts() {
        let config = ArenaConfig::new(2, 3).with_pilot(crate::PilotKind::Random).with_seed(5);
        let result = play_match(&short_duel(), &config).unwrap();
        assert_eq!(result.episodes_played, 6);
        assert_eq!(result.outcomes.len(), 6);
        assert_eq!(result.red_wins + result.yellow_wins + result.draws, 6);
        assert_eq!(result.eliminations + result.timeouts, 6);
        assert_eq!(result.scoreboard.total(), result.red_wins + result.yellow_wins);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let config = ArenaConfig::new(2, 4).with_pilot(crate::PilotKind::Random).with_seed(11);
        let sequential = play_match(&short_duel(), &config).unwrap();
        let parallel = play_match_parallel(&short_duel(), &config).unwrap();
        assert_eq!(sequential.outcomes, parallel.outcomes);
        assert_eq!(sequential.scoreboard, parallel.scoreboard);
    }
}

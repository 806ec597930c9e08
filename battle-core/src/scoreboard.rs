//! Cross-episode win tally

use serde::{Deserialize, Serialize};

use crate::agent::Team;

/// Win count per team for the lifetime of the process
///
/// Episode resets never touch it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBoard {
    wins: [u32; 2],
}

impl ScoreBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_win(&mut self, team: Team) {
        self.wins[team.index()] += 1;
    }

    pub fn wins(&self, team: Team) -> u32 {
        self.wins[team.index()]
    }

    pub fn total(&self) -> u32 {
        self.wins.iter().sum()
    }

    /// Team with more wins (None when level)
    pub fn leader(&self) -> Option<Team> {
        let red = self.wins(Team::Red);
        let yellow = self.wins(Team::Yellow);
        if red > yellow {
            Some(Team::Red)
        } else if yellow > red {
            Some(Team::Yellow)
        } else {
            None
        }
    }

    /// Two-digit display form, e.g. "03"
    pub fn display(&self, team: Team) -> String {
        format!("{:02}", self.wins(team))
    }

    /// Combine tallies from independent environments
    pub fn merge(&self, other: &ScoreBoard) -> ScoreBoard {
        ScoreBoard {
            wins: [self.wins[0] + other.wins[0], self.wins[1] + other.wins[1]],
        }
    }
}

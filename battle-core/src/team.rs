//! Team groups and group-level rewards

use serde::{Deserialize, Serialize};

use crate::agent::{AgentId, Team};

/// How a group's episode ended
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupSignal {
    /// Natural termination (one side eliminated)
    Ended,
    /// Cut short by the episode length limit
    Interrupted,
}

/// Agents of one team plus the reward attributed to the team as a whole
#[derive(Clone, Debug)]
pub struct TeamGroup {
    team: Team,
    members: Vec<AgentId>,
    /// Group reward accrued during the current tick
    step_reward: f32,
    /// Group reward accrued since episode start
    episode_reward: f32,
    signal: Option<GroupSignal>,
}

impl TeamGroup {
    pub fn new(team: Team) -> Self {
        Self {
            team,
            members: Vec::new(),
            step_reward: 0.0,
            episode_reward: 0.0,
            signal: None,
        }
    }

    pub fn register(&mut self, agent: AgentId) {
        if !self.members.contains(&agent) {
            self.members.push(agent);
        }
    }

    pub fn team(&self) -> Team {
        self.team
    }

    pub fn members(&self) -> &[AgentId] {
        &self.members
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn add_group_reward(&mut self, reward: f32) {
        self.step_reward += reward;
        self.episode_reward += reward;
    }

    pub fn set_group_reward(&mut self, reward: f32) {
        self.episode_reward += reward - self.step_reward;
        self.step_reward = reward;
    }

    pub fn step_reward(&self) -> f32 {
        self.step_reward
    }

    pub fn episode_reward(&self) -> f32 {
        self.episode_reward
    }

    pub fn take_step_reward(&mut self) -> f32 {
        std::mem::take(&mut self.step_reward)
    }

    pub fn end_episode(&mut self, signal: GroupSignal) {
        self.signal = Some(signal);
    }

    pub fn take_signal(&mut self) -> Option<GroupSignal> {
        self.signal.take()
    }

    /// Clear accumulated rewards for a new episode
    pub fn reset(&mut self) {
        self.step_reward = 0.0;
        self.episode_reward = 0.0;
        self.signal = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_is_idempotent() {
        let mut group = TeamGroup::new(Team::Red);
        group.register(0);
        group.register(0);
        group.register(2);
        assert_eq!(group.members(), &[0, 2]);
    }

    #[test]
    fn test_group_reward_add_and_set() {
        let mut group = TeamGroup::new(Team::Yellow);
        group.add_group_reward(1.5);
        group.add_group_reward(0.5);
        assert!((group.step_reward() - 2.0).abs() < 1e-6);

        group.set_group_reward(0.0);
        assert_eq!(group.step_reward(), 0.0);
        assert_eq!(group.episode_reward(), 0.0);
    }

    #[test]
    fn test_reset_clears_rewards() {
        let mut group = TeamGroup::new(Team::Red);
        group.register(1);
        group.add_group_reward(3.0);
        group.end_episode(GroupSignal::Ended);
        group.reset();
        assert_eq!(group.episode_reward(), 0.0);
        assert_eq!(group.take_signal(), None);
        assert_eq!(group.members(), &[1]);
    }
}

//! Pilots - action sources for arena play
//!
//! Level 3 - Step-level implementation

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use battle_core::rules::ATTACK_STAMINA_COST;
use battle_core::{
    angle_between, ActionVector, AgentId, AgentState, CombatStance, EpisodeController,
};

use crate::config::PilotKind;
use crate::world::{SWORD_ARC_DEGREES, SWORD_REACH};

/// Chasers stop turning once the target is this close to dead ahead
const AIM_TOLERANCE_DEGREES: f32 = 10.0;
/// Chasers stop advancing inside this fraction of sword reach
const CLOSE_IN_FRACTION: f32 = 0.8;

/// Action source for every agent in one environment
pub enum Pilot {
    Idle,
    Random(ChaCha8Rng),
    Chaser,
}

impl Pilot {
    pub fn new(kind: PilotKind, seed: u64) -> Self {
        match kind {
            PilotKind::Idle => Pilot::Idle,
            PilotKind::Random => Pilot::Random(ChaCha8Rng::seed_from_u64(seed)),
            PilotKind::Chaser => Pilot::Chaser,
        }
    }

    /// One action per living agent, in agent id order
    pub fn choose_all(&mut self, ctrl: &EpisodeController) -> Vec<(AgentId, ActionVector)> {
        ctrl.agents()
            .iter()
            .filter(|a| a.is_alive())
            .map(|a| (a.id, self.choose(ctrl, a)))
            .collect()
    }

    /// Pick an action for one agent
    pub fn choose(&mut self, ctrl: &EpisodeController, agent: &AgentState) -> ActionVector {
        match self {
            Pilot::Idle => ActionVector::IDLE,
            Pilot::Random(rng) => ActionVector::new(
                rng.gen_range(0..3),
                rng.gen_range(0..3),
                rng.gen_range(0..3),
                rng.gen_range(0..3),
            ),
            Pilot::Chaser => chase(ctrl, agent),
        }
    }
}

/// Turn toward the nearest living enemy, close in and swing
fn chase(ctrl: &EpisodeController, agent: &AgentState) -> ActionVector {
    let position = agent.pose.position;
    let target = ctrl
        .agents()
        .iter()
        .filter(|e| e.is_alive() && e.team != agent.team)
        .min_by(|a, b| {
            let da = a.pose.position.distance_to(position);
            let db = b.pose.position.distance_to(position);
            da.total_cmp(&db)
        });

    let Some(target) = target else {
        return ActionVector::IDLE;
    };

    let offset = (target.pose.position - position).flattened();
    let distance = offset.length();
    let facing = agent.facing();
    let angle = angle_between(facing, offset).unwrap_or(0.0);

    let rotate = if angle <= AIM_TOLERANCE_DEGREES {
        0
    } else if offset.dot(facing.right()) > 0.0 {
        2
    } else {
        1
    };

    let forward = if distance > SWORD_REACH * CLOSE_IN_FRACTION { 1 } else { 0 };

    let can_swing = agent.stance() != CombatStance::Attacking
        && agent.stamina() > ATTACK_STAMINA_COST
        && distance <= SWORD_REACH
        && angle <= SWORD_ARC_DEGREES;
    let threatened = target.stance() == CombatStance::Attacking && distance <= 2.0 * SWORD_REACH;

    let extra = if can_swing {
        2
    } else if threatened && agent.stance() != CombatStance::Attacking {
        1
    } else {
        0
    };

    ActionVector::new(forward, 0, rotate, extra)
}

#[cfg(test)]
mod tests {
    use super::*;
    use battle_core::{AgentKind, AgentSpec, Pose, ScenarioConfig, Team};

    fn duel(red: Pose, yellow: Pose) -> EpisodeController {
        let mut scenario = ScenarioConfig::duel();
        scenario.agents = vec![
            AgentSpec::new("red", Team::Red, AgentKind::melee(), red),
            AgentSpec::new("yellow", Team::Yellow, AgentKind::melee(), yellow),
        ];
        EpisodeController::new(&scenario).unwrap()
    }

    #[test]
    fn test_idle_pilot() {
        let ctrl = duel(Pose::at(0.0, 0.0, 0.0), Pose::at(0.0, 5.0, 180.0));
        let mut pilot = Pilot::new(PilotKind::Idle, 1);
        let actions = pilot.choose_all(&ctrl);
        assert_eq!(actions, vec![(0, ActionVector::IDLE), (1, ActionVector::IDLE)]);
    }

    #[test]
    fn test_random_pilot_deterministic() {
        let ctrl = duel(Pose::at(0.0, 0.0, 0.0), Pose::at(0.0, 5.0, 180.0));
        let mut a = Pilot::new(PilotKind::Random, 9);
        let mut b = Pilot::new(PilotKind::Random, 9);
        for _ in 0..20 {
            let actions = a.choose_all(&ctrl);
            assert_eq!(actions, b.choose_all(&ctrl));
            assert!(actions.iter().all(|(_, v)| v.forward < 3 && v.extra < 3));
        }
    }

    #[test]
    fn test_chaser_advances_when_far() {
        let ctrl = duel(Pose::at(0.0, 0.0, 0.0), Pose::at(0.0, 5.0, 180.0));
        let action = chase(&ctrl, &ctrl.agents()[0]);
        assert_eq!(action, ActionVector::new(1, 0, 0, 0));
    }

    #[test]
    fn test_chaser_turns_toward_target() {
        // Target to the right (+X) of a red agent facing +Z
        let ctrl = duel(Pose::at(0.0, 0.0, 0.0), Pose::at(5.0, 0.0, 270.0));
        let action = chase(&ctrl, &ctrl.agents()[0]);
        assert_eq!(action.rotate, 2);

        let ctrl = duel(Pose::at(0.0, 0.0, 0.0), Pose::at(-5.0, 0.0, 90.0));
        let action = chase(&ctrl, &ctrl.agents()[0]);
        assert_eq!(action.rotate, 1);
    }

    #[test]
    fn test_chaser_swings_in_reach() {
        let ctrl = duel(Pose::at(0.0, 0.0, 0.0), Pose::at(0.0, 1.2, 180.0));
        let action = chase(&ctrl, &ctrl.agents()[0]);
        assert_eq!(action, ActionVector::new(0, 0, 0, 2));
    }
}

//! Arena world - kinematic stand-in for physics and animation
//!
//! Level 3 - Step-level implementation
//!
//! Integrates impulses into positions, plays a fixed-length attack
//! animation and reports sword, shield and obstacle contacts back to the
//! engine as plain events.

use battle_core::{
    angle_between, AgentId, BattleError, BlockEvent, EngineCommand, EpisodeController, HitEvent,
    Result, ShieldSide, TickInput, Vec3,
};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Positions are clamped to [-h, h] on both ground axes
pub const ARENA_HALF_EXTENT: f32 = 12.0;
/// Agents beyond this bound touch the arena wall
pub const OBSTACLE_BOUND: f32 = 11.0;
/// Velocity kept per tick
pub const DAMPING: f32 = 0.5;

/// Attack animation length in ticks
pub const ATTACK_TICKS: u32 = 20;
/// Sword is live from ACTIVE_START up to (not including) ACTIVE_END
pub const ACTIVE_START: u32 = 6;
pub const ACTIVE_END: u32 = 14;

pub const SWORD_REACH: f32 = 1.8;
/// Half-angle of the swing arc in front of the attacker, degrees
pub const SWORD_ARC_DEGREES: f32 = 45.0;
/// Attacker within this angle of the shield's facing hits the front face
pub const SHIELD_FRONT_ARC: f32 = 60.0;
/// Between the front arc and this angle the swing glances off the rear face
pub const SHIELD_REAR_ARC: f32 = 90.0;

// ============================================================================
// WORLD
// ============================================================================

#[derive(Clone, Copy, Debug, Default)]
struct Body {
    velocity: Vec3,
    /// Ticks since the attack animation started
    attack_timer: Option<u32>,
}

/// Minimal physics and animation layer for one environment
#[derive(Clone, Debug)]
pub struct ArenaWorld {
    bodies: Vec<Body>,
}

impl ArenaWorld {
    pub fn new(agent_count: usize) -> Self {
        Self {
            bodies: vec![Body::default(); agent_count],
        }
    }

    /// Velocity of an agent's body
    pub fn velocity(&self, id: AgentId) -> Option<Vec3> {
        self.bodies.get(id).map(|b| b.velocity)
    }

    /// Whether an agent's attack animation is playing
    pub fn is_animating(&self, id: AgentId) -> bool {
        self.bodies.get(id).is_some_and(|b| b.attack_timer.is_some())
    }

    fn body(&mut self, id: AgentId) -> Result<&mut Body> {
        self.bodies.get_mut(id).ok_or(BattleError::UnknownAgent(id))
    }

    /// Carry out every request the engine queued this tick
    pub fn apply_commands(&mut self, ctrl: &mut EpisodeController) -> Result<()> {
        for command in ctrl.drain_commands() {
            match command {
                EngineCommand::ApplyImpulse { agent, impulse } => {
                    let body = self.body(agent)?;
                    body.velocity = body.velocity + impulse;
                }
                EngineCommand::PlaceAgent { agent, .. } => {
                    self.body(agent)?.velocity = Vec3::ZERO;
                }
                EngineCommand::StartAttackAnimation { agent } => {
                    self.body(agent)?.attack_timer = Some(0);
                    ctrl.set_attack_in_progress(agent, true)?;
                }
                EngineCommand::ClearCombatVisuals { agent } => {
                    self.body(agent)?.attack_timer = None;
                }
            }
        }
        Ok(())
    }

    /// Advance animations and integrate motion by one tick
    pub fn update(&mut self, ctrl: &mut EpisodeController) -> Result<()> {
        let dt = ctrl.config().tick_seconds;

        for (id, body) in self.bodies.iter_mut().enumerate() {
            let agent = ctrl.agent(id).ok_or(BattleError::UnknownAgent(id))?;
            if !agent.is_alive() {
                *body = Body::default();
                continue;
            }
            let position = agent.pose.position;

            if let Some(elapsed) = body.attack_timer {
                let elapsed = elapsed + 1;
                if elapsed == ACTIVE_START {
                    ctrl.enable_attack_valid(id)?;
                }
                if elapsed == ACTIVE_END {
                    ctrl.disable_attack_valid(id)?;
                }
                if elapsed >= ATTACK_TICKS {
                    ctrl.finish_attack(id)?;
                    body.attack_timer = None;
                } else {
                    body.attack_timer = Some(elapsed);
                }
            }

            let moved = position + body.velocity.scale(dt);
            let clamped = Vec3::new(
                moved.x.clamp(-ARENA_HALF_EXTENT, ARENA_HALF_EXTENT),
                position.y,
                moved.z.clamp(-ARENA_HALF_EXTENT, ARENA_HALF_EXTENT),
            );
            body.velocity = body.velocity.scale(DAMPING);
            ctrl.sync_position(id, clamped)?;
        }

        Ok(())
    }

    /// Sword, shield and obstacle contacts at the current poses
    pub fn detect_contacts(&self, ctrl: &EpisodeController) -> TickInput {
        let agents = ctrl.agents();
        let tick = ctrl.current_tick();
        let mut input = TickInput::default();

        for attacker in agents.iter().filter(|a| a.is_alive() && a.attack_valid) {
            for target in agents
                .iter()
                .filter(|t| t.is_alive() && t.team != attacker.team)
            {
                let offset = (target.pose.position - attacker.pose.position).flattened();
                if offset.length() > SWORD_REACH
                    || !within_arc(attacker.facing(), offset, SWORD_ARC_DEGREES)
                {
                    continue;
                }

                if target.shield_raised() {
                    let side = match angle_between(target.facing(), -offset) {
                        Some(angle) if angle <= SHIELD_FRONT_ARC => Some(ShieldSide::Front),
                        Some(angle) if angle <= SHIELD_REAR_ARC => Some(ShieldSide::Rear),
                        _ => None,
                    };
                    if let Some(side) = side {
                        input.blocks.push(BlockEvent {
                            attacker: attacker.id,
                            defender: target.id,
                            side,
                            tick,
                        });
                        continue;
                    }
                }

                input.hits.push(HitEvent::new(attacker.id, target.id, tick));
            }
        }

        for agent in agents.iter().filter(|a| a.is_alive()) {
            let p = agent.pose.position;
            if p.x.abs() > OBSTACLE_BOUND || p.z.abs() > OBSTACLE_BOUND {
                input.obstacle_contacts.push(agent.id);
            }
        }

        input
    }
}

/// Is `offset` inside the cone of half-angle `arc` around `facing`
pub fn within_arc(facing: Vec3, offset: Vec3, arc: f32) -> bool {
    angle_between(facing, offset).is_some_and(|angle| angle <= arc)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use battle_core::{
        ActionOutcome, ActionVector, AgentKind, AttackRefusal, AgentSpec, CombatStance, Pose, ScenarioConfig,
        Team,
    };

    /// Red at the origin facing +Z, yellow `gap` ahead facing back
    fn close_duel(gap: f32) -> EpisodeController {
        let mut scenario = ScenarioConfig::duel();
        scenario.env.max_tick = 0;
        scenario.agents = vec![
            AgentSpec::new("red", Team::Red, AgentKind::melee(), Pose::at(0.0, 0.0, 0.0)),
            AgentSpec::new(
                "yellow",
                Team::Yellow,
                AgentKind::melee(),
                Pose::at(0.0, gap, 180.0),
            ),
        ];
        let mut ctrl = EpisodeController::new(&scenario).unwrap();
        ctrl.drain_commands();
        ctrl
    }

    #[test]
    fn test_impulse_moves_agent() {
        let mut ctrl = close_duel(5.0);
        let mut world = ArenaWorld::new(2);
        ctrl.apply_action(0, ActionVector::new(1, 0, 0, 0));
        world.apply_commands(&mut ctrl).unwrap();
        world.update(&mut ctrl).unwrap();

        let z = ctrl.agents()[0].pose.position.z;
        assert!((z - 0.02).abs() < 1e-5);
        assert!((world.velocity(0).unwrap().z - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_position_clamped_to_arena() {
        let mut ctrl = close_duel(5.0);
        let mut world = ArenaWorld::new(2);
        ctrl.sync_position(0, Vec3::new(0.0, 0.0, 11.99)).unwrap();
        world.bodies[0].velocity = Vec3::new(0.0, 0.0, 100.0);
        world.update(&mut ctrl).unwrap();
        assert_eq!(ctrl.agents()[0].pose.position.z, ARENA_HALF_EXTENT);
    }

    #[test]
    fn test_attack_animation_window() {
        let mut ctrl = close_duel(5.0);
        let mut world = ArenaWorld::new(2);
        ctrl.apply_action(0, ActionVector::new(0, 0, 0, 2));
        world.apply_commands(&mut ctrl).unwrap();
        assert!(world.is_animating(0));

        for elapsed in 1..=ATTACK_TICKS {
            world.update(&mut ctrl).unwrap();
            let valid = ctrl.agents()[0].attack_valid;
            let active = (ACTIVE_START..ACTIVE_END).contains(&elapsed);
            assert_eq!(valid, active, "tick {}", elapsed);
        }
        assert!(!world.is_animating(0));
        assert_eq!(ctrl.agents()[0].stance(), CombatStance::Idle);
    }

    #[test]
    fn test_swing_on_winning_tick_does_not_carry_over() {
        let mut ctrl = close_duel(1.5);
        let mut world = ArenaWorld::new(2);
        ctrl.enable_attack_valid(0).unwrap();

        // Four front hits of 0.2, one per dedup window
        for _ in 0..4 {
            ctrl.step(TickInput {
                hits: vec![HitEvent::new(0, 1, 0)],
                ..Default::default()
            });
            for _ in 0..31 {
                ctrl.step(TickInput::default());
            }
        }
        assert!((ctrl.agents()[1].hp() - 0.2).abs() < 1e-4);
        ctrl.drain_commands();

        let report = ctrl.step(TickInput {
            actions: vec![(0, ActionVector::new(0, 0, 0, 2))],
            hits: vec![HitEvent::new(0, 1, 0)],
            ..Default::default()
        });
        assert!(report.is_episode_end());

        world.apply_commands(&mut ctrl).unwrap();
        assert!(!world.is_animating(0));
        assert_eq!(ctrl.agents()[0].stance(), CombatStance::Idle);

        for _ in 0..5 {
            world.update(&mut ctrl).unwrap();
        }
        assert_eq!(
            ctrl.apply_action(0, ActionVector::new(0, 0, 0, 2)),
            ActionOutcome::Applied { attack: Some(Ok(())) }
        );
        let _ = AttackRefusal::AlreadyAttacking;
    }

    #[test]
    fn test_sword_contact_in_reach() {
        let mut ctrl = close_duel(1.5);
        ctrl.enable_attack_valid(0).unwrap();
        let world = ArenaWorld::new(2);
        let input = world.detect_contacts(&ctrl);
        assert_eq!(input.hits, vec![HitEvent::new(0, 1, 0)]);
        assert!(input.blocks.is_empty());
    }

    #[test]
    fn test_no_contact_out_of_reach() {
        let mut ctrl = close_duel(3.0);
        ctrl.enable_attack_valid(0).unwrap();
        let input = ArenaWorld::new(2).detect_contacts(&ctrl);
        assert!(input.hits.is_empty());
    }

    #[test]
    fn test_raised_shield_blocks() {
        let mut ctrl = close_duel(1.5);
        ctrl.enable_attack_valid(0).unwrap();
        ctrl.apply_action(1, ActionVector::new(0, 0, 0, 1));
        let input = ArenaWorld::new(2).detect_contacts(&ctrl);
        assert!(input.hits.is_empty());
        assert_eq!(input.blocks.len(), 1);
        assert_eq!(input.blocks[0].side, ShieldSide::Front);
    }

    #[test]
    fn test_shield_does_not_cover_back() {
        let mut ctrl = close_duel(1.5);
        ctrl.enable_attack_valid(0).unwrap();
        // Yellow raises its shield and turns its back: 30 right turns of 6 degrees
        for _ in 0..30 {
            ctrl.apply_action(1, ActionVector::new(0, 0, 2, 1));
        }
        assert!(ctrl.agents()[1].shield_raised());
        assert!(ctrl.agents()[1].facing().z > 0.99);

        let input = ArenaWorld::new(2).detect_contacts(&ctrl);
        assert_eq!(input.hits, vec![HitEvent::new(0, 1, 0)]);
        assert!(input.blocks.is_empty());
    }

    #[test]
    fn test_obstacle_contact() {
        let mut ctrl = close_duel(5.0);
        ctrl.sync_position(1, Vec3::new(11.5, 0.0, 0.0)).unwrap();
        let input = ArenaWorld::new(2).detect_contacts(&ctrl);
        assert_eq!(input.obstacle_contacts, vec![1]);
    }

    #[test]
    fn test_within_arc() {
        assert!(within_arc(Vec3::FORWARD, Vec3::new(0.5, 0.0, 1.0), 45.0));
        assert!(!within_arc(Vec3::FORWARD, Vec3::new(1.0, 0.0, 0.1), 45.0));
        assert!(!within_arc(Vec3::FORWARD, Vec3::ZERO, 45.0));
    }
}

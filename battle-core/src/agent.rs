//! Per-agent combat state

use serde::{Deserialize, Serialize};

use crate::geometry::{Pose, Vec3};
use crate::rules::{
    ATTACK_STAMINA_COST, GUARD_SPEED_FACTOR, HIT_FLASH_TICKS, STAMINA_REGEN_PER_TICK,
};

/// Agent identifier (index into the episode roster)
pub type AgentId = usize;

// ============================================================================
// CORE TYPES
// ============================================================================

/// Team side
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Red = 0,
    Yellow = 1,
}

impl Team {
    pub const ALL: [Team; 2] = [Team::Red, Team::Yellow];

    pub fn opponent(self) -> Self {
        match self {
            Team::Red => Team::Yellow,
            Team::Yellow => Team::Red,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Kind-specific equipment
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeleeKit {
    pub shield_raised: bool,
}

/// Agent variant
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentKind {
    /// Moves and turns only
    Generic,
    /// Sword and shield
    Melee(MeleeKit),
}

impl AgentKind {
    pub fn melee() -> Self {
        AgentKind::Melee(MeleeKit::default())
    }

    pub fn is_melee(&self) -> bool {
        matches!(self, AgentKind::Melee(_))
    }
}

impl Default for AgentKind {
    fn default() -> Self {
        AgentKind::melee()
    }
}

/// Attack eligibility sub-state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatStance {
    Idle,
    /// Attack animation playing
    Attacking,
    /// Shield raised, move speed halved
    Guarding,
}

/// Why an attack was refused
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttackRefusal {
    AlreadyAttacking,
    Exhausted,
    Dead,
}

/// Most recent landed hit on an agent
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastHit {
    pub tick: u32,
    pub attacker: AgentId,
}

// ============================================================================
// AGENT STATE
// ============================================================================

/// Mutable combat attributes of one agent
#[derive(Clone, Debug)]
pub struct AgentState {
    pub id: AgentId,
    pub name: String,
    pub team: Team,
    pub kind: AgentKind,

    hp: f32,
    stamina: f32,
    pub attack_valid: bool,
    pub dead: bool,
    pub last_hit: Option<LastHit>,
    stance: CombatStance,

    pub pose: Pose,
    /// Pose restored on reset when random spawn is off
    pub spawn: Pose,
    base_move_speed: f32,
    move_speed: f32,

    /// Reward accrued during the current tick
    step_reward: f32,
    /// Reward accrued since episode start
    cumulative_reward: f32,
}

impl AgentState {
    pub fn new(
        id: AgentId,
        name: &str,
        team: Team,
        kind: AgentKind,
        spawn: Pose,
        move_speed: f32,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            team,
            kind,
            hp: 1.0,
            stamina: 1.0,
            attack_valid: false,
            dead: false,
            last_hit: None,
            stance: CombatStance::Idle,
            pose: spawn,
            spawn,
            base_move_speed: move_speed,
            move_speed,
            step_reward: 0.0,
            cumulative_reward: 0.0,
        }
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn hp(&self) -> f32 {
        self.hp
    }

    pub fn stamina(&self) -> f32 {
        self.stamina
    }

    pub fn stance(&self) -> CombatStance {
        self.stance
    }

    pub fn move_speed(&self) -> f32 {
        self.move_speed
    }

    pub fn is_alive(&self) -> bool {
        !self.dead
    }

    pub fn facing(&self) -> Vec3 {
        self.pose.facing
    }

    pub fn shield_raised(&self) -> bool {
        matches!(self.kind, AgentKind::Melee(kit) if kit.shield_raised)
    }

    /// Hit flash is on for a few ticks after a landed hit
    pub fn is_flashing(&self, tick: u32) -> bool {
        self.last_hit
            .map(|hit| tick.saturating_sub(hit.tick) < HIT_FLASH_TICKS)
            .unwrap_or(false)
    }

    /// Observation vector handed to the learner
    pub fn observation(&self) -> [f32; 2] {
        [self.hp, self.stamina]
    }

    // ========================================================================
    // HP / STAMINA
    // ========================================================================

    pub fn set_hp(&mut self, hp: f32) {
        self.hp = clamp_unit(hp);
    }

    /// Subtract damage, returning the clamped result
    pub fn take_damage(&mut self, damage: f32) -> f32 {
        self.set_hp(self.hp - damage);
        self.hp
    }

    pub fn set_stamina(&mut self, stamina: f32) {
        self.stamina = clamp_unit(stamina);
    }

    /// Passive regeneration, paused while attacking
    pub fn regenerate(&mut self) {
        if self.stance != CombatStance::Attacking {
            self.set_stamina(self.stamina + STAMINA_REGEN_PER_TICK);
        }
    }

    // ========================================================================
    // STANCE
    // ========================================================================

    /// Spend stamina and enter the attacking stance
    pub fn try_begin_attack(&mut self) -> Result<(), AttackRefusal> {
        if self.dead {
            return Err(AttackRefusal::Dead);
        }
        if self.stance == CombatStance::Attacking {
            return Err(AttackRefusal::AlreadyAttacking);
        }
        if self.stamina <= ATTACK_STAMINA_COST {
            return Err(AttackRefusal::Exhausted);
        }

        self.lower_guard();
        self.set_stamina(self.stamina - ATTACK_STAMINA_COST);
        self.stance = CombatStance::Attacking;
        Ok(())
    }

    /// Attack animation finished
    pub fn finish_attack(&mut self) {
        if self.stance == CombatStance::Attacking {
            self.stance = CombatStance::Idle;
        }
    }

    /// Mirror the animation layer's attack-in-progress flag
    pub fn set_attacking(&mut self, attacking: bool) {
        if attacking {
            self.lower_guard();
            self.stance = CombatStance::Attacking;
        } else {
            self.finish_attack();
        }
    }

    /// Raise the shield; ignored while attacking or for non-melee agents
    pub fn raise_guard(&mut self) -> bool {
        if self.stance == CombatStance::Attacking {
            return false;
        }
        match &mut self.kind {
            AgentKind::Melee(kit) => {
                kit.shield_raised = true;
                self.stance = CombatStance::Guarding;
                self.move_speed = self.base_move_speed * GUARD_SPEED_FACTOR;
                true
            }
            AgentKind::Generic => false,
        }
    }

    pub fn lower_guard(&mut self) {
        if let AgentKind::Melee(kit) = &mut self.kind {
            kit.shield_raised = false;
        }
        if self.stance == CombatStance::Guarding {
            self.stance = CombatStance::Idle;
        }
        self.move_speed = self.base_move_speed;
    }

    // ========================================================================
    // REWARDS
    // ========================================================================

    pub fn add_reward(&mut self, reward: f32) {
        self.step_reward += reward;
        self.cumulative_reward += reward;
    }

    /// Replace this tick's reward, keeping the cumulative total consistent
    pub fn set_reward(&mut self, reward: f32) {
        self.cumulative_reward += reward - self.step_reward;
        self.step_reward = reward;
    }

    pub fn step_reward(&self) -> f32 {
        self.step_reward
    }

    pub fn cumulative_reward(&self) -> f32 {
        self.cumulative_reward
    }

    /// Hand over this tick's reward and start a new tick
    pub fn take_step_reward(&mut self) -> f32 {
        std::mem::take(&mut self.step_reward)
    }

    // ========================================================================
    // RESET
    // ========================================================================

    /// Restore episode-start attributes at `pose`
    pub fn reset(&mut self, pose: Pose) {
        self.hp = 1.0;
        self.stamina = 1.0;
        self.attack_valid = false;
        self.dead = false;
        self.last_hit = None;
        self.stance = CombatStance::Idle;
        if let AgentKind::Melee(kit) = &mut self.kind {
            kit.shield_raised = false;
        }
        self.move_speed = self.base_move_speed;
        self.pose = pose;
        self.step_reward = 0.0;
        self.cumulative_reward = 0.0;
    }
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

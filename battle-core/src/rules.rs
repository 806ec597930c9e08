//! Combat and reward constants
//!
//! These numbers shape the training signal. Changing any of them changes
//! what the learner is rewarded for.

// ============================================================================
// HIT RESOLUTION
// ============================================================================

/// Repeat hits from the same attacker within this many ticks are ignored
pub const DEDUP_WINDOW: u32 = 30;

/// Attacker and target facing within this angle (degrees) is a back attack
pub const BACK_ATTACK_ANGLE: f32 = 30.0;

/// Angle substituted when a facing vector is degenerate (a front hit)
pub const NEUTRAL_ANGLE_DEGREES: f32 = 90.0;

pub const BACK_ATTACK_DAMAGE: f32 = 0.3;
pub const BACK_ATTACK_ATTACKER_REWARD: f32 = 0.45;
pub const BACK_ATTACK_TARGET_REWARD: f32 = -0.3;

pub const FRONT_HIT_DAMAGE: f32 = 0.2;
pub const FRONT_HIT_ATTACKER_REWARD: f32 = 0.3;
pub const FRONT_HIT_TARGET_REWARD: f32 = -0.2;

/// Hp at or below this after a hit counts as a kill
pub const KILL_HP_EPSILON: f32 = 0.01;

/// Base kill reward, reduced by the elapsed episode ratio
pub const KILL_REWARD: f32 = 3.0;

/// Ticks a freshly hit agent stays flagged for the hit flash
pub const HIT_FLASH_TICKS: u32 = 5;

// ============================================================================
// SHIELD
// ============================================================================

/// Knockback magnitude of a shield block
pub const BLOCK_FORCE: f32 = 6.0;

/// Knockback scale when the rear of the shield takes the blow
pub const REAR_SHIELD_FACTOR: f32 = 0.5;

/// Share of the knockback pushed back onto the defender
pub const DEFENDER_RECOIL: f32 = 0.5;

pub const BLOCK_REWARD: f32 = 0.02;

// ============================================================================
// EPISODE
// ============================================================================

/// Tolerance for hp-sum and cumulative-reward ties at timeout
pub const TIE_EPSILON: f32 = 1e-4;

/// Obstacle contact costs this much per tick, divided by max tick
pub const OBSTACLE_PENALTY: f32 = 5.0;

// ============================================================================
// STAMINA
// ============================================================================

pub const STAMINA_REGEN_PER_TICK: f32 = 0.005;
pub const ATTACK_STAMINA_COST: f32 = 0.3;

/// Move speed multiplier while the shield is raised
pub const GUARD_SPEED_FACTOR: f32 = 0.5;

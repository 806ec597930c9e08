//! Hit and block resolution
//!
//! Validation never fails loudly: an ineligible event comes back as a
//! [`SkipReason`] and leaves all state untouched. Kill handling and episode
//! termination live in the episode controller, which calls into here.

use serde::{Deserialize, Serialize};

use crate::agent::{AgentId, AgentState, LastHit};
use crate::geometry::{angle_between, Vec3};
use crate::rules::{
    BACK_ATTACK_ANGLE, BACK_ATTACK_ATTACKER_REWARD, BACK_ATTACK_DAMAGE, BACK_ATTACK_TARGET_REWARD,
    BLOCK_FORCE, BLOCK_REWARD, DEDUP_WINDOW, DEFENDER_RECOIL, FRONT_HIT_ATTACKER_REWARD,
    FRONT_HIT_DAMAGE, FRONT_HIT_TARGET_REWARD, KILL_HP_EPSILON, KILL_REWARD, NEUTRAL_ANGLE_DEGREES,
    REAR_SHIELD_FACTOR,
};

// ============================================================================
// EVENTS AND OUTCOMES
// ============================================================================

/// Sword contact reported by the collision source
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HitEvent {
    pub attacker: AgentId,
    pub target: AgentId,
    pub tick: u32,
}

impl HitEvent {
    pub fn new(attacker: AgentId, target: AgentId, tick: u32) -> Self {
        Self { attacker, target, tick }
    }
}

/// Which face of the shield took the blow
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShieldSide {
    Front,
    Rear,
}

/// Sword-on-shield contact reported by the collision source
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockEvent {
    pub attacker: AgentId,
    pub defender: AgentId,
    pub side: ShieldSide,
    pub tick: u32,
}

/// Why an event had no effect
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Id not in the roster
    UnknownAgent,
    /// Attacker and target are the same agent
    SelfHit,
    /// Attacker or target already dead
    Dead,
    FriendlyFire,
    /// Attacker's swing is outside its active window
    AttackNotValid,
    /// Same attacker landed on the same target within the dedup window
    Duplicate,
    /// Defender has no raised shield
    NoShield,
    /// Episode already reached a terminal state this tick
    EpisodeOver,
}

/// Back attacks come from behind the target and hit harder
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitKind {
    Back,
    Front,
}

impl HitKind {
    pub fn damage(self) -> f32 {
        match self {
            HitKind::Back => BACK_ATTACK_DAMAGE,
            HitKind::Front => FRONT_HIT_DAMAGE,
        }
    }

    pub fn attacker_reward(self) -> f32 {
        match self {
            HitKind::Back => BACK_ATTACK_ATTACKER_REWARD,
            HitKind::Front => FRONT_HIT_ATTACKER_REWARD,
        }
    }

    pub fn target_reward(self) -> f32 {
        match self {
            HitKind::Back => BACK_ATTACK_TARGET_REWARD,
            HitKind::Front => FRONT_HIT_TARGET_REWARD,
        }
    }
}

/// Effect of a landed hit
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HitReport {
    pub attacker: AgentId,
    pub target: AgentId,
    pub kind: HitKind,
    /// Angle between attacker and target facing, degrees
    pub angle: f32,
    pub target_hp: f32,
    /// Reward deltas emitted for this hit (kill bonus included)
    pub attacker_reward: f32,
    pub target_reward: f32,
    pub killed: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum HitOutcome {
    Skipped(SkipReason),
    Landed(HitReport),
}

impl HitOutcome {
    pub fn is_landed(&self) -> bool {
        matches!(self, HitOutcome::Landed(_))
    }

    pub fn report(&self) -> Option<&HitReport> {
        match self {
            HitOutcome::Landed(report) => Some(report),
            HitOutcome::Skipped(_) => None,
        }
    }
}

/// Knockback produced by a block
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockReport {
    pub attacker: AgentId,
    pub defender: AgentId,
    pub attacker_impulse: Vec3,
    pub defender_impulse: Vec3,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum BlockOutcome {
    Skipped(SkipReason),
    Blocked(BlockReport),
}

// ============================================================================
// HITS
// ============================================================================

/// Check every precondition of a sword hit
pub fn validate_hit(agents: &[AgentState], event: &HitEvent) -> Result<(), SkipReason> {
    let (attacker, target) = pair(agents, event.attacker, event.target)?;

    if attacker.dead || target.dead {
        return Err(SkipReason::Dead);
    }
    if attacker.team == target.team {
        return Err(SkipReason::FriendlyFire);
    }
    if !attacker.attack_valid {
        return Err(SkipReason::AttackNotValid);
    }
    if let Some(last) = target.last_hit {
        if last.attacker == attacker.id && event.tick.saturating_sub(last.tick) <= DEDUP_WINDOW {
            return Err(SkipReason::Duplicate);
        }
    }

    Ok(())
}

/// Classify a hit by facing angle
///
/// Degenerate facing vectors fall back to the neutral angle.
pub fn classify_hit(attacker_facing: Vec3, target_facing: Vec3) -> (HitKind, f32) {
    let angle = match angle_between(attacker_facing, target_facing) {
        Some(angle) => angle,
        None => {
            tracing::warn!(
                "degenerate facing in hit resolution ({:?} / {:?}), using {} degrees",
                attacker_facing,
                target_facing,
                NEUTRAL_ANGLE_DEGREES
            );
            NEUTRAL_ANGLE_DEGREES
        }
    };

    let kind = if angle <= BACK_ATTACK_ANGLE {
        HitKind::Back
    } else {
        HitKind::Front
    };
    (kind, angle)
}

/// Apply damage and rewards for a validated hit
///
/// `time_ratio` is the elapsed fraction of the episode (0 when timeout is
/// disabled) and scales the kill bonus. The caller handles the death.
pub fn apply_hit(agents: &mut [AgentState], event: &HitEvent, time_ratio: f32) -> HitReport {
    let (kind, angle) = classify_hit(
        agents[event.attacker].facing(),
        agents[event.target].facing(),
    );

    let mut attacker_reward = kind.attacker_reward();
    let mut target_reward = kind.target_reward();

    let target = &mut agents[event.target];
    let mut hp = target.take_damage(kind.damage());
    target.last_hit = Some(LastHit {
        tick: event.tick,
        attacker: event.attacker,
    });

    let killed = hp <= KILL_HP_EPSILON;
    if killed {
        target.set_hp(0.0);
        hp = 0.0;
        attacker_reward += KILL_REWARD - time_ratio;
        target_reward += -KILL_REWARD + time_ratio;
    }
    target.add_reward(target_reward);
    agents[event.attacker].add_reward(attacker_reward);

    tracing::debug!(
        "{:?} hit {} -> {} ({:.1} deg): hp={:.2} killed={}",
        kind,
        event.attacker,
        event.target,
        angle,
        hp,
        killed
    );

    HitReport {
        attacker: event.attacker,
        target: event.target,
        kind,
        angle,
        target_hp: hp,
        attacker_reward,
        target_reward,
        killed,
    }
}

// ============================================================================
// BLOCKS
// ============================================================================

/// Check every precondition of a shield block
pub fn validate_block(agents: &[AgentState], event: &BlockEvent) -> Result<(), SkipReason> {
    let (attacker, defender) = pair(agents, event.attacker, event.defender)?;

    if attacker.dead || defender.dead {
        return Err(SkipReason::Dead);
    }
    if attacker.team == defender.team {
        return Err(SkipReason::FriendlyFire);
    }
    if !defender.shield_raised() {
        return Err(SkipReason::NoShield);
    }
    if !attacker.attack_valid {
        return Err(SkipReason::AttackNotValid);
    }

    Ok(())
}

/// Spend the attacker's swing, reward the defender and compute knockback
pub fn apply_block(agents: &mut [AgentState], event: &BlockEvent) -> BlockReport {
    let side_factor = match event.side {
        ShieldSide::Front => 1.0,
        ShieldSide::Rear => REAR_SHIELD_FACTOR,
    };
    let shield_forward = agents[event.defender]
        .facing()
        .normalized()
        .unwrap_or(Vec3::ZERO);
    let force = shield_forward.scale(BLOCK_FORCE * side_factor);

    agents[event.attacker].attack_valid = false;
    agents[event.defender].add_reward(BLOCK_REWARD);

    tracing::debug!("{} blocked {} ({:?})", event.defender, event.attacker, event.side);

    BlockReport {
        attacker: event.attacker,
        defender: event.defender,
        attacker_impulse: force,
        defender_impulse: -force.scale(DEFENDER_RECOIL),
    }
}

fn pair(
    agents: &[AgentState],
    first: AgentId,
    second: AgentId,
) -> Result<(&AgentState, &AgentState), SkipReason> {
    let a = agents.get(first).ok_or(SkipReason::UnknownAgent)?;
    let b = agents.get(second).ok_or(SkipReason::UnknownAgent)?;
    if first == second {
        return Err(SkipReason::SelfHit);
    }
    Ok((a, b))
}

// ============================================================================
// TESTS
// ============================================================================

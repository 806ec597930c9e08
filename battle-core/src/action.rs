//! Discrete action vectors from the action source

use serde::{Deserialize, Serialize};

/// One tick of input for one agent
///
/// Each axis takes 0 (none), 1 or 2. Values outside that range act as 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionVector {
    /// 1 = forward, 2 = backward
    pub forward: u8,
    /// 1 = right, 2 = left
    pub strafe: u8,
    /// 1 = turn left, 2 = turn right
    pub rotate: u8,
    /// Kind-specific: for melee agents 0 = lower shield, 1 = raise shield, 2 = attack
    pub extra: u8,
}

/// Melee-specific meaning of the extra axis
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeleeIntent {
    LowerShield,
    RaiseShield,
    Attack,
}

impl ActionVector {
    pub const IDLE: ActionVector = ActionVector::new(0, 0, 0, 0);

    pub const fn new(forward: u8, strafe: u8, rotate: u8, extra: u8) -> Self {
        Self {
            forward,
            strafe,
            rotate,
            extra,
        }
    }

    /// Build from a flat discrete action buffer (missing entries are 0)
    pub fn from_slice(values: &[u8]) -> Self {
        let at = |i: usize| values.get(i).copied().unwrap_or(0);
        Self::new(at(0), at(1), at(2), at(3))
    }

    /// Signed axis value: +1, -1 or 0
    pub fn forward_sign(&self) -> f32 {
        axis_sign(self.forward)
    }

    pub fn strafe_sign(&self) -> f32 {
        axis_sign(self.strafe)
    }

    /// +1 turns right, -1 turns left
    pub fn rotate_sign(&self) -> f32 {
        -axis_sign(self.rotate)
    }

    pub fn melee_intent(&self) -> MeleeIntent {
        match self.extra {
            1 => MeleeIntent::RaiseShield,
            2 => MeleeIntent::Attack,
            _ => MeleeIntent::LowerShield,
        }
    }
}

fn axis_sign(value: u8) -> f32 {
    match value {
        1 => 1.0,
        2 => -1.0,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_slice_pads() {
        let action = ActionVector::from_slice(&[1, 2]);
        assert_eq!(action, ActionVector::new(1, 2, 0, 0));
    }

    #[test]
    fn test_axis_signs() {
        let action = ActionVector::new(2, 1, 1, 0);
        assert_eq!(action.forward_sign(), -1.0);
        assert_eq!(action.strafe_sign(), 1.0);
        assert_eq!(action.rotate_sign(), -1.0);
        assert_eq!(ActionVector::new(7, 0, 2, 0).forward_sign(), 0.0);
        assert_eq!(ActionVector::new(0, 0, 2, 0).rotate_sign(), 1.0);
    }

    #[test]
    fn test_melee_intent() {
        assert_eq!(ActionVector::new(0, 0, 0, 2).melee_intent(), MeleeIntent::Attack);
        assert_eq!(ActionVector::new(0, 0, 0, 1).melee_intent(), MeleeIntent::RaiseShield);
        assert_eq!(ActionVector::new(0, 0, 0, 9).melee_intent(), MeleeIntent::LowerShield);
    }
}

//! Episode tick counter

/// Monotonic tick counter for one episode
///
/// `max_tick == 0` disables the timeout and the time-ratio reward terms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeStepClock {
    current: u32,
    max_tick: u32,
}

impl TimeStepClock {
    pub fn new(max_tick: u32) -> Self {
        Self { current: 0, max_tick }
    }

    /// Advance by one tick, returning the new tick number
    pub fn advance(&mut self) -> u32 {
        self.current = self.current.saturating_add(1);
        self.current
    }

    pub fn reset(&mut self) {
        self.current = 0;
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn max_tick(&self) -> u32 {
        self.max_tick
    }

    pub fn has_timeout(&self) -> bool {
        self.max_tick > 0
    }

    /// True once the tick counter reaches the configured episode length
    pub fn is_expired(&self) -> bool {
        self.has_timeout() && self.current >= self.max_tick
    }

    /// Elapsed fraction of the episode at `tick` (0 when timeout is disabled)
    pub fn ratio_at(&self, tick: u32) -> f32 {
        if self.has_timeout() {
            tick as f32 / self.max_tick as f32
        } else {
            0.0
        }
    }

    /// Per-tick share of a unit penalty (0 when timeout is disabled)
    pub fn per_tick(&self, amount: f32) -> f32 {
        if self.has_timeout() {
            amount / self.max_tick as f32
        } else {
            0.0
        }
    }

    /// Ticks left before timeout (None when timeout is disabled)
    pub fn remaining(&self) -> Option<u32> {
        self.has_timeout()
            .then(|| self.max_tick.saturating_sub(self.current))
    }
}

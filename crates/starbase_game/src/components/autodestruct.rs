//! Auto destruct component

/// Removes its entity once `ttl` steps have passed since `initial_step`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutoDestruct {
    /// Step at which the timer started
    pub initial_step: u64,
    /// Steps to live
    pub ttl: u64,
}

impl AutoDestruct {
    /// Timer started at `initial_step` lasting `ttl` steps
    pub fn new(initial_step: u64, ttl: u64) -> Self {
        Self { initial_step, ttl }
    }

    /// Last step on which the entity is still alive
    pub fn die_step(&self) -> u64 {
        self.initial_step.saturating_add(self.ttl)
    }

    /// Whether the timer has run out at `step`
    pub fn expired(&self, step: u64) -> bool {
        step > self.die_step()
    }
}

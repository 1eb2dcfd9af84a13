//! Fixed-step time management
//!
//! The simulation advances in fixed ticks; every system sees the same
//! [`Tick`] for a given frame.

/// One simulation tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// Zero-based tick counter
    pub step: u64,
    /// Seconds simulated by this tick
    pub dt: f32,
}

/// Fixed-step clock producing consecutive ticks
#[derive(Debug, Clone)]
pub struct FixedStep {
    dt: f32,
    step: u64,
}

impl FixedStep {
    /// Create a clock advancing `dt` seconds per tick
    pub fn new(dt: f32) -> Self {
        debug_assert!(dt > 0.0, "fixed step must be positive");
        Self { dt, step: 0 }
    }

    /// Create a clock running at `rate` ticks per second
    pub fn from_rate(rate: u32) -> Self {
        Self::new(1.0 / rate.max(1) as f32)
    }

    /// The tick that will be produced by the next [`FixedStep::advance`]
    pub fn current(&self) -> Tick {
        Tick { step: self.step, dt: self.dt }
    }

    /// Produce the current tick and move to the next one
    pub fn advance(&mut self) -> Tick {
        let tick = self.current();
        self.step += 1;
        tick
    }

    /// Number of ticks produced so far
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Total simulated time in seconds
    pub fn elapsed_secs(&self) -> f32 {
        self.step as f32 * self.dt
    }
}

impl Default for FixedStep {
    fn default() -> Self {
        Self::from_rate(60)
    }
}

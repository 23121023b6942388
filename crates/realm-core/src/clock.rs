//! Tick clock for the Realm simulation.
//!
//! The clock is the single source of temporal state. It counts ticks and
//! fixes the simulated time that passes per tick, so movement integrates
//! the same distance every tick regardless of how late the loop wakes up.

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// Invalid clock configuration.
    #[error("invalid clock configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// Tick counter with a fixed per-tick time step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickClock {
    /// Current tick number (0 before the first tick runs).
    tick: u64,

    /// Simulated milliseconds per tick.
    tick_interval_ms: u64,
}

impl TickClock {
    /// Create a clock at tick 0.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if `tick_interval_ms` is 0.
    pub fn new(tick_interval_ms: u64) -> Result<Self, ClockError> {
        Self::from_parts(0, tick_interval_ms)
    }

    /// Create a clock at an explicit tick (useful for tests).
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if `tick_interval_ms` is 0.
    pub fn from_parts(tick: u64, tick_interval_ms: u64) -> Result<Self, ClockError> {
        if tick_interval_ms == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "tick_interval_ms must be at least 1".to_owned(),
            });
        }
        Ok(Self {
            tick,
            tick_interval_ms,
        })
    }

    /// Advance the clock by one tick. Returns the new tick number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the tick counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        Ok(self.tick)
    }

    /// Return the current tick number.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Return the simulated milliseconds per tick.
    pub const fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms
    }

    /// Simulated seconds that pass in one tick.
    #[allow(clippy::cast_precision_loss)]
    pub fn delta_seconds(&self) -> f64 {
        // Intervals are milliseconds; far below f64's exact integer range.
        self.tick_interval_ms as f64 / 1000.0
    }
}

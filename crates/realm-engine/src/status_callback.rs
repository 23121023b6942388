//! Tick callback that logs a periodic status line.

use realm_core::{TickCallback, TickSummary, World};
use tracing::{debug, info};

/// Logs a world summary every `every` ticks and per-tick detail at debug.
pub struct StatusCallback {
    every: u64,
}

impl StatusCallback {
    /// Report every `every` ticks; zero disables the periodic line.
    pub const fn new(every: u64) -> Self {
        Self { every }
    }

    fn is_due(&self, tick: u64) -> bool {
        self.every > 0 && tick.checked_rem(self.every) == Some(0)
    }
}

impl TickCallback for StatusCallback {
    fn on_tick(&mut self, summary: &TickSummary, world: &World) {
        debug!(
            tick = summary.tick,
            effects = summary.effects,
            dispatched = summary.commands.dispatched,
            rejected = summary.commands.rejected,
            closed = summary.commands.closed,
            "Tick summary"
        );

        if self.is_due(summary.tick) {
            let entities: usize = world.areas().values().map(|a| a.registry().len()).sum();
            info!(
                tick = summary.tick,
                sessions = summary.sessions,
                areas = world.areas().len(),
                entities,
                "World status"
            );
        }
    }
}

//! Tick cycle: the fixed-order update that drives the Realm simulation.
//!
//! Each tick runs through these phases:
//!
//! 1. **Clock** -- advance the tick counter.
//! 2. **Update** -- every area steps its characters' actions, then
//!    integrates their movement.
//! 3. **Effects** -- progress events, dialogs, despawns and area
//!    transitions produced by the update are routed to sessions.
//! 4. **Dispatch** -- commands buffered since the previous tick are
//!    validated and attached; they start executing next tick.
//! 5. **Compact** -- entities removed during the tick are swept from their
//!    registries.
//!
//! No phase suspends, and nothing outside [`run_tick`] mutates the world
//! while a tick is in progress. A failure routing one session's effects
//! is logged and never ends the tick.

use tracing::debug;

use crate::clock::ClockError;
use crate::world::{DispatchStats, World};

/// Errors that can occur during tick execution.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    /// The tick number that was executed.
    pub tick: u64,
    /// Effects produced by area updates.
    pub effects: usize,
    /// Outcome of command dispatch.
    pub commands: DispatchStats,
    /// Entities swept at the end of the tick.
    pub entities_removed: usize,
    /// Sessions connected at the end of the tick.
    pub sessions: usize,
}

/// Execute one complete tick of the simulation.
///
/// # Phases
///
/// 1. Clock
/// 2. Update
/// 3. Effects
/// 4. Dispatch
/// 5. Compact
pub fn run_tick(world: &mut World) -> Result<TickSummary, TickError> {
    // --- Phase 1: Clock ---
    let tick = world.clock_mut().advance()?;
    let delta_seconds = world.clock().delta_seconds();

    // --- Phase 2: Update ---
    let updates: Vec<_> = world
        .areas_mut()
        .map(|(name, area)| (name.clone(), area.update(delta_seconds)))
        .collect();

    // --- Phase 3: Effects ---
    let mut effects = 0_usize;
    for (area_name, area_effects) in updates {
        effects = effects.saturating_add(area_effects.len());
        world.apply_effects(&area_name, area_effects);
    }

    // --- Phase 4: Dispatch ---
    let commands = world.dispatch_commands();

    // --- Phase 5: Compact ---
    let entities_removed = world.compact();

    debug!(tick, effects, entities_removed, "Tick complete");

    Ok(TickSummary {
        tick,
        effects,
        commands,
        entities_removed,
        sessions: world.session_count(),
    })
}

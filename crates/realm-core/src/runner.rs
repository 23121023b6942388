//! Simulation loop runner with operator controls.
//!
//! This module provides [`run_simulation`], the top-level async function
//! that drives the tick loop with support for:
//!
//! - **Bounded simulation**: stop after `max_ticks` or `max_real_time_seconds`
//! - **Pause/resume**: operator can halt and continue the tick loop
//! - **Variable tick speed**: tick interval adjustable at runtime
//! - **Client input**: connects, readies, commands and disconnects arrive
//!   over a channel and are applied only between ticks
//!
//! The runner wraps the single-tick [`run_tick`] function and adds the
//! control plane around it.
//!
//! [`run_tick`]: crate::tick::run_tick

use std::sync::Arc;

use realm_types::{ClientCommand, SessionId};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::connection::Connection;
use crate::operator::{OperatorState, SimulationEndReason};
use crate::tick::{self, TickError, TickSummary};
use crate::world::World;

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick execution failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// Result of the simulation run.
#[derive(Debug)]
pub struct SimulationResult {
    /// The reason the simulation ended.
    pub end_reason: SimulationEndReason,
    /// The last tick summary, if any tick completed.
    pub final_summary: Option<TickSummary>,
    /// Total number of ticks executed.
    pub total_ticks: u64,
}

/// Something a transport task asks of the world.
#[derive(Debug)]
pub enum WorldInput {
    /// A client finished its handshake.
    Connect {
        /// Name the player logged in with.
        username: String,
        /// Outbound side of the client's socket.
        connection: Box<dyn Connection>,
        /// Receives the new session id once the character is spawned.
        reply: Option<oneshot::Sender<SessionId>>,
    },
    /// The client is ready to receive its area.
    Ready {
        /// Session that sent `ready`.
        session: SessionId,
    },
    /// An action request.
    Command {
        /// Sending session.
        session: SessionId,
        /// The decoded command.
        command: ClientCommand,
    },
    /// The socket went away.
    Disconnect {
        /// Session whose socket closed.
        session: SessionId,
    },
}

/// Apply one input to the world. Failures are logged, never fatal: a bad
/// client must not stop the simulation.
pub fn apply_input(world: &mut World, input: WorldInput) {
    match input {
        WorldInput::Connect {
            username,
            connection,
            reply,
        } => match world.connect_user(&username, connection) {
            Ok(session) => {
                if let Some(reply) = reply {
                    let _ = reply.send(session);
                }
            }
            Err(e) => warn!(username = %username, error = %e, "Failed to connect user"),
        },
        WorldInput::Ready { session } => {
            if let Err(e) = world.ready(session) {
                debug!(session_id = %session, error = %e, "Ready ignored");
            }
        }
        WorldInput::Command { session, command } => {
            if !world.enqueue_command(session, command) {
                debug!(session_id = %session, "Command from unknown session dropped");
            }
        }
        WorldInput::Disconnect { session } => {
            if let Err(e) = world.disconnect_user(session) {
                debug!(session_id = %session, error = %e, "Disconnect ignored");
            }
        }
    }
}

/// Apply every input currently queued without waiting for more.
///
/// Returns the number of inputs applied.
pub fn drain_inputs(world: &mut World, inputs: &mut mpsc::UnboundedReceiver<WorldInput>) -> usize {
    let mut applied = 0_usize;
    while let Ok(input) = inputs.try_recv() {
        apply_input(world, input);
        applied = applied.saturating_add(1);
    }
    applied
}

/// Callback invoked after each tick completes.
///
/// Implementations can use this to publish tick summaries or inspect the
/// world between ticks.
pub trait TickCallback: Send {
    /// Called after a tick completes successfully.
    fn on_tick(&mut self, summary: &TickSummary, world: &World);
}

/// A no-op tick callback for testing.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _world: &World) {}
}

/// Run the simulation loop until a termination condition is met.
///
/// Inputs queued on `inputs` are applied at the start of each iteration,
/// so every tick observes a fixed world. Ticks start on a fixed cadence of
/// the operator's tick interval; a slow tick delays the next one rather
/// than shortening simulated time.
///
/// # Errors
///
/// Returns [`RunnerError`] if a tick execution fails unrecoverably.
pub async fn run_simulation(
    world: &mut World,
    inputs: &mut mpsc::UnboundedReceiver<WorldInput>,
    operator: &Arc<OperatorState>,
    callback: &mut dyn TickCallback,
) -> Result<SimulationResult, RunnerError> {
    let mut last_summary: Option<TickSummary> = None;
    let mut total_ticks: u64 = 0;

    info!(
        max_ticks = operator.max_ticks(),
        max_real_time_seconds = operator.max_real_time_seconds(),
        tick_interval_ms = operator.tick_interval_ms(),
        "Simulation starting"
    );

    loop {
        // --- Check pause ---
        if operator.is_paused() {
            info!("Simulation paused, waiting for resume...");
            operator.wait_if_paused().await;
            info!("Simulation resumed");
        }

        // --- Check stop request (before tick) ---
        if operator.is_stop_requested() {
            info!("Operator stop requested");
            return Ok(finish(operator, SimulationEndReason::OperatorStop, last_summary, total_ticks).await);
        }

        // --- Check time limit (before tick) ---
        if operator.time_limit_reached() {
            info!(
                max_seconds = operator.max_real_time_seconds(),
                elapsed = operator.elapsed_seconds(),
                "Real-time limit reached"
            );
            let result =
                finish(operator, SimulationEndReason::MaxRealTimeReached, last_summary, total_ticks).await;
            return Ok(result);
        }

        let tick_started = Instant::now();

        // --- Apply client input ---
        drain_inputs(world, inputs);

        // --- Execute tick ---
        let summary = tick::run_tick(world)?;
        total_ticks = total_ticks.saturating_add(1);

        // --- Notify callback ---
        callback.on_tick(&summary, world);

        // --- Check tick limit (after tick) ---
        if operator.tick_limit_reached(summary.tick) {
            info!(
                tick = summary.tick,
                max_ticks = operator.max_ticks(),
                "Tick limit reached"
            );
            let result =
                finish(operator, SimulationEndReason::MaxTicksReached, Some(summary), total_ticks).await;
            return Ok(result);
        }

        last_summary = Some(summary);

        // --- Sleep until the next tick is due ---
        let interval = Duration::from_millis(operator.tick_interval_ms());
        tokio::time::sleep_until(tick_started + interval).await;
    }
}

async fn finish(
    operator: &OperatorState,
    reason: SimulationEndReason,
    final_summary: Option<TickSummary>,
    total_ticks: u64,
) -> SimulationResult {
    operator.set_end_reason(reason.clone()).await;
    SimulationResult {
        end_reason: reason,
        final_summary,
        total_ticks,
    }
}

/// Log the simulation end sequence.
///
/// Call after [`run_simulation`] returns.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        final_tick = result.final_summary.as_ref().map(|s| s.tick),
        "Simulation ended"
    );

    if let Some(ref summary) = result.final_summary {
        info!(
            tick = summary.tick,
            sessions = summary.sessions,
            effects = summary.effects,
            "Final tick summary"
        );
    } else {
        warn!("Simulation ended with no ticks executed");
    }
}

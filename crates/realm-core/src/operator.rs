//! Runtime controls for the tick loop.
//!
//! [`OperatorState`] is shared between the loop and whatever accepts
//! operator input (the engine reads [`OperatorCommand`]s from its console).
//! Every field is atomic or behind an async lock, so the loop never blocks
//! on an operator.
//!
//! Speed changes only alter real-time cadence. Each tick still advances
//! the world by the clock's fixed step.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, Notify};

use crate::config::SimulationBoundsConfig;

/// Floor for [`OperatorCommand::Speed`].
pub const MIN_TICK_INTERVAL_MS: u64 = 10;

/// Why [`run_simulation`](crate::runner::run_simulation) returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationEndReason {
    /// `simulation.max_ticks` ticks ran.
    MaxTicksReached,
    /// `simulation.max_real_time_seconds` elapsed.
    MaxRealTimeReached,
    /// Stopped on request.
    OperatorStop,
}

/// A control request, one per console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCommand {
    /// Hold the loop before its next tick.
    Pause,
    /// Release a held loop.
    Resume,
    /// Change the real-time tick interval, in milliseconds.
    Speed(u64),
    /// End the run after the current tick.
    Stop,
    /// Report the current control state.
    Status,
}

impl OperatorCommand {
    /// Parse `pause`, `resume`, `speed <ms>`, `stop` or `status`.
    pub fn parse(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace();
        let command = match (words.next()?, words.next()) {
            ("pause", None) => Self::Pause,
            ("resume", None) => Self::Resume,
            ("stop", None) => Self::Stop,
            ("status", None) => Self::Status,
            ("speed", Some(ms)) => Self::Speed(ms.parse().ok()?),
            _ => return None,
        };
        words.next().is_none().then_some(command)
    }
}

/// Shared loop control state.
#[derive(Debug)]
pub struct OperatorState {
    paused: AtomicBool,
    resume_notify: Notify,
    stop_requested: AtomicBool,
    tick_interval_ms: AtomicU64,
    started_at: DateTime<Utc>,
    /// 0 = unlimited.
    max_ticks: u64,
    /// 0 = unlimited.
    max_real_time_seconds: u64,
    end_reason: Mutex<Option<SimulationEndReason>>,
}

impl OperatorState {
    /// Controls for a run starting now.
    pub fn new(tick_interval_ms: u64, bounds: &SimulationBoundsConfig) -> Self {
        Self {
            paused: AtomicBool::new(false),
            resume_notify: Notify::new(),
            stop_requested: AtomicBool::new(false),
            tick_interval_ms: AtomicU64::new(tick_interval_ms),
            started_at: Utc::now(),
            max_ticks: bounds.max_ticks,
            max_real_time_seconds: bounds.max_real_time_seconds,
            end_reason: Mutex::new(None),
        }
    }

    /// Carry out `command` and describe the outcome for the operator.
    pub fn apply(&self, command: OperatorCommand) -> String {
        match command {
            OperatorCommand::Pause => {
                self.pause();
                "Simulation paused".to_owned()
            }
            OperatorCommand::Resume => {
                self.resume();
                "Simulation resumed".to_owned()
            }
            OperatorCommand::Speed(ms) => self.set_tick_interval_ms(ms).map_or_else(
                || format!("Tick interval must be at least {MIN_TICK_INTERVAL_MS}ms"),
                |prev| format!("Tick interval changed from {prev}ms to {ms}ms"),
            ),
            OperatorCommand::Stop => {
                self.request_stop();
                "Stop requested".to_owned()
            }
            OperatorCommand::Status => format!(
                "paused={} tick_interval_ms={} elapsed_seconds={}",
                self.is_paused(),
                self.tick_interval_ms(),
                self.elapsed_seconds()
            ),
        }
    }

    /// Whether the loop is held.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Hold the loop before its next tick.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Release the loop.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        self.resume_notify.notify_one();
    }

    /// Return once the loop is not held.
    pub async fn wait_if_paused(&self) {
        while self.paused.load(Ordering::Acquire) {
            self.resume_notify.notified().await;
        }
    }

    /// Ask the loop to end before its next tick. Also releases a held loop.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.resume();
    }

    /// Whether a stop was requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Record why the run ended.
    pub async fn set_end_reason(&self, reason: SimulationEndReason) {
        *self.end_reason.lock().await = Some(reason);
    }

    /// Why the run ended, once it has.
    pub async fn end_reason(&self) -> Option<SimulationEndReason> {
        self.end_reason.lock().await.clone()
    }

    /// Real-time milliseconds between tick starts.
    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms.load(Ordering::Acquire)
    }

    /// Change the interval. Returns the previous one, or `None` (and no
    /// change) below [`MIN_TICK_INTERVAL_MS`].
    pub fn set_tick_interval_ms(&self, ms: u64) -> Option<u64> {
        (ms >= MIN_TICK_INTERVAL_MS).then(|| self.tick_interval_ms.swap(ms, Ordering::AcqRel))
    }

    /// Whether `current_tick` has reached a nonzero `max_ticks`.
    pub const fn tick_limit_reached(&self, current_tick: u64) -> bool {
        self.max_ticks > 0 && current_tick >= self.max_ticks
    }

    /// Whether a nonzero `max_real_time_seconds` has elapsed.
    pub fn time_limit_reached(&self) -> bool {
        self.max_real_time_seconds > 0 && self.elapsed_seconds() >= self.max_real_time_seconds
    }

    /// Whole seconds since the run started.
    pub fn elapsed_seconds(&self) -> u64 {
        let elapsed = Utc::now().signed_duration_since(self.started_at).num_seconds();
        // A clock stepped backwards reads as zero.
        u64::try_from(elapsed).unwrap_or(0)
    }

    /// Configured tick bound.
    pub const fn max_ticks(&self) -> u64 {
        self.max_ticks
    }

    /// Configured wall-clock bound.
    pub const fn max_real_time_seconds(&self) -> u64 {
        self.max_real_time_seconds
    }
}

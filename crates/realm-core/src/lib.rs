//! Tick scheduling, sessions, and world orchestration for the Realm
//! simulation core.
//!
//! This crate owns the fixed-rate tick cycle that drives every area:
//! Clock, Update, Effects, Dispatch, and Compact. Client input is applied
//! only between ticks.
//!
//! # Modules
//!
//! - [`clock`] -- Tick counter and fixed simulation step.
//! - [`config`] -- Configuration loading from `realm-config.yaml` into
//!   strongly-typed structs.
//! - [`connection`] -- [`Connection`] trait and the channel-backed
//!   [`ChannelConnection`].
//! - [`content`] -- Entity, area and story data files.
//! - [`operator`] -- Pause, resume, speed and stop controls.
//! - [`runner`] -- The async loop around [`run_tick`].
//! - [`session`] -- A connected player and their progress.
//! - [`tick`] -- The single-tick engine.
//! - [`world`] -- Areas, sessions, and effect routing.
//!
//! [`Connection`]: connection::Connection
//! [`ChannelConnection`]: connection::ChannelConnection
//! [`run_tick`]: tick::run_tick

pub mod clock;
pub mod config;
pub mod connection;
pub mod content;
pub mod operator;
pub mod runner;
pub mod session;
pub mod tick;
pub mod world;

pub use clock::{ClockError, TickClock};
pub use config::{ConfigError, RealmConfig};
pub use connection::{ChannelConnection, Connection, Outbound};
pub use content::{Content, ContentError};
pub use operator::{OperatorCommand, OperatorState, SimulationEndReason};
pub use runner::{
    NoOpCallback, RunnerError, SimulationResult, TickCallback, WorldInput, run_simulation,
};
pub use session::Session;
pub use tick::{TickError, TickSummary, run_tick};
pub use world::{DispatchStats, RealmError, World};

//! Shared type definitions for the Realm simulation core.
//!
//! This crate is the vocabulary every other Realm crate speaks: identifiers,
//! world-space vectors, the closed enumerations the state machines switch on,
//! the [`Action`] sum type produced by the action pipeline, and the wire
//! protocol exchanged with client connections. Wire types flow to the client
//! as `TypeScript` via `ts-rs`.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for network and session identifiers
//! - [`vector`] -- [`Vec2`], the continuous 2D coordinate used for positions
//! - [`enums`] -- Entity kinds, capability tags, movement states, command kinds
//! - [`actions`] -- The [`Action`] variants attached to characters
//! - [`protocol`] -- Inbound commands and outbound server messages

pub mod actions;
pub mod enums;
pub mod ids;
pub mod protocol;
pub mod vector;

pub use actions::{Action, RANGE_EXACT, RANGE_INTERACT};
pub use enums::{ActionKind, CommandKind, EntityKind, MovementState, ProgressEventKind};
pub use ids::{NetworkId, SessionId};
pub use protocol::{
    ClientCommand, ConditionView, EntitySnapshot, LogItem, MessageView, QuestStageView,
    QuestView, ServerMessage,
};
pub use vector::Vec2;

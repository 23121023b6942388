//! Areas, entities, movement and the action pipeline of the Realm
//! simulation core.
//!
//! An [`Area`] owns an [`EntityRegistry`] and a [`Navigator`]. Every tick
//! the area runs the action executor over its characters, then integrates
//! their movement. Entities removed during a tick stay flagged in the
//! registry until [`Area::compact`] runs at the tick boundary.
//!
//! # Modules
//!
//! - [`entity`] -- Entities and the character state machine
//! - [`registry`] -- Per-area entity storage with mark/sweep removal
//! - [`movement`] -- The per-tick movement integrator
//! - [`navigator`] -- Pathfinding seam and a grid implementation
//! - [`catalog`] -- Entity templates by type name
//! - [`area`] -- Areas and their per-tick update
//! - [`actions`] -- Command validation, dispatch and execution
//! - [`error`] -- World error types

pub mod actions;
pub mod area;
pub mod catalog;
pub mod entity;
pub mod error;
pub mod movement;
pub mod navigator;
pub mod registry;

pub use actions::{ActionEffect, Rejection, build_action, dispatch_command, start_action, step_actions};
pub use area::Area;
pub use catalog::{EntityCatalog, EntityTemplate};
pub use entity::{ActiveAction, AreaLinkData, Character, Entity, EntityBody};
pub use error::WorldError;
pub use movement::{MovementOutcome, integrate};
pub use navigator::{GridNavigator, Navigator};
pub use registry::EntityRegistry;

//! Action pipeline and executor.
//!
//! Commands from a session pass through [`build_action`], which either
//! produces a typed [`Action`](realm_types::Action) or a [`Rejection`].
//! Accepted actions are attached to the actor with [`start_action`] and
//! driven tick over tick by [`step_actions`], which reports what happened
//! as [`ActionEffect`]s for the world to route to sessions.
//!
//! # Modules
//!
//! - [`pipeline`] -- Command validation and dispatch
//! - [`executor`] -- Per-tick execution of attached actions

pub mod executor;
pub mod pipeline;

use realm_types::{NetworkId, ProgressEventKind, SessionId};

use crate::entity::AreaLinkData;

pub use executor::step_actions;
pub use pipeline::{build_action, dispatch_command, start_action};

/// Why a command was dropped without creating an action.
///
/// Rejections are silent towards the client. Only
/// [`Rejection::UnknownCommand`] is a protocol violation that closes the
/// issuing connection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// The target could not be parsed as a position or entity id.
    #[error("malformed target")]
    MalformedTarget,

    /// The target entity does not exist or was removed.
    #[error("target entity {0} is not in the area")]
    TargetMissing(NetworkId),

    /// No path leads to the target.
    #[error("target entity {0} is unreachable")]
    Unreachable(NetworkId),

    /// The acting character is not in the area.
    #[error("actor {0} is not a live character in the area")]
    ActorMissing(NetworkId),

    /// The command kind is not part of the protocol.
    #[error("unknown command kind: {0}")]
    UnknownCommand(String),
}

impl Rejection {
    /// Whether the rejection should terminate the issuing connection.
    pub const fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::UnknownCommand(_))
    }
}

/// A side effect of executing an action, routed by the world after the
/// area update.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionEffect {
    /// A progress event for the owning session.
    Progress {
        /// Session whose progress receives the event.
        owner: SessionId,
        /// Event kind.
        kind: ProgressEventKind,
        /// Event value, usually the target's name.
        value: String,
    },
    /// Open a dialog for the owning session.
    Dialog {
        /// Session that sees the dialog.
        owner: SessionId,
        /// Entity the dialog belongs to.
        source: NetworkId,
        /// Dialog title.
        title: Option<String>,
        /// Dialog text.
        text: String,
    },
    /// The owning session closed its dialog.
    DialogClosed {
        /// Session that closed the dialog.
        owner: SessionId,
    },
    /// An entity was removed and every viewer should drop it.
    Despawn {
        /// The removed entity.
        network_id: NetworkId,
    },
    /// A character stepped onto an area link.
    Transition {
        /// Session controlling the character.
        owner: SessionId,
        /// The travelling character.
        actor: NetworkId,
        /// Where the link leads.
        link: AreaLinkData,
    },
}

//! The actions a character can be executing.
//!
//! An [`Action`] is built by the action pipeline once a command has passed
//! validation, attached to its actor, executed over one or more ticks and
//! then dropped. Actions are never reused.

use crate::ids::NetworkId;
use crate::vector::Vec2;

/// Required range for actions that must be performed standing on the target.
pub const RANGE_EXACT: f64 = 0.0;

/// Required range for actions performed from an adjacent cell.
pub const RANGE_INTERACT: f64 = 1.0;

/// A validated, typed action attached to a character.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Walk to a position. Reachability is decided when execution starts.
    Move {
        /// Where to go.
        destination: Vec2,
    },
    /// Approach an entity and talk to it.
    Talk {
        /// The entity to talk to.
        target: NetworkId,
    },
    /// Approach an entity and strike it until it is gone.
    Attack {
        /// The entity to attack.
        target: NetworkId,
    },
    /// Step onto an area link and travel through it.
    AreaLink {
        /// The link entity.
        target: NetworkId,
    },
    /// Step onto an entity and configure it.
    Configure {
        /// The entity to configure.
        target: NetworkId,
    },
    /// Pick an option in the open dialog.
    Option {
        /// Raw option value as sent by the client.
        value: serde_json::Value,
    },
    /// Close the open dialog or menu.
    Close {
        /// Raw target as sent by the client.
        value: serde_json::Value,
    },
}

impl Action {
    /// The entity this action is aimed at, if any.
    pub const fn target_entity(&self) -> Option<NetworkId> {
        match self {
            Self::Talk { target }
            | Self::Attack { target }
            | Self::AreaLink { target }
            | Self::Configure { target } => Some(*target),
            Self::Move { .. } | Self::Option { .. } | Self::Close { .. } => None,
        }
    }

    /// Distance the actor must be within before the effect applies.
    pub const fn required_range(&self) -> f64 {
        match self {
            Self::Talk { .. } | Self::Attack { .. } => RANGE_INTERACT,
            Self::Move { .. }
            | Self::AreaLink { .. }
            | Self::Configure { .. }
            | Self::Option { .. }
            | Self::Close { .. } => RANGE_EXACT,
        }
    }

    /// Whether the action completes within the tick it starts, with no
    /// movement component.
    pub const fn is_immediate(&self) -> bool {
        matches!(self, Self::Option { .. } | Self::Close { .. })
    }

    /// Short name used in logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Move { .. } => "move",
            Self::Talk { .. } => "talk",
            Self::Attack { .. } => "attack",
            Self::AreaLink { .. } => "link",
            Self::Configure { .. } => "configure",
            Self::Option { .. } => "option",
            Self::Close { .. } => "close",
        }
    }
}

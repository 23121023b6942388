//! Enumeration types for the Realm simulation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// The kind of an entity, fixed at spawn time.
///
/// [`EntityKind::Ground`] marks static geometry. The registry stores ground
/// entities ahead of everything else so iteration visits scenery first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum EntityKind {
    /// Static floor or scenery tile.
    Ground,
    /// A character controlled by a connected user.
    Player,
    /// A non-player character that can be talked to.
    Npc,
    /// A hostile non-player character.
    Enemy,
    /// A container that can be opened.
    Container,
    /// A device or object that can be configured.
    Interactable,
    /// A doorway into another area.
    AreaLink,
}

impl EntityKind {
    /// Whether entities of this kind are static geometry.
    pub const fn is_static(self) -> bool {
        matches!(self, Self::Ground)
    }
}

/// A capability tag advertising which commands an entity accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum ActionKind {
    /// The entity can be talked to.
    Talk,
    /// The entity can be attacked.
    Attack,
    /// The entity leads to another area.
    Link,
    /// The entity can be configured.
    Configure,
}

/// The movement/behaviour state of a character.
///
/// `Moving` implies a non-empty path; `Idle` implies neither a path nor a
/// pending path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum MovementState {
    /// Standing still on a grid cell.
    #[default]
    Idle,
    /// Following a path.
    Moving,
    /// Striking a target in range.
    Attacking,
}

/// The command kinds a client may issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CommandKind {
    /// Walk to a position.
    Move,
    /// Talk to an entity.
    Talk,
    /// Attack an entity.
    Attack,
    /// Take an area link.
    Link,
    /// Configure an entity.
    Configure,
    /// Pick a dialog option.
    Option,
    /// Close a dialog or menu.
    Close,
}

impl CommandKind {
    /// Parse the `action` field of an inbound command.
    ///
    /// Returns `None` for anything outside the protocol, which the caller
    /// treats as a contract violation.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "move" => Some(Self::Move),
            "talk" => Some(Self::Talk),
            "attack" => Some(Self::Attack),
            "link" => Some(Self::Link),
            "configure" => Some(Self::Configure),
            "option" => Some(Self::Option),
            "close" => Some(Self::Close),
            _ => None,
        }
    }

    /// Whether the command addresses an entity that must be resolved and
    /// reachable before an action is built.
    pub const fn targets_entity(self) -> bool {
        matches!(self, Self::Talk | Self::Attack | Self::Link | Self::Configure)
    }
}

/// The kinds of world event a progress condition can wait for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum ProgressEventKind {
    /// The user entered an area; the value is the area name.
    EnterArea,
    /// The user talked to an entity; the value is its name.
    Talk,
    /// The user struck an entity; the value is its name.
    Attack,
    /// The user killed an entity; the value is its name.
    Kill,
    /// The user configured an entity; the value is its name.
    Configure,
    /// The user picked a dialog option; the value is the option.
    Option,
}

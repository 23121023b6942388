//! Wire protocol between the simulation core and client connections.
//!
//! Field names are part of the client contract. Outbound messages are
//! internally tagged with a `type` field.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{ActionKind, EntityKind, MovementState};
use crate::ids::NetworkId;
use crate::vector::Vec2;

/// A raw command received from a client.
///
/// `action` is kept as a string so that unknown command kinds reach the
/// pipeline and can be treated as protocol violations rather than parse
/// failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ClientCommand {
    /// Command kind: one of `move`, `talk`, `attack`, `link`, `configure`,
    /// `option`, `close`.
    pub action: String,
    /// A position for `move`, a network id for entity commands, or an
    /// opaque value for dialog commands.
    #[serde(default)]
    pub target: serde_json::Value,
}

/// Client-visible projection of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EntitySnapshot {
    /// Network id; absent for world-fixed scenery.
    pub nid: Option<NetworkId>,
    /// Entity kind.
    pub kind: EntityKind,
    /// Display name.
    pub name: String,
    /// Current position.
    pub pos: Vec2,
    /// Commands the entity accepts.
    pub actions: Vec<ActionKind>,
    /// Movement state for characters, `idle` otherwise.
    pub state: MovementState,
    /// Remaining waypoints, so clients can interpolate movement.
    pub path: Vec<Vec2>,
    /// Movement speed in units per second.
    pub speed: f64,
}

/// One condition line of a quest stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ConditionView {
    /// Text shown in the log.
    pub text: String,
    /// Whether the condition has been met.
    pub done: bool,
}

/// A revealed quest stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct QuestStageView {
    /// Stage key, unique within its quest.
    pub key: String,
    /// Stage description.
    pub text: String,
    /// Every condition of the stage with its completion flag.
    pub conditions: Vec<ConditionView>,
}

/// A quest as shown in the client log. Only revealed stages are included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct QuestView {
    /// Quest key.
    pub key: String,
    /// Quest title.
    pub title: String,
    /// Quest description.
    pub text: String,
    /// Revealed stages in order.
    pub stages: Vec<QuestStageView>,
    /// Whether the final stage has been completed.
    pub completed: bool,
}

/// A story message that has become visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MessageView {
    /// Message key.
    pub key: String,
    /// Message title.
    pub title: String,
    /// Message body.
    pub text: String,
}

/// An entry in the client's progress log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum LogItem {
    /// A quest and its revealed stages.
    Quest(QuestView),
    /// A visible story message.
    Message(MessageView),
}

/// A message sent from the simulation core to one client connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum ServerMessage {
    /// Full description of the area the user is in.
    AreaData {
        /// Floor tile ids, row-major.
        floor: Vec<Vec<u16>>,
        /// Wall tile ids, row-major.
        walls: Vec<Vec<u16>>,
        /// Walkability grid forwarded from the navigator.
        walkable: Vec<Vec<bool>>,
        /// Every live entity in the area.
        entities: Vec<EntitySnapshot>,
        /// Background music track.
        music: Option<String>,
    },
    /// The user's progress log at session start.
    LogData {
        /// All quests.
        quests: Vec<LogItem>,
        /// Visible messages only.
        messages: Vec<LogItem>,
    },
    /// The user's own character.
    Player {
        /// The character snapshot.
        entity: EntitySnapshot,
    },
    /// An entity appeared in the user's area.
    Add {
        /// The new entity.
        entity: EntitySnapshot,
    },
    /// An entity left the user's area.
    Remove {
        /// Network id of the departed entity.
        #[serde(rename = "networkId")]
        network_id: NetworkId,
    },
    /// A one-shot dialog.
    Dialog {
        /// Optional dialog title.
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        /// Dialog body.
        text: String,
    },
    /// One log item changed.
    LogUpdate {
        /// The changed item.
        item: LogItem,
    },
}

impl ServerMessage {
    /// The `type` tag of this message, for logging.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::AreaData { .. } => "areaData",
            Self::LogData { .. } => "logData",
            Self::Player { .. } => "player",
            Self::Add { .. } => "add",
            Self::Remove { .. } => "remove",
            Self::Dialog { .. } => "dialog",
            Self::LogUpdate { .. } => "logUpdate",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn remove_uses_network_id_field() {
        let id = NetworkId::new();
        let value = serde_json::to_value(ServerMessage::Remove { network_id: id }).unwrap();
        assert_eq!(value["type"], "remove");
        assert_eq!(value["networkId"], id.to_string());
    }

    #[test]
    fn dialog_without_title_omits_it() {
        let value = serde_json::to_value(ServerMessage::Dialog {
            title: None,
            text: "Hello".to_owned(),
        })
        .unwrap();
        assert_eq!(value["type"], "dialog");
        assert!(value.get("title").is_none());
    }

    #[test]
    fn message_log_item_is_tagged() {
        let item = LogItem::Message(MessageView {
            key: "welcome".to_owned(),
            title: "Welcome".to_owned(),
            text: "Find the elder.".to_owned(),
        });
        let value = serde_json::to_value(ServerMessage::LogUpdate { item }).unwrap();
        assert_eq!(value["type"], "logUpdate");
        assert_eq!(value["item"]["type"], "message");
        assert_eq!(value["item"]["key"], "welcome");
    }

    #[test]
    fn client_command_target_defaults_to_null() {
        let cmd: ClientCommand = serde_json::from_str(r#"{"action":"close"}"#).unwrap();
        assert_eq!(cmd.action, "close");
        assert!(cmd.target.is_null());
    }
}

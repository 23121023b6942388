//! Turning raw client commands into typed actions.
//!
//! Validation happens once, at dispatch. `move` only needs a parseable
//! position; reachability is decided when the move starts executing.
//! Entity-targeted commands need a live target and a path to it. `option`
//! and `close` carry their target through untouched.

use realm_types::{Action, ClientCommand, CommandKind, NetworkId, ProgressEventKind, Vec2};
use serde_json::Value;
use tracing::debug;

use super::{ActionEffect, Rejection};
use crate::area::Area;
use crate::entity::ActiveAction;
use crate::error::WorldError;

/// Validate `command` issued by `actor` against the current state of
/// `area`.
///
/// # Errors
///
/// Returns the [`Rejection`] reason when the command is dropped. The area
/// is never modified.
pub fn build_action(area: &Area, actor: NetworkId, command: &ClientCommand) -> Result<Action, Rejection> {
    let kind = CommandKind::parse(&command.action)
        .ok_or_else(|| Rejection::UnknownCommand(command.action.clone()))?;

    let actor_entity = area
        .registry()
        .get_live(actor)
        .filter(|e| e.character().is_some())
        .ok_or(Rejection::ActorMissing(actor))?;

    match kind {
        CommandKind::Move => {
            let destination = parse_position(&command.target)?;
            Ok(Action::Move { destination })
        }
        CommandKind::Talk | CommandKind::Attack | CommandKind::Link | CommandKind::Configure => {
            let target = parse_network_id(&command.target)?;
            let target_entity = area
                .registry()
                .get_live(target)
                .ok_or(Rejection::TargetMissing(target))?;
            if area
                .navigator()
                .find_path(actor_entity.position.rounded(), target_entity.position)
                .is_none()
            {
                return Err(Rejection::Unreachable(target));
            }
            Ok(match kind {
                CommandKind::Talk => Action::Talk { target },
                CommandKind::Attack => Action::Attack { target },
                CommandKind::Link => Action::AreaLink { target },
                _ => Action::Configure { target },
            })
        }
        CommandKind::Option => Ok(Action::Option {
            value: command.target.clone(),
        }),
        CommandKind::Close => Ok(Action::Close {
            value: command.target.clone(),
        }),
    }
}

/// Hand `action` to `actor`.
///
/// Movement-bearing actions interrupt whatever the actor was doing: the
/// previous action is discarded and the current route is cut back to the
/// waypoint being approached. Immediate actions (`option`, `close`) resolve
/// on the spot and leave the actor's movement untouched; their effects are
/// returned.
///
/// # Errors
///
/// Returns [`WorldError::EntityNotFound`] or [`WorldError::NotACharacter`]
/// if `actor` cannot hold an action.
pub fn start_action(area: &mut Area, actor: NetworkId, action: Action) -> Result<Vec<ActionEffect>, WorldError> {
    let entity = area
        .registry_mut()
        .get_by_id_mut(actor)
        .filter(|e| !e.is_removed())
        .ok_or(WorldError::EntityNotFound(actor))?;
    let owner = entity.owner;
    let character = entity
        .character_mut()
        .ok_or(WorldError::NotACharacter(actor))?;

    debug!(network_id = %actor, action = action.name(), "action started");

    match action {
        Action::Option { value } => Ok(owner
            .map(|owner| ActionEffect::Progress {
                owner,
                kind: ProgressEventKind::Option,
                value: option_value(&value),
            })
            .into_iter()
            .collect()),
        Action::Close { .. } => Ok(owner
            .map(|owner| ActionEffect::DialogClosed { owner })
            .into_iter()
            .collect()),
        other => {
            character.stop_at_next_waypoint();
            character.end_attacking();
            character.attach_action(ActiveAction::new(other));
            Ok(Vec::new())
        }
    }
}

/// Validate and start a command in one go, logging rejections.
///
/// # Errors
///
/// Returns the rejection so the caller can close the connection on
/// protocol violations.
pub fn dispatch_command(
    area: &mut Area,
    actor: NetworkId,
    command: &ClientCommand,
) -> Result<Vec<ActionEffect>, Rejection> {
    let action = build_action(area, actor, command).inspect_err(|reason| {
        debug!(network_id = %actor, command = %command.action, %reason, "command rejected");
    })?;
    start_action(area, actor, action).map_err(|err| {
        debug!(network_id = %actor, error = %err, "actor vanished before dispatch");
        Rejection::ActorMissing(actor)
    })
}

fn parse_position(raw: &Value) -> Result<Vec2, Rejection> {
    serde_json::from_value::<Vec2>(raw.clone())
        .ok()
        .filter(|pos| pos.is_finite())
        .ok_or(Rejection::MalformedTarget)
}

fn parse_network_id(raw: &Value) -> Result<NetworkId, Rejection> {
    serde_json::from_value::<NetworkId>(raw.clone()).map_err(|_| Rejection::MalformedTarget)
}

fn option_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

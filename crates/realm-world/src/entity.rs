//! Simulation entities and the character state machine.
//!
//! An [`Entity`] is anything placed in an area. Characters carry the
//! movement state, path queue and active action slot that the movement
//! integrator and action executor drive tick over tick.

use std::collections::{BTreeSet, VecDeque};

use realm_types::{
    Action, ActionKind, EntityKind, EntitySnapshot, MovementState, NetworkId, SessionId, Vec2,
};
use serde::{Deserialize, Serialize};

/// Where an area link leads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaLinkData {
    /// Name of the destination area.
    pub target_area: String,
    /// Link type in the destination area where the traveller appears.
    pub target_link: String,
}

/// Kind-specific entity state.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityBody {
    /// Static geometry or an object without behaviour.
    Scenery,
    /// A character with movement and actions.
    Character(Character),
    /// A doorway into another area.
    Link(AreaLinkData),
}

/// An action attached to a character together with its execution progress.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveAction {
    /// The action being executed.
    pub action: Action,
    /// Grid cell the current approach path leads to, if one was planned.
    pub approach_goal: Option<Vec2>,
    /// Whether a `Move` has already planned its path.
    pub started: bool,
}

impl ActiveAction {
    /// Wrap a freshly built action.
    pub const fn new(action: Action) -> Self {
        Self {
            action,
            approach_goal: None,
            started: false,
        }
    }
}

/// Movement and action state of a character.
#[derive(Debug, Clone, PartialEq)]
pub struct Character {
    state: MovementState,
    path: VecDeque<Vec2>,
    pending_path: Option<VecDeque<Vec2>>,
    /// Movement speed in units per second.
    pub speed: f64,
    /// Health removed from a target per strike.
    pub damage: u32,
    active: Option<ActiveAction>,
}

impl Character {
    /// Create an idle character.
    pub const fn new(speed: f64, damage: u32) -> Self {
        Self {
            state: MovementState::Idle,
            path: VecDeque::new(),
            pending_path: None,
            speed,
            damage,
            active: None,
        }
    }

    /// Current movement state.
    pub const fn state(&self) -> MovementState {
        self.state
    }

    /// Remaining waypoints of the current path.
    pub const fn path(&self) -> &VecDeque<Vec2> {
        &self.path
    }

    /// The path queued to start once the current one is exhausted.
    pub const fn pending_path(&self) -> Option<&VecDeque<Vec2>> {
        self.pending_path.as_ref()
    }

    /// The action currently attached, if any.
    pub const fn active_action(&self) -> Option<&ActiveAction> {
        self.active.as_ref()
    }

    /// Attach `action`, discarding whatever action was attached before.
    pub fn attach_action(&mut self, action: ActiveAction) {
        self.active = Some(action);
    }

    /// Detach and return the current action.
    pub const fn take_action(&mut self) -> Option<ActiveAction> {
        self.active.take()
    }

    /// Replace the path and start moving. An empty path leaves the
    /// character idle.
    pub fn set_path(&mut self, path: impl IntoIterator<Item = Vec2>) {
        self.path = path.into_iter().collect();
        self.pending_path = None;
        self.state = if self.path.is_empty() {
            MovementState::Idle
        } else {
            MovementState::Moving
        };
    }

    /// Queue a path to follow once the current path is exhausted.
    ///
    /// Has no effect unless the character is moving; an idle character
    /// should be given the path directly with [`set_path`](Self::set_path).
    pub fn set_pending_path(&mut self, path: impl IntoIterator<Item = Vec2>) {
        if self.state != MovementState::Moving {
            return;
        }
        let pending: VecDeque<Vec2> = path.into_iter().collect();
        self.pending_path = if pending.is_empty() { None } else { Some(pending) };
    }

    /// Re-route to a path that starts after the waypoint being approached.
    ///
    /// A moving character keeps only its next waypoint and continues onto
    /// `path` from there, so it never leaves the grid mid-segment. An idle
    /// or attacking character starts on `path` directly.
    pub fn redirect(&mut self, path: Vec<Vec2>) {
        if self.state == MovementState::Moving && !self.path.is_empty() {
            self.path.truncate(1);
            self.set_pending_path(path);
        } else {
            self.set_path(path);
        }
    }

    /// Abandon the rest of the route, finishing only the waypoint being
    /// approached.
    pub fn stop_at_next_waypoint(&mut self) {
        self.path.truncate(1);
        self.pending_path = None;
        if self.path.is_empty() {
            self.state = MovementState::Idle;
        }
    }

    /// Where route planning should start from: the waypoint being
    /// approached, or the grid cell under `position` when standing still.
    pub fn route_origin(&self, position: Vec2) -> Vec2 {
        self.path.front().copied().unwrap_or_else(|| position.rounded())
    }

    /// Enter the attacking state. Only valid while standing still.
    pub fn begin_attacking(&mut self) {
        if self.path.is_empty() {
            self.state = MovementState::Attacking;
        }
    }

    /// Leave the attacking state.
    pub fn end_attacking(&mut self) {
        if self.state == MovementState::Attacking {
            self.state = MovementState::Idle;
        }
    }

    pub(crate) fn go_idle(&mut self) {
        self.state = MovementState::Idle;
        self.path.clear();
        self.pending_path = None;
    }

    pub(crate) const fn path_mut(&mut self) -> &mut VecDeque<Vec2> {
        &mut self.path
    }

    pub(crate) const fn take_pending_path(&mut self) -> Option<VecDeque<Vec2>> {
        self.pending_path.take()
    }
}

/// Anything placed in an area.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    network_id: Option<NetworkId>,
    removed: bool,
    /// Entity kind.
    pub kind: EntityKind,
    /// Display name, also the value reported by progress events.
    pub name: String,
    /// Current position.
    pub position: Vec2,
    /// Commands the entity accepts.
    pub actions: BTreeSet<ActionKind>,
    /// Remaining health for entities that can be killed.
    pub health: Option<u32>,
    /// Text shown when the entity is talked to or configured.
    pub dialog: Option<String>,
    /// The session controlling this entity, for player characters.
    pub owner: Option<SessionId>,
    /// Kind-specific state.
    pub body: EntityBody,
}

impl Entity {
    /// Create an entity. Static kinds get no network id.
    pub fn new(kind: EntityKind, name: impl Into<String>, position: Vec2, body: EntityBody) -> Self {
        let network_id = if kind.is_static() {
            None
        } else {
            Some(NetworkId::new())
        };
        Self {
            network_id,
            removed: false,
            kind,
            name: name.into(),
            position,
            actions: BTreeSet::new(),
            health: None,
            dialog: None,
            owner: None,
            body,
        }
    }

    /// The entity's network id, fixed for its lifetime.
    pub const fn network_id(&self) -> Option<NetworkId> {
        self.network_id
    }

    /// Whether the entity has been marked for removal.
    pub const fn is_removed(&self) -> bool {
        self.removed
    }

    pub(crate) const fn mark_removed(&mut self) {
        self.removed = true;
    }

    /// The character state, if this entity is a character.
    pub const fn character(&self) -> Option<&Character> {
        match &self.body {
            EntityBody::Character(character) => Some(character),
            EntityBody::Scenery | EntityBody::Link(_) => None,
        }
    }

    /// Mutable character state, if this entity is a character.
    pub const fn character_mut(&mut self) -> Option<&mut Character> {
        match &mut self.body {
            EntityBody::Character(character) => Some(character),
            EntityBody::Scenery | EntityBody::Link(_) => None,
        }
    }

    /// Position and character state borrowed together, for the integrator.
    pub const fn character_parts_mut(&mut self) -> Option<(&mut Vec2, &mut Character)> {
        match &mut self.body {
            EntityBody::Character(character) => Some((&mut self.position, character)),
            EntityBody::Scenery | EntityBody::Link(_) => None,
        }
    }

    /// Where this entity leads, if it is an area link.
    pub const fn link(&self) -> Option<&AreaLinkData> {
        match &self.body {
            EntityBody::Link(link) => Some(link),
            EntityBody::Scenery | EntityBody::Character(_) => None,
        }
    }

    /// A live copy of this entity standing at `position` with no route and
    /// no action, keeping the same network id. Used when a character moves
    /// between areas.
    pub fn relocated(&self, position: Vec2) -> Self {
        let mut copy = self.clone();
        copy.removed = false;
        copy.position = position;
        if let Some(character) = copy.character_mut() {
            character.go_idle();
            character.active = None;
        }
        copy
    }

    /// Client-visible projection.
    pub fn snapshot(&self) -> EntitySnapshot {
        let (state, path, speed) = self.character().map_or_else(
            || (MovementState::Idle, Vec::new(), 0.0),
            |c| (c.state(), c.path().iter().copied().collect(), c.speed),
        );
        EntitySnapshot {
            nid: self.network_id,
            kind: self.kind,
            name: self.name.clone(),
            pos: self.position,
            actions: self.actions.iter().copied().collect(),
            state,
            path,
            speed,
        }
    }
}

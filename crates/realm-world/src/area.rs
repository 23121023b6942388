//! Areas: a region with its own geometry, navigation grid and entities.
//!
//! Each area exclusively owns its [`EntityRegistry`]; nothing outside the
//! area's own update mutates it, and entities never reference entities in
//! another area.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use realm_types::{NetworkId, ServerMessage, SessionId, Vec2};
use tracing::debug;

use crate::actions::{ActionEffect, step_actions};
use crate::catalog::EntityTemplate;
use crate::entity::Entity;
use crate::error::WorldError;
use crate::movement::{MovementOutcome, integrate};
use crate::navigator::Navigator;
use crate::registry::EntityRegistry;

/// A simulated region of the world.
#[derive(Debug)]
pub struct Area {
    /// Unique area name.
    pub name: String,
    /// Floor tile layers, forwarded to clients.
    pub floor: Vec<Vec<u16>>,
    /// Wall tile layers, forwarded to clients.
    pub walls: Vec<Vec<u16>>,
    /// Background music track.
    pub music: Option<String>,
    registry: EntityRegistry,
    navigator: Arc<dyn Navigator>,
    links: BTreeMap<String, Vec2>,
    connections: BTreeSet<SessionId>,
}

impl Area {
    /// Create an empty area.
    pub fn new(name: impl Into<String>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            name: name.into(),
            floor: Vec::new(),
            walls: Vec::new(),
            music: None,
            registry: EntityRegistry::new(),
            navigator,
            links: BTreeMap::new(),
            connections: BTreeSet::new(),
        }
    }

    /// The area's entities.
    pub const fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Mutable access to the area's entities.
    pub const fn registry_mut(&mut self) -> &mut EntityRegistry {
        &mut self.registry
    }

    /// The area's pathfinding collaborator.
    pub fn navigator(&self) -> &dyn Navigator {
        self.navigator.as_ref()
    }

    pub(crate) fn navigator_handle(&self) -> Arc<dyn Navigator> {
        Arc::clone(&self.navigator)
    }

    /// Register a named arrival point.
    pub fn add_link(&mut self, link_type: impl Into<String>, position: Vec2) {
        self.links.insert(link_type.into(), position);
    }

    /// Where travellers arriving through `link_type` appear.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::LinkNotFound`] if the area has no such link.
    pub fn link_by_type(&self, link_type: &str) -> Result<Vec2, WorldError> {
        self.links
            .get(link_type)
            .copied()
            .ok_or_else(|| WorldError::LinkNotFound {
                area: self.name.clone(),
                link: link_type.to_owned(),
            })
    }

    /// Spawn an entity from a template. Returns its network id, or `None`
    /// for static entities.
    ///
    /// # Errors
    ///
    /// Propagates registry insertion failures.
    pub fn spawn(
        &mut self,
        template: &EntityTemplate,
        name: impl Into<String>,
        position: Vec2,
        owner: Option<SessionId>,
    ) -> Result<Option<NetworkId>, WorldError> {
        let entity = Entity::from_template(template, name, position, owner);
        self.insert(entity)
    }

    /// Place an existing entity in this area.
    ///
    /// # Errors
    ///
    /// Propagates registry insertion failures.
    pub fn insert(&mut self, entity: Entity) -> Result<Option<NetworkId>, WorldError> {
        let id = entity.network_id();
        debug!(area = %self.name, entity = %entity.name, kind = ?entity.kind, "entity added");
        self.registry.add(entity)?;
        Ok(id)
    }

    /// Move a live entity to `position` within this area, dropping its
    /// route and action. The network id is kept.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::EntityNotFound`] if no live entity has this id.
    pub fn relocate(&mut self, id: NetworkId, position: Vec2) -> Result<(), WorldError> {
        let entity = self
            .registry
            .get_by_id_mut(id)
            .filter(|e| !e.is_removed())
            .ok_or(WorldError::EntityNotFound(id))?;
        entity.position = position;
        if let Some(character) = entity.character_mut() {
            character.go_idle();
            character.take_action();
        }
        Ok(())
    }

    /// Record that a session is viewing this area.
    pub fn add_connection(&mut self, session: SessionId) -> bool {
        self.connections.insert(session)
    }

    /// Forget a session. Returns whether it was connected.
    pub fn remove_connection(&mut self, session: SessionId) -> bool {
        self.connections.remove(&session)
    }

    /// Sessions currently viewing this area.
    pub const fn connections(&self) -> &BTreeSet<SessionId> {
        &self.connections
    }

    /// The full area payload sent when a session enters.
    pub fn area_data(&self) -> ServerMessage {
        ServerMessage::AreaData {
            floor: self.floor.clone(),
            walls: self.walls.clone(),
            walkable: self.navigator.walkability_data(),
            entities: self.registry.live().map(Entity::snapshot).collect(),
            music: self.music.clone(),
        }
    }

    /// Advance every character by one tick: actions first, then movement.
    ///
    /// Entities removed during the update stay in the registry, flagged,
    /// until [`compact`](Self::compact) runs at the tick boundary.
    pub fn update(&mut self, delta_seconds: f64) -> Vec<ActionEffect> {
        let effects = step_actions(self);

        for id in self.registry.character_ids() {
            let Some((position, character)) = self
                .registry
                .get_by_id_mut(id)
                .and_then(Entity::character_parts_mut)
            else {
                continue;
            };
            if integrate(position, character, delta_seconds) == MovementOutcome::Arrived {
                debug!(area = %self.name, network_id = %id, "arrived");
            }
        }

        effects
    }

    /// Sweep entities removed during the tick.
    pub fn compact(&mut self) -> usize {
        self.registry.compact()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use realm_types::{EntityKind, MovementState};

    use super::*;
    use crate::navigator::GridNavigator;

    fn walker() -> EntityTemplate {
        EntityTemplate {
            speed: 1.0,
            ..EntityTemplate::of_kind(EntityKind::Npc)
        }
    }

    #[test]
    fn unknown_link_is_an_error() {
        let mut area = Area::new("start", Arc::new(GridNavigator::open(2, 2)));
        area.add_link("enter_start", Vec2::new(1.0, 1.0));
        assert_eq!(area.link_by_type("enter_start").unwrap(), Vec2::new(1.0, 1.0));
        assert!(matches!(
            area.link_by_type("back_door"),
            Err(WorldError::LinkNotFound { .. })
        ));
    }

    #[test]
    fn relocate_moves_in_place_and_stops() {
        let mut area = Area::new("start", Arc::new(GridNavigator::open(4, 1)));
        let a = area.spawn(&walker(), "a", Vec2::ZERO, None).unwrap().unwrap();
        if let Some(c) = area.registry_mut().get_by_id_mut(a).and_then(Entity::character_mut) {
            c.set_path([Vec2::new(1.0, 0.0), Vec2::new(2.0, 0.0)]);
        }

        area.relocate(a, Vec2::new(3.0, 0.0)).unwrap();

        let moved = area.registry().get_live(a).unwrap();
        assert_eq!(moved.position, Vec2::new(3.0, 0.0));
        let character = moved.character().unwrap();
        assert_eq!(character.state(), MovementState::Idle);
        assert!(character.path().is_empty());
        assert_eq!(area.registry().len(), 1);

        area.registry_mut().mark_removed(a);
        assert!(matches!(
            area.relocate(a, Vec2::ZERO),
            Err(WorldError::EntityNotFound(id)) if id == a
        ));
    }

    #[test]
    fn area_data_skips_removed_entities() {
        let mut area = Area::new("start", Arc::new(GridNavigator::open(3, 1)));
        let a = area.spawn(&walker(), "a", Vec2::ZERO, None).unwrap().unwrap();
        area.spawn(&walker(), "b", Vec2::new(1.0, 0.0), None).unwrap();
        area.registry_mut().mark_removed(a);

        let ServerMessage::AreaData { entities, walkable, .. } = area.area_data() else {
            panic!("expected area data");
        };
        assert_eq!(entities.len(), 1);
        assert_eq!(walkable, vec![vec![true, true, true]]);
    }

    #[test]
    fn update_moves_characters_along_their_paths() {
        let mut area = Area::new("start", Arc::new(GridNavigator::open(4, 1)));
        let id = area.spawn(&walker(), "a", Vec2::ZERO, None).unwrap().unwrap();
        area.registry_mut()
            .get_by_id_mut(id)
            .and_then(Entity::character_mut)
            .unwrap()
            .set_path([Vec2::new(1.0, 0.0), Vec2::new(2.0, 0.0)]);

        area.update(1.0);
        let entity = area.registry().get_by_id(id).unwrap();
        assert_eq!(entity.position, Vec2::new(1.0, 0.0));

        area.update(1.0);
        let entity = area.registry().get_by_id(id).unwrap();
        assert_eq!(entity.position, Vec2::new(2.0, 0.0));
        assert_eq!(entity.character().unwrap().state(), MovementState::Idle);
    }
}

//! Per-area entity storage with deferred removal.
//!
//! Removal is two-phase: [`EntityRegistry::mark_removed`] flags an entity
//! and [`EntityRegistry::compact`] sweeps flagged entities at the tick
//! boundary. Between the two, indices stay stable and iteration sees the
//! same sequence it would have seen before the mark.

use realm_types::{NetworkId, Vec2};

use crate::entity::Entity;
use crate::error::WorldError;

/// The entities of one area.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    entities: Vec<Entity>,
    has_removed: bool,
}

impl EntityRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            entities: Vec::new(),
            has_removed: false,
        }
    }

    /// Insert an entity. Static entities go to the front so they are
    /// visited before dynamic ones.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateNetworkId`] if an entity with the same
    /// network id is already registered, including one marked removed but
    /// not yet compacted.
    pub fn add(&mut self, entity: Entity) -> Result<(), WorldError> {
        if let Some(id) = entity.network_id()
            && self.get_by_id(id).is_some()
        {
            return Err(WorldError::DuplicateNetworkId(id));
        }
        if entity.kind.is_static() {
            self.entities.insert(0, entity);
        } else {
            self.entities.push(entity);
        }
        Ok(())
    }

    /// Look up an entity by network id. Entities marked removed are still
    /// returned until the next compaction.
    pub fn get_by_id(&self, id: NetworkId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.network_id() == Some(id))
    }

    /// Mutable lookup by network id.
    pub fn get_by_id_mut(&mut self, id: NetworkId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.network_id() == Some(id))
    }

    /// Look up an entity that has not been marked removed.
    pub fn get_live(&self, id: NetworkId) -> Option<&Entity> {
        self.get_by_id(id).filter(|e| !e.is_removed())
    }

    /// All live entities within `radius` of `position`.
    pub fn in_range(&self, position: Vec2, radius: f64) -> Vec<&Entity> {
        self.entities
            .iter()
            .filter(|e| !e.is_removed() && e.position.is_in_range(position, radius))
            .collect()
    }

    /// Flag an entity for removal at the next compaction. Returns whether
    /// the entity was live before the call.
    pub fn mark_removed(&mut self, id: NetworkId) -> bool {
        match self.get_by_id_mut(id) {
            Some(entity) if !entity.is_removed() => {
                entity.mark_removed();
                self.has_removed = true;
                true
            }
            _ => false,
        }
    }

    /// Drop every entity marked removed. Returns how many were dropped.
    ///
    /// Must only run at a tick boundary, never while the registry is being
    /// iterated.
    pub fn compact(&mut self) -> usize {
        if !self.has_removed {
            return 0;
        }
        let before = self.entities.len();
        self.entities.retain(|e| !e.is_removed());
        self.has_removed = false;
        before.saturating_sub(self.entities.len())
    }

    /// Whether any entity awaits compaction.
    pub const fn has_removed(&self) -> bool {
        self.has_removed
    }

    /// Iterate over all entities in storage order, including marked ones.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// Iterate over entities that are not marked removed.
    pub fn live(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|e| !e.is_removed())
    }

    /// Network ids of all live characters, in storage order.
    pub fn character_ids(&self) -> Vec<NetworkId> {
        self.live()
            .filter(|e| e.character().is_some())
            .filter_map(Entity::network_id)
            .collect()
    }

    /// Number of stored entities, including marked ones.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use realm_types::EntityKind;

    use super::*;
    use crate::entity::{Character, EntityBody};

    fn npc(name: &str, x: f64, y: f64) -> Entity {
        Entity::new(
            EntityKind::Npc,
            name,
            Vec2::new(x, y),
            EntityBody::Character(Character::new(1.0, 0)),
        )
    }

    fn names(registry: &EntityRegistry) -> Vec<String> {
        registry.iter().map(|e| e.name.clone()).collect()
    }

    #[test]
    fn ground_goes_to_front() {
        let mut registry = EntityRegistry::new();
        registry.add(npc("a", 0.0, 0.0)).unwrap();
        registry
            .add(Entity::new(EntityKind::Ground, "tile", Vec2::ZERO, EntityBody::Scenery))
            .unwrap();
        registry.add(npc("b", 1.0, 0.0)).unwrap();
        assert_eq!(names(&registry), vec!["tile", "a", "b"]);
    }

    #[test]
    fn duplicate_network_id_is_rejected() {
        let mut registry = EntityRegistry::new();
        let a = npc("a", 0.0, 0.0);
        registry.add(a.clone()).unwrap();
        assert!(matches!(registry.add(a), Err(WorldError::DuplicateNetworkId(_))));
    }

    #[test]
    fn in_range_uses_euclidean_distance() {
        let mut registry = EntityRegistry::new();
        registry.add(npc("near", 1.0, 1.0)).unwrap();
        registry.add(npc("edge", 2.0, 0.0)).unwrap();
        registry.add(npc("far", 3.0, 3.0)).unwrap();
        let found: Vec<&str> = registry
            .in_range(Vec2::ZERO, 2.0)
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(found, vec!["near", "edge"]);
    }

    #[test]
    fn removal_is_deferred_until_compaction() {
        let mut registry = EntityRegistry::new();
        let a = npc("a", 0.0, 0.0);
        let id = a.network_id().unwrap();
        registry.add(a).unwrap();
        registry.add(npc("b", 0.0, 0.0)).unwrap();

        assert!(registry.mark_removed(id));
        assert!(!registry.mark_removed(id));
        assert_eq!(names(&registry), vec!["a", "b"]);
        assert!(registry.get_by_id(id).is_some());
        assert!(registry.get_live(id).is_none());
        assert_eq!(registry.in_range(Vec2::ZERO, 1.0).len(), 1);

        assert_eq!(registry.compact(), 1);
        assert_eq!(names(&registry), vec!["b"]);
        assert!(registry.get_by_id(id).is_none());
        assert_eq!(registry.compact(), 0);
    }

    #[test]
    fn character_ids_skip_scenery_and_removed() {
        let mut registry = EntityRegistry::new();
        let a = npc("a", 0.0, 0.0);
        let a_id = a.network_id().unwrap();
        let b = npc("b", 0.0, 0.0);
        let b_id = b.network_id().unwrap();
        registry.add(a).unwrap();
        registry.add(b).unwrap();
        registry
            .add(Entity::new(EntityKind::Container, "chest", Vec2::ZERO, EntityBody::Scenery))
            .unwrap();
        registry.mark_removed(a_id);
        assert_eq!(registry.character_ids(), vec![b_id]);
    }
}

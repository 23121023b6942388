//! Entity templates looked up by type name at spawn time.

use std::collections::BTreeMap;

use realm_types::{ActionKind, EntityKind, SessionId, Vec2};
use serde::Deserialize;

use crate::entity::{AreaLinkData, Character, Entity, EntityBody};
use crate::error::WorldError;

/// Static description of an entity type.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EntityTemplate {
    /// Kind of entity spawned from this template.
    pub kind: EntityKind,
    /// Movement speed in units per second; characters only.
    #[serde(default)]
    pub speed: f64,
    /// Commands the spawned entity accepts.
    #[serde(default)]
    pub actions: Vec<ActionKind>,
    /// Starting health for killable entities.
    #[serde(default)]
    pub health: Option<u32>,
    /// Health removed per strike.
    #[serde(default)]
    pub damage: u32,
    /// Text shown on talk or configure.
    #[serde(default)]
    pub dialog: Option<String>,
    /// Destination, for area links.
    #[serde(default)]
    pub link: Option<AreaLinkData>,
}

impl EntityTemplate {
    /// A bare template of the given kind.
    pub const fn of_kind(kind: EntityKind) -> Self {
        Self {
            kind,
            speed: 0.0,
            actions: Vec::new(),
            health: None,
            damage: 0,
            dialog: None,
            link: None,
        }
    }

    /// Whether entities of this template move and act.
    pub const fn is_character(&self) -> bool {
        matches!(
            self.kind,
            EntityKind::Player | EntityKind::Npc | EntityKind::Enemy
        )
    }
}

/// All entity templates keyed by type name.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct EntityCatalog {
    templates: BTreeMap<String, EntityTemplate>,
}

impl EntityCatalog {
    /// Build a catalog from `(type name, template)` pairs.
    pub fn new(templates: impl IntoIterator<Item = (String, EntityTemplate)>) -> Self {
        Self {
            templates: templates.into_iter().collect(),
        }
    }

    /// Look up the template for a type name.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownEntityType`] if no template is registered.
    pub fn data_by_type(&self, type_name: &str) -> Result<&EntityTemplate, WorldError> {
        self.templates
            .get(type_name)
            .ok_or_else(|| WorldError::UnknownEntityType(type_name.to_owned()))
    }

    /// Number of templates.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the catalog has no templates.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Entity {
    /// Instantiate an entity from its template.
    pub fn from_template(
        template: &EntityTemplate,
        name: impl Into<String>,
        position: Vec2,
        owner: Option<SessionId>,
    ) -> Self {
        let body = if template.is_character() {
            EntityBody::Character(Character::new(template.speed, template.damage))
        } else if let Some(link) = &template.link {
            EntityBody::Link(link.clone())
        } else {
            EntityBody::Scenery
        };
        let mut entity = Self::new(template.kind, name, position, body);
        entity.actions = template.actions.iter().copied().collect();
        entity.health = template.health;
        entity.dialog.clone_from(&template.dialog);
        entity.owner = owner;
        entity
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const CATALOG: &str = r"
player:
  kind: player
  speed: 4.0
  damage: 2
  actions: []
wolf:
  kind: enemy
  speed: 2.0
  health: 3
  damage: 1
  actions: [attack]
door:
  kind: areaLink
  actions: [link]
  link:
    target_area: cave
    target_link: enter_cave
";

    #[test]
    fn parses_yaml_catalog() {
        let catalog: EntityCatalog = serde_yml::from_str(CATALOG).unwrap();
        assert_eq!(catalog.len(), 3);
        let wolf = catalog.data_by_type("wolf").unwrap();
        assert_eq!(wolf.kind, EntityKind::Enemy);
        assert_eq!(wolf.health, Some(3));
        assert!(catalog.data_by_type("dragon").is_err());
    }

    #[test]
    fn template_builds_matching_body() {
        let catalog: EntityCatalog = serde_yml::from_str(CATALOG).unwrap();
        let wolf = Entity::from_template(catalog.data_by_type("wolf").unwrap(), "Wolf", Vec2::ZERO, None);
        assert!(wolf.character().is_some());
        assert!(wolf.actions.contains(&ActionKind::Attack));

        let door = Entity::from_template(catalog.data_by_type("door").unwrap(), "Door", Vec2::ZERO, None);
        assert_eq!(door.link().map(|l| l.target_area.as_str()), Some("cave"));
        assert!(door.character().is_none());
    }
}

//! Loading world content: entity templates, areas and the story book.
//!
//! Content is read once at startup from the files named in
//! [`ContentConfig`]. Each area gets a [`GridNavigator`] built from its
//! walkability grid, or from its wall layer when no grid is given.

use std::path::Path;
use std::sync::Arc;

use realm_progress::{StoryBook, StoryError};
use realm_types::Vec2;
use realm_world::{Area, EntityCatalog, GridNavigator, WorldError};
use serde::Deserialize;
use tracing::info;

use crate::config::ContentConfig;

/// Errors that can occur when loading content.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// A content file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The file that failed.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A content file is not valid YAML for its schema.
    #[error("failed to parse content YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        #[from]
        source: serde_yml::Error,
    },

    /// The story file is invalid.
    #[error("story error: {source}")]
    Story {
        /// The underlying story error.
        #[from]
        source: StoryError,
    },

    /// An area could not be populated.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },
}

/// A named arrival point in an area.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LinkDefinition {
    /// Link type, referenced by area links and the start configuration.
    #[serde(rename = "type")]
    pub link_type: String,
    /// Column.
    pub x: f64,
    /// Row.
    pub y: f64,
}

/// An entity placed in an area at load time.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SpawnDefinition {
    /// Entity template name.
    #[serde(rename = "type")]
    pub entity_type: String,
    /// Display name.
    pub name: String,
    /// Column.
    pub x: f64,
    /// Row.
    pub y: f64,
}

/// Static description of an area.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AreaDefinition {
    /// Unique area name.
    pub name: String,
    /// Floor tiles.
    #[serde(default)]
    pub floor: Vec<Vec<u16>>,
    /// Wall tiles; non-zero cells are blocked unless `walkable` is given.
    #[serde(default)]
    pub walls: Vec<Vec<u16>>,
    /// Explicit walkability grid.
    #[serde(default)]
    pub walkable: Option<Vec<Vec<bool>>>,
    /// Background music.
    #[serde(default)]
    pub music: Option<String>,
    /// Arrival points.
    #[serde(default)]
    pub links: Vec<LinkDefinition>,
    /// Entities spawned at load time.
    #[serde(default)]
    pub entities: Vec<SpawnDefinition>,
}

impl AreaDefinition {
    fn walkability(&self) -> Vec<Vec<bool>> {
        self.walkable.clone().unwrap_or_else(|| {
            self.walls
                .iter()
                .map(|row| row.iter().map(|tile| *tile == 0).collect())
                .collect()
        })
    }

    /// Build the area and spawn its initial entities.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownEntityType`] if a spawn names a type the
    /// catalog does not know.
    pub fn build(&self, catalog: &EntityCatalog) -> Result<Area, WorldError> {
        let mut area = Area::new(self.name.clone(), Arc::new(GridNavigator::new(self.walkability())));
        area.floor.clone_from(&self.floor);
        area.walls.clone_from(&self.walls);
        area.music.clone_from(&self.music);
        for link in &self.links {
            area.add_link(link.link_type.clone(), Vec2::new(link.x, link.y));
        }
        for spawn in &self.entities {
            let template = catalog.data_by_type(&spawn.entity_type)?;
            area.spawn(template, spawn.name.clone(), Vec2::new(spawn.x, spawn.y), None)?;
        }
        Ok(area)
    }
}

/// Everything loaded from the content directory.
#[derive(Debug, Clone, Default)]
pub struct Content {
    /// Entity templates.
    pub catalog: EntityCatalog,
    /// Area definitions.
    pub areas: Vec<AreaDefinition>,
    /// Story templates.
    pub story: StoryBook,
}

impl Content {
    /// Read and parse the content files named in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError`] if any file is missing or malformed.
    pub fn load(config: &ContentConfig) -> Result<Self, ContentError> {
        let entities = read(&config.entities_path())?;
        let areas = read(&config.areas_path())?;
        let story = read(&config.story_path())?;
        let content = Self::parse(&entities, &areas, &story)?;
        info!(
            templates = content.catalog.len(),
            areas = content.areas.len(),
            quests = content.story.quests.len(),
            messages = content.story.messages.len(),
            "Content loaded"
        );
        Ok(content)
    }

    /// Parse content from YAML strings.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError`] if any document is malformed.
    pub fn parse(entities: &str, areas: &str, story: &str) -> Result<Self, ContentError> {
        Ok(Self {
            catalog: serde_yml::from_str(entities)?,
            areas: serde_yml::from_str(areas)?,
            story: StoryBook::from_yaml_str(story)?,
        })
    }

    /// Build every area.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError`] if an area cannot be populated.
    pub fn build_areas(&self) -> Result<Vec<Area>, WorldError> {
        self.areas.iter().map(|def| def.build(&self.catalog)).collect()
    }
}

fn read(path: &Path) -> Result<String, ContentError> {
    std::fs::read_to_string(path).map_err(|source| ContentError::Io {
        path: path.display().to_string(),
        source,
    })
}

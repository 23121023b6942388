//! Error types for the `realm-world` crate.
//!
//! These cover broken invariants of the entity registry and area lookups.
//! Rejected player commands are not errors; see
//! [`Rejection`](crate::actions::Rejection).

use realm_types::NetworkId;

/// Errors that can occur during area and entity operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// An entity with this network id is already registered.
    #[error("duplicate network id: {0}")]
    DuplicateNetworkId(NetworkId),

    /// No entity with this network id is registered.
    #[error("entity not found: {0}")]
    EntityNotFound(NetworkId),

    /// The entity exists but is not a character.
    #[error("entity {0} is not a character")]
    NotACharacter(NetworkId),

    /// The area has no link of the requested type.
    #[error("area {area} has no link of type {link}")]
    LinkNotFound {
        /// The area searched.
        area: String,
        /// The link type requested.
        link: String,
    },

    /// No area with this name exists.
    #[error("area not found: {0}")]
    AreaNotFound(String),

    /// No entity template exists for this type name.
    #[error("unknown entity type: {0}")]
    UnknownEntityType(String),
}

use thiserror::Error;

use crate::{types::MapId, world::entity::Entity};

/// Errors that can occur while operating on the entity store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityError {
    /// The handle does not refer to a live entity (never allocated, deleted, or stale)
    #[error("Entity {entity} does not exist")]
    EntityDoesNotExist { entity: Entity },

    /// A mirrored handle was requested for a slot that is currently occupied
    #[error("Entity slot for {entity} is already in use")]
    IdInUse { entity: Entity },

    /// A mirrored handle is older than the slot's current generation
    #[error("Entity {entity} is stale, slot is at generation {current_generation}")]
    StaleGeneration {
        entity: Entity,
        current_generation: u32,
    },

    /// Re-parenting would make an entity its own ancestor
    #[error("Cannot parent {entity} to {parent}: would create a cycle")]
    ParentCycle { entity: Entity, parent: Entity },

    /// Parent and child must share a map
    #[error("Cannot parent {entity} on {entity_map:?} to {parent} on {parent_map:?}")]
    CrossMapParent {
        entity: Entity,
        parent: Entity,
        entity_map: MapId,
        parent_map: MapId,
    },

    /// Operation requires a transform the entity does not have
    #[error("Entity {entity} has no transform")]
    NoTransform { entity: Entity },
}

use log::trace;

use crate::world::{entity::Entity, entity_manager::EntityManager, error::EntityError};

/// Bit every effective visibility mask contains
pub const DEFAULT_VISIBILITY_LAYER: u32 = 1;

/// Configured visibility layers of an entity. Combined with the parent
/// chain into the entity's effective mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Visibility {
    pub layer: u32,
}

impl Default for Visibility {
    fn default() -> Self {
        Self {
            layer: DEFAULT_VISIBILITY_LAYER,
        }
    }
}

impl EntityManager {
    /// Adds `layer` bits to the entity's visibility layers
    pub fn add_layer(&mut self, entity: &Entity, layer: u32) -> Result<(), EntityError> {
        let current = self.visibility_layer(entity)?;
        if current.is_some_and(|current| current & layer == layer) {
            return Ok(());
        }
        self.store_layer(entity, current.unwrap_or(DEFAULT_VISIBILITY_LAYER) | layer)
    }

    /// Clears `layer` bits from the entity's visibility layers. Does nothing
    /// unless every bit of `layer` is currently set.
    pub fn remove_layer(&mut self, entity: &Entity, layer: u32) -> Result<(), EntityError> {
        let current = self
            .visibility_layer(entity)?
            .unwrap_or(DEFAULT_VISIBILITY_LAYER);
        if current & layer != layer {
            return Ok(());
        }
        self.store_layer(entity, current & !layer)
    }

    /// Replaces the entity's visibility layers
    pub fn set_layer(&mut self, entity: &Entity, layer: u32) -> Result<(), EntityError> {
        if self.visibility_layer(entity)? == Some(layer) {
            return Ok(());
        }
        self.store_layer(entity, layer)
    }

    /// Recomputes and caches the entity's effective mask. Descendants keep
    /// their cached mask until their own refresh.
    pub fn refresh_visibility(&mut self, entity: &Entity) {
        let mask = self.compute_visibility_mask(entity);
        if let Some(metadata) = self.metadata_mut(entity) {
            metadata.visibility_mask = mask;
            trace!("Entity {} visibility mask is now {:#b}", entity, mask);
        }
    }

    /// The cached effective mask, or the default layer for unknown entities
    pub fn visibility_mask(&self, entity: &Entity) -> u32 {
        self.metadata(entity)
            .map(|metadata| metadata.visibility_mask)
            .unwrap_or(DEFAULT_VISIBILITY_LAYER)
    }

    /// Bit 0, the entity's own layers, and the layers of every ancestor
    pub fn compute_visibility_mask(&self, entity: &Entity) -> u32 {
        let mut mask = DEFAULT_VISIBILITY_LAYER;
        let mut next = Some(*entity);
        while let Some(current) = next {
            if let Some(visibility) = self.component::<Visibility>(&current) {
                mask |= visibility.layer;
            }
            next = self.parent(&current);
        }
        mask
    }

    fn visibility_layer(&self, entity: &Entity) -> Result<Option<u32>, EntityError> {
        if !self.exists(entity) {
            return Err(EntityError::EntityDoesNotExist { entity: *entity });
        }
        Ok(self
            .component::<Visibility>(entity)
            .map(|visibility| visibility.layer))
    }

    fn store_layer(&mut self, entity: &Entity, layer: u32) -> Result<(), EntityError> {
        match self.component_mut::<Visibility>(entity) {
            Some(visibility) => visibility.layer = layer,
            None => {
                self.insert_local_component(entity, Visibility { layer })?;
            }
        }
        self.refresh_visibility(entity);
        Ok(())
    }
}

use std::{any::TypeId, collections::HashMap};

use glam::Vec2;
use log::trace;

use crate::{
    types::{MapId, Tick},
    world::{
        dirty_buffer::ChangeRecorder,
        entity::Entity,
        entity_allocator::EntityAllocator,
        error::EntityError,
        metadata::EntityMetadata,
        storage::{ComponentStorage, ErasedStorage},
        transform::Transform,
    },
};

/// Owns every entity, its metadata, its place in the transform tree and its
/// components.
///
/// Mutations that affect networked state take a [`ChangeRecorder`] so the
/// change lands in the tick it happened on.
#[derive(Default)]
pub struct EntityManager {
    allocator: EntityAllocator,
    metadata: HashMap<Entity, EntityMetadata>,
    transforms: HashMap<Entity, Transform>,
    storages: HashMap<TypeId, Box<dyn ErasedStorage>>,
}

impl EntityManager {
    pub fn new() -> Self {
        Self::default()
    }

    // Lifecycle

    /// Spawns an entity with no transform. It lives in nullspace and is never
    /// returned by spatial queries.
    pub fn spawn(&mut self, recorder: &mut dyn ChangeRecorder) -> Entity {
        let entity = self.allocator.allocate();
        self.initialize(entity, recorder);
        entity
    }

    /// Spawns an entity at `position` on `map`
    pub fn spawn_at(
        &mut self,
        map: MapId,
        position: Vec2,
        recorder: &mut dyn ChangeRecorder,
    ) -> Entity {
        let entity = self.allocator.allocate();
        self.transforms.insert(entity, Transform::new(map, position));
        self.initialize(entity, recorder);
        entity
    }

    /// Spawns an entity using a handle chosen by a remote host
    pub fn spawn_with_id(
        &mut self,
        entity: Entity,
        recorder: &mut dyn ChangeRecorder,
    ) -> Result<(), EntityError> {
        self.allocator.allocate_at(entity)?;
        self.initialize(entity, recorder);
        Ok(())
    }

    fn initialize(&mut self, entity: Entity, recorder: &mut dyn ChangeRecorder) {
        self.metadata
            .insert(entity, EntityMetadata::new(recorder.tick()));
        self.refresh_visibility(&entity);
        recorder.record_added(entity);
        trace!("Entity {} initialized at tick {}", entity, recorder.tick());
    }

    /// Deletes the entity and, recursively, all of its children. Returns every
    /// entity that was removed, children before parents.
    pub fn delete(&mut self, entity: &Entity) -> Result<Vec<Entity>, EntityError> {
        if !self.exists(entity) {
            return Err(EntityError::EntityDoesNotExist { entity: *entity });
        }

        if let Some(parent) = self.transforms.get(entity).and_then(|t| t.parent) {
            if let Some(parent_transform) = self.transforms.get_mut(&parent) {
                parent_transform.children.retain(|child| child != entity);
            }
        }

        let mut deleted = Vec::new();
        let mut stack = vec![(*entity, false)];
        while let Some((next, children_done)) = stack.pop() {
            if children_done {
                self.remove_entity_data(&next);
                deleted.push(next);
                continue;
            }
            stack.push((next, true));
            if let Some(transform) = self.transforms.get(&next) {
                for child in transform.children.iter().rev() {
                    stack.push((*child, false));
                }
            }
        }

        Ok(deleted)
    }

    fn remove_entity_data(&mut self, entity: &Entity) {
        for storage in self.storages.values_mut() {
            storage.remove_entity(entity);
        }
        self.transforms.remove(entity);
        self.metadata.remove(entity);
        // the handle was checked live before the walk began
        let _ = self.allocator.free(entity);
    }

    pub fn exists(&self, entity: &Entity) -> bool {
        self.allocator.is_alive(entity)
    }

    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.metadata.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.allocator.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allocator.is_empty()
    }

    // Metadata

    pub fn metadata(&self, entity: &Entity) -> Option<&EntityMetadata> {
        self.metadata.get(entity)
    }

    pub(crate) fn metadata_mut(&mut self, entity: &Entity) -> Option<&mut EntityMetadata> {
        self.metadata.get_mut(entity)
    }

    /// Marks the entity as relevant to every session, regardless of range
    pub fn set_pvs_override(&mut self, entity: &Entity, value: bool) -> Result<(), EntityError> {
        let metadata = self
            .metadata
            .get_mut(entity)
            .ok_or(EntityError::EntityDoesNotExist { entity: *entity })?;
        metadata.pvs_override = value;
        Ok(())
    }

    /// Records a networked change on the entity for the current tick
    pub fn dirty(&mut self, entity: &Entity, recorder: &mut dyn ChangeRecorder) {
        let Some(metadata) = self.metadata.get_mut(entity) else {
            debug_assert!(false, "dirtied entity {} does not exist", entity);
            return;
        };
        metadata.last_modified_tick = recorder.tick();
        recorder.record_dirty(*entity);
    }

    // Components

    pub fn insert_component<C: Send + Sync + 'static>(
        &mut self,
        entity: &Entity,
        component: C,
        recorder: &mut dyn ChangeRecorder,
    ) -> Result<Option<C>, EntityError> {
        if !self.exists(entity) {
            return Err(EntityError::EntityDoesNotExist { entity: *entity });
        }
        let tick = recorder.tick();
        let previous = self.storage_mut_or_default::<C>().insert(*entity, component, tick);
        self.dirty(entity, recorder);
        Ok(previous)
    }

    /// Inserts a component that is never replicated. No change is recorded.
    pub fn insert_local_component<C: Send + Sync + 'static>(
        &mut self,
        entity: &Entity,
        component: C,
    ) -> Result<Option<C>, EntityError> {
        let tick = self
            .metadata
            .get(entity)
            .ok_or(EntityError::EntityDoesNotExist { entity: *entity })?
            .last_modified_tick;
        Ok(self
            .storage_mut_or_default::<C>()
            .insert(*entity, component, tick))
    }

    pub fn remove_component<C: Send + Sync + 'static>(
        &mut self,
        entity: &Entity,
        recorder: &mut dyn ChangeRecorder,
    ) -> Option<C> {
        let removed = self.storage_mut::<C>()?.remove(entity)?;
        self.dirty(entity, recorder);
        Some(removed)
    }

    /// Removes a component by type id, used where the type is not known
    /// statically
    pub fn remove_component_of_type(
        &mut self,
        type_id: &TypeId,
        entity: &Entity,
        recorder: &mut dyn ChangeRecorder,
    ) -> bool {
        let removed = self
            .storages
            .get_mut(type_id)
            .map(|storage| storage.remove_entity(entity))
            .unwrap_or(false);
        if removed {
            self.dirty(entity, recorder);
        }
        removed
    }

    pub fn component<C: Send + Sync + 'static>(&self, entity: &Entity) -> Option<&C> {
        self.storage::<C>()?.get(entity)
    }

    /// Mutable access that is not replicated. Use
    /// [`EntityManager::modify_component`] for networked changes.
    pub fn component_mut<C: Send + Sync + 'static>(&mut self, entity: &Entity) -> Option<&mut C> {
        self.storage_mut::<C>()?.get_mut(entity)
    }

    /// Mutable access that stamps the component and dirties the entity
    pub fn modify_component<C: Send + Sync + 'static>(
        &mut self,
        entity: &Entity,
        recorder: &mut dyn ChangeRecorder,
    ) -> Option<&mut C> {
        if !self.storage::<C>()?.contains(entity) {
            return None;
        }
        self.dirty(entity, recorder);
        self.storage_mut::<C>()?.modify(entity, recorder.tick())
    }

    pub fn has_component<C: Send + Sync + 'static>(&self, entity: &Entity) -> bool {
        self.has_component_of_type(&TypeId::of::<C>(), entity)
    }

    pub fn has_component_of_type(&self, type_id: &TypeId, entity: &Entity) -> bool {
        self.storages
            .get(type_id)
            .is_some_and(|storage| storage.contains(entity))
    }

    /// Tick the component was last inserted or modified on
    pub fn component_last_modified(&self, type_id: &TypeId, entity: &Entity) -> Option<Tick> {
        self.storages.get(type_id)?.last_modified(entity)
    }

    pub fn storage<C: Send + Sync + 'static>(&self) -> Option<&ComponentStorage<C>> {
        self.storages
            .get(&TypeId::of::<C>())?
            .as_any()
            .downcast_ref::<ComponentStorage<C>>()
    }

    fn storage_mut<C: Send + Sync + 'static>(&mut self) -> Option<&mut ComponentStorage<C>> {
        self.storages
            .get_mut(&TypeId::of::<C>())?
            .as_any_mut()
            .downcast_mut::<ComponentStorage<C>>()
    }

    fn storage_mut_or_default<C: Send + Sync + 'static>(&mut self) -> &mut ComponentStorage<C> {
        self.storages
            .entry(TypeId::of::<C>())
            .or_insert_with(|| Box::new(ComponentStorage::<C>::default()))
            .as_any_mut()
            .downcast_mut::<ComponentStorage<C>>()
            .unwrap_or_else(|| unreachable!("storage is keyed by its own element type"))
    }

    // Transform tree

    pub fn transform(&self, entity: &Entity) -> Option<&Transform> {
        self.transforms.get(entity)
    }

    /// The entity's map, or nullspace if it has no transform
    pub fn map(&self, entity: &Entity) -> MapId {
        self.transforms
            .get(entity)
            .map(|transform| transform.map)
            .unwrap_or(MapId::NULLSPACE)
    }

    pub fn parent(&self, entity: &Entity) -> Option<Entity> {
        self.transforms.get(entity)?.parent
    }

    /// Re-parents `entity`, keeping its local position. Both entities need a
    /// transform on the same map. The entity's visibility mask is refreshed.
    pub fn set_parent(
        &mut self,
        entity: &Entity,
        parent: Option<Entity>,
        recorder: &mut dyn ChangeRecorder,
    ) -> Result<(), EntityError> {
        let entity_map = self
            .transforms
            .get(entity)
            .ok_or(EntityError::NoTransform { entity: *entity })?
            .map;

        if let Some(parent) = parent {
            let parent_map = self
                .transforms
                .get(&parent)
                .ok_or(EntityError::NoTransform { entity: parent })?
                .map;
            if parent_map != entity_map {
                return Err(EntityError::CrossMapParent {
                    entity: *entity,
                    parent,
                    entity_map,
                    parent_map,
                });
            }
            let mut ancestor = Some(parent);
            while let Some(next) = ancestor {
                if next == *entity {
                    return Err(EntityError::ParentCycle {
                        entity: *entity,
                        parent,
                    });
                }
                ancestor = self.parent(&next);
            }
        }

        let old_parent = self.parent(entity);
        if old_parent == parent {
            return Ok(());
        }
        if let Some(old_parent) = old_parent {
            if let Some(transform) = self.transforms.get_mut(&old_parent) {
                transform.children.retain(|child| child != entity);
            }
        }
        if let Some(parent) = parent {
            if let Some(transform) = self.transforms.get_mut(&parent) {
                transform.children.push(*entity);
            }
        }
        if let Some(transform) = self.transforms.get_mut(entity) {
            transform.parent = parent;
        }

        self.refresh_visibility(entity);
        self.dirty(entity, recorder);
        Ok(())
    }

    pub fn set_local_position(
        &mut self,
        entity: &Entity,
        position: Vec2,
        recorder: &mut dyn ChangeRecorder,
    ) -> Result<(), EntityError> {
        let transform = self
            .transforms
            .get_mut(entity)
            .ok_or(EntityError::NoTransform { entity: *entity })?;
        transform.local_position = position;
        self.dirty(entity, recorder);
        Ok(())
    }

    /// Sum of local positions up the parent chain
    pub fn world_position(&self, entity: &Entity) -> Option<Vec2> {
        let mut transform = self.transforms.get(entity)?;
        let mut position = transform.local_position;
        while let Some(parent) = transform.parent {
            transform = self.transforms.get(&parent)?;
            position += transform.local_position;
        }
        Some(position)
    }

    /// Every entity with a transform on `map`
    pub fn entities_on_map(&self, map: MapId) -> impl Iterator<Item = Entity> + '_ {
        self.transforms
            .iter()
            .filter(move |(_, transform)| transform.map == map)
            .map(|(entity, _)| *entity)
    }
}

use std::{
    any::{type_name, Any, TypeId},
    collections::HashMap,
};

use crate::{types::Tick, world::entity::Entity};

/// Sparse-set storage for one component type. Values are packed densely and
/// removed by swapping the last row into the hole, so iteration order is not
/// stable.
pub struct ComponentStorage<T> {
    entities: Vec<Entity>,
    values: Vec<T>,
    last_modified: Vec<Tick>,
    rows: HashMap<Entity, usize>,
}

impl<T> Default for ComponentStorage<T> {
    fn default() -> Self {
        Self {
            entities: Vec::new(),
            values: Vec::new(),
            last_modified: Vec::new(),
            rows: HashMap::new(),
        }
    }
}

impl<T> ComponentStorage<T> {
    /// Inserts or replaces the value for `entity`, returning the previous one
    pub fn insert(&mut self, entity: Entity, value: T, tick: Tick) -> Option<T> {
        if let Some(row) = self.rows.get(&entity) {
            self.last_modified[*row] = tick;
            return Some(std::mem::replace(&mut self.values[*row], value));
        }
        self.rows.insert(entity, self.values.len());
        self.entities.push(entity);
        self.values.push(value);
        self.last_modified.push(tick);
        None
    }

    pub fn remove(&mut self, entity: &Entity) -> Option<T> {
        let row = self.rows.remove(entity)?;
        let last = self.values.len() - 1;
        if row != last {
            let moved = self.entities[last];
            self.rows.insert(moved, row);
        }
        self.entities.swap_remove(row);
        self.last_modified.swap_remove(row);
        Some(self.values.swap_remove(row))
    }

    pub fn get(&self, entity: &Entity) -> Option<&T> {
        self.rows.get(entity).map(|row| &self.values[*row])
    }

    /// Mutable access that does not touch the modification tick
    pub fn get_mut(&mut self, entity: &Entity) -> Option<&mut T> {
        let row = *self.rows.get(entity)?;
        Some(&mut self.values[row])
    }

    /// Mutable access that stamps the modification tick
    pub fn modify(&mut self, entity: &Entity, tick: Tick) -> Option<&mut T> {
        let row = *self.rows.get(entity)?;
        self.last_modified[row] = tick;
        Some(&mut self.values[row])
    }

    pub fn contains(&self, entity: &Entity) -> bool {
        self.rows.contains_key(entity)
    }

    pub fn last_modified(&self, entity: &Entity) -> Option<Tick> {
        self.rows.get(entity).map(|row| self.last_modified[*row])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.entities.iter().copied().zip(self.values.iter())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Object-safe view of a [`ComponentStorage`] used where the component type
/// is not known statically.
pub trait ErasedStorage: Any + Send + Sync {
    fn element_type_id(&self) -> TypeId;
    fn element_type_name(&self) -> &'static str;
    fn contains(&self, entity: &Entity) -> bool;
    fn last_modified(&self, entity: &Entity) -> Option<Tick>;
    /// Drops the entity's value, returning whether one was present
    fn remove_entity(&mut self, entity: &Entity) -> bool;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Send + Sync + 'static> ErasedStorage for ComponentStorage<T> {
    fn element_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn element_type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn contains(&self, entity: &Entity) -> bool {
        ComponentStorage::contains(self, entity)
    }

    fn last_modified(&self, entity: &Entity) -> Option<Tick> {
        ComponentStorage::last_modified(self, entity)
    }

    fn remove_entity(&mut self, entity: &Entity) -> bool {
        self.remove(entity).is_some()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

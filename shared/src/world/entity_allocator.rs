use crate::world::{entity::Entity, error::EntityError};

/// Hands out entity handles, recycling freed slots with a bumped generation.
#[derive(Default)]
pub struct EntityAllocator {
    generations: Vec<u32>,
    alive: Vec<bool>,
    free_list: Vec<u32>,
    alive_count: usize,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> Entity {
        let index = match self.free_list.pop() {
            Some(index) => index,
            None => {
                self.generations.push(0);
                self.alive.push(false);
                (self.generations.len() - 1) as u32
            }
        };
        let slot = index as usize;
        self.alive[slot] = true;
        self.alive_count += 1;
        Entity::new(index, self.generations[slot])
    }

    /// Claims a specific handle, used when mirroring entities that were
    /// allocated by a remote host. Fails if the slot currently holds a live
    /// entity or has already moved past that generation.
    pub fn allocate_at(&mut self, entity: Entity) -> Result<(), EntityError> {
        let slot = entity.index() as usize;
        if slot >= self.generations.len() {
            for index in self.generations.len()..slot {
                self.generations.push(0);
                self.alive.push(false);
                self.free_list.push(index as u32);
            }
            self.generations.push(entity.generation());
            self.alive.push(true);
            self.alive_count += 1;
            return Ok(());
        }

        if self.alive[slot] {
            return Err(EntityError::IdInUse { entity });
        }
        if self.generations[slot] > entity.generation() {
            return Err(EntityError::StaleGeneration {
                entity,
                current_generation: self.generations[slot],
            });
        }

        self.free_list.retain(|index| *index != entity.index());
        self.generations[slot] = entity.generation();
        self.alive[slot] = true;
        self.alive_count += 1;
        Ok(())
    }

    pub fn free(&mut self, entity: &Entity) -> Result<(), EntityError> {
        if !self.is_alive(entity) {
            return Err(EntityError::EntityDoesNotExist { entity: *entity });
        }
        let slot = entity.index() as usize;
        self.alive[slot] = false;
        self.generations[slot] = self.generations[slot].wrapping_add(1);
        self.free_list.push(entity.index());
        self.alive_count -= 1;
        Ok(())
    }

    pub fn is_alive(&self, entity: &Entity) -> bool {
        let slot = entity.index() as usize;
        slot < self.generations.len()
            && self.alive[slot]
            && self.generations[slot] == entity.generation()
    }

    pub fn len(&self) -> usize {
        self.alive_count
    }

    pub fn is_empty(&self) -> bool {
        self.alive_count == 0
    }
}

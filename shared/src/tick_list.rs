use thiserror::Error;

use crate::types::Tick;

/// Errors that can occur during TickList operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TickListError {
    /// Attempted to insert a second item for a tick already in the list
    #[error("Duplicate tick {tick} not allowed in TickList")]
    DuplicateTick { tick: Tick },
}

/// A list of items kept in ascending tick order. Items usually arrive in
/// order, so insertion scans from the back.
pub struct TickList<T> {
    list: Vec<(Tick, T)>,
}

impl<T> Default for TickList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TickList<T> {
    pub fn new() -> Self {
        Self { list: Vec::new() }
    }

    pub fn front(&self) -> Option<&(Tick, T)> {
        self.list.first()
    }

    pub fn get(&self, index: usize) -> Option<&(Tick, T)> {
        self.list.get(index)
    }

    pub fn pop_front(&mut self) -> Option<(Tick, T)> {
        if self.list.is_empty() {
            return None;
        }
        Some(self.list.remove(0))
    }

    pub fn back_tick(&self) -> Option<Tick> {
        self.list.last().map(|(tick, _)| *tick)
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn contains(&self, tick: &Tick) -> bool {
        self.list
            .iter()
            .rev()
            .take_while(|(old_tick, _)| *old_tick >= *tick)
            .any(|(old_tick, _)| *old_tick == *tick)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Tick, T)> {
        self.list.iter()
    }

    /// Inserts an item in tick order, scanning from the back.
    /// Returns an error if the tick is already present.
    pub fn try_insert(&mut self, tick: Tick, item: T) -> Result<(), TickListError> {
        let mut index = self.list.len();

        while index > 0 {
            let old_tick = self.list[index - 1].0;
            if old_tick == tick {
                return Err(TickListError::DuplicateTick { tick });
            }
            if old_tick < tick {
                break;
            }
            index -= 1;
        }

        self.list.insert(index, (tick, item));
        Ok(())
    }

    /// Drops every item with a tick strictly below `tick`
    pub fn remove_before(&mut self, tick: Tick) -> usize {
        let count = self
            .list
            .iter()
            .take_while(|(old_tick, _)| *old_tick < tick)
            .count();
        self.list.drain(..count);
        count
    }
}

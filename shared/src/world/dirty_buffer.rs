use std::collections::HashSet;

use log::warn;
use thiserror::Error;

use crate::{types::Tick, world::entity::Entity};

/// Number of ticks of change history kept when no size is configured
pub const DEFAULT_DIRTY_BUFFER_SIZE: usize = 20;

/// Receives change notifications from the entity store during the simulation
/// phase of a tick.
pub trait ChangeRecorder {
    /// The tick currently being simulated
    fn tick(&self) -> Tick;
    /// An entity entered the simulation this tick
    fn record_added(&mut self, entity: Entity);
    /// A networked component on the entity changed this tick
    fn record_dirty(&mut self, entity: Entity);
}

/// The requested tick has fallen out of the change history (or has not
/// happened yet). Receivers must fall back to sending full state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Tick {tick} is outside the change history at tick {current_tick} (window {window})")]
pub struct TooOld {
    pub tick: Tick,
    pub current_tick: Tick,
    pub window: usize,
}

/// The changes recorded for a single tick
#[derive(Debug, Clone, Copy)]
pub struct DirtySlot<'b> {
    pub added: &'b HashSet<Entity>,
    pub dirty: &'b HashSet<Entity>,
}

/// The union of changes over a range of ticks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub added: HashSet<Entity>,
    pub dirty: HashSet<Entity>,
}

impl ChangeSet {
    /// Returns true if the entity was added or dirtied in the range
    pub fn contains(&self, entity: &Entity) -> bool {
        self.added.contains(entity) || self.dirty.contains(entity)
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.dirty.is_empty()
    }
}

/// Fixed-size ring of per-tick "added" and "dirtied" entity sets, indexed by
/// `tick % size`.
///
/// Slots are allocated once on construction and reused. Any tick more than
/// `size - 1` ticks behind the current tick is reported as [`TooOld`].
pub struct DirtyBuffer {
    added: Vec<HashSet<Entity>>,
    dirty: Vec<HashSet<Entity>>,
    current_tick: Tick,
}

impl Default for DirtyBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_DIRTY_BUFFER_SIZE)
    }
}

impl DirtyBuffer {
    /// Creates a buffer holding `size` ticks of history, starting at tick 0
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            added: (0..size).map(|_| HashSet::new()).collect(),
            dirty: (0..size).map(|_| HashSet::new()).collect(),
            current_tick: 0,
        }
    }

    pub fn size(&self) -> usize {
        self.added.len()
    }

    pub fn current_tick(&self) -> Tick {
        self.current_tick
    }

    /// Moves the buffer to `tick`, clearing the slot of every tick that was
    /// skipped so stale data from a previous lap can never be observed.
    pub fn begin_tick(&mut self, tick: Tick) {
        if tick <= self.current_tick {
            if tick < self.current_tick {
                warn!(
                    "DirtyBuffer asked to move backwards from tick {} to {}, ignoring",
                    self.current_tick, tick
                );
            }
            return;
        }

        let advanced = (tick - self.current_tick) as usize;
        let to_clear = advanced.min(self.size());
        for offset in 0..to_clear {
            let slot = self.slot(tick - offset as Tick);
            self.added[slot].clear();
            self.dirty[slot].clear();
        }
        self.current_tick = tick;
    }

    /// Advances the buffer by exactly one tick
    pub fn advance(&mut self) {
        self.begin_tick(self.current_tick.wrapping_add(1));
    }

    /// Returns the changes recorded on `tick`
    pub fn query(&self, tick: Tick) -> Result<DirtySlot<'_>, TooOld> {
        self.check_window(tick)?;
        let slot = self.slot(tick);
        Ok(DirtySlot {
            added: &self.added[slot],
            dirty: &self.dirty[slot],
        })
    }

    /// Returns every change recorded after `from_tick`, up to and including
    /// the current tick. Fails with [`TooOld`] under the same rule as
    /// [`DirtyBuffer::query`].
    pub fn changes_since(&self, from_tick: Tick) -> Result<ChangeSet, TooOld> {
        self.check_window(from_tick)?;

        let mut changes = ChangeSet::default();
        let mut tick = from_tick;
        while tick < self.current_tick {
            tick += 1;
            let slot = self.slot(tick);
            changes.added.extend(self.added[slot].iter().copied());
            changes.dirty.extend(self.dirty[slot].iter().copied());
        }
        Ok(changes)
    }

    fn check_window(&self, tick: Tick) -> Result<(), TooOld> {
        if tick > self.current_tick || (self.current_tick - tick) as usize >= self.size() {
            return Err(TooOld {
                tick,
                current_tick: self.current_tick,
                window: self.size(),
            });
        }
        Ok(())
    }

    fn slot(&self, tick: Tick) -> usize {
        tick as usize % self.size()
    }
}

impl ChangeRecorder for DirtyBuffer {
    fn tick(&self) -> Tick {
        self.current_tick
    }

    fn record_added(&mut self, entity: Entity) {
        let slot = self.slot(self.current_tick);
        self.dirty[slot].remove(&entity);
        self.added[slot].insert(entity);
    }

    fn record_dirty(&mut self, entity: Entity) {
        let slot = self.slot(self.current_tick);
        if self.added[slot].contains(&entity) {
            return;
        }
        self.dirty[slot].insert(entity);
    }
}

use std::vec::IntoIter;

use vantage_shared::{ComponentKind, Entity};

/// What changed in the mirrored world while applying game states, drained by
/// the game after each [`Client::process_states`](crate::Client::process_states).
pub struct StateEvents {
    entered: Vec<Entity>,
    left: Vec<Entity>,
    deleted: Vec<Entity>,
    updated: Vec<(Entity, ComponentKind)>,
    removed: Vec<(Entity, ComponentKind)>,
    empty: bool,
}

impl Default for StateEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl StateEvents {
    pub(crate) fn new() -> Self {
        Self {
            entered: Vec::new(),
            left: Vec::new(),
            deleted: Vec::new(),
            updated: Vec::new(),
            removed: Vec::new(),
            empty: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn read<V: StateEvent>(&mut self) -> V::Iter {
        V::iter(self)
    }

    pub fn has<V: StateEvent>(&self) -> bool {
        V::has(self)
    }

    pub(crate) fn push_entered(&mut self, entity: Entity) {
        self.entered.push(entity);
        self.empty = false;
    }

    pub(crate) fn push_left(&mut self, entity: Entity) {
        self.left.push(entity);
        self.empty = false;
    }

    pub(crate) fn push_deleted(&mut self, entity: Entity) {
        self.deleted.push(entity);
        self.empty = false;
    }

    pub(crate) fn push_updated(&mut self, entity: Entity, kind: ComponentKind) {
        self.updated.push((entity, kind));
        self.empty = false;
    }

    pub(crate) fn push_removed(&mut self, entity: Entity, kind: ComponentKind) {
        self.removed.push((entity, kind));
        self.empty = false;
    }
}

// Event Trait
pub trait StateEvent {
    type Iter;

    fn iter(events: &mut StateEvents) -> Self::Iter;

    fn has(events: &StateEvents) -> bool;
}

// Entered PVS Event
pub struct EnterPvsEvent;
impl StateEvent for EnterPvsEvent {
    type Iter = IntoIter<Entity>;

    fn iter(events: &mut StateEvents) -> Self::Iter {
        let list = std::mem::take(&mut events.entered);
        IntoIterator::into_iter(list)
    }

    fn has(events: &StateEvents) -> bool {
        !events.entered.is_empty()
    }
}

// Left PVS Event
pub struct LeavePvsEvent;
impl StateEvent for LeavePvsEvent {
    type Iter = IntoIter<Entity>;

    fn iter(events: &mut StateEvents) -> Self::Iter {
        let list = std::mem::take(&mut events.left);
        IntoIterator::into_iter(list)
    }

    fn has(events: &StateEvents) -> bool {
        !events.left.is_empty()
    }
}

// Delete Entity Event
pub struct DeleteEntityEvent;
impl StateEvent for DeleteEntityEvent {
    type Iter = IntoIter<Entity>;

    fn iter(events: &mut StateEvents) -> Self::Iter {
        let list = std::mem::take(&mut events.deleted);
        IntoIterator::into_iter(list)
    }

    fn has(events: &StateEvents) -> bool {
        !events.deleted.is_empty()
    }
}

// Update Component Event
pub struct UpdateComponentEvent;
impl StateEvent for UpdateComponentEvent {
    type Iter = IntoIter<(Entity, ComponentKind)>;

    fn iter(events: &mut StateEvents) -> Self::Iter {
        let list = std::mem::take(&mut events.updated);
        IntoIterator::into_iter(list)
    }

    fn has(events: &StateEvents) -> bool {
        !events.updated.is_empty()
    }
}

// Remove Component Event
pub struct RemoveComponentEvent;
impl StateEvent for RemoveComponentEvent {
    type Iter = IntoIter<(Entity, ComponentKind)>;

    fn iter(events: &mut StateEvents) -> Self::Iter {
        let list = std::mem::take(&mut events.removed);
        IntoIterator::into_iter(list)
    }

    fn has(events: &StateEvents) -> bool {
        !events.removed.is_empty()
    }
}

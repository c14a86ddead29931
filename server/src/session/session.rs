use std::collections::{HashMap, HashSet};

use vantage_shared::{ComponentKind, Entity, SessionKey, Tick};

use crate::session::{channel::NetChannel, component_status::ComponentStatus};

/// What a session has been told about one component
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComponentRecord {
    pub status: ComponentStatus,
    /// Tick of the most recent full state for this component
    pub last_full_tick: Tick,
}

/// What a session has been told about one entity
#[derive(Clone, Debug, Default)]
pub struct EntityRecord {
    /// Tick of the most recent full state for the entity. Until the session
    /// acknowledges it, the entity keeps being sent in full.
    pub baseline_tick: Tick,
    pub components: HashMap<ComponentKind, ComponentRecord>,
    /// Component removals not yet acknowledged, with the tick first sent
    pub pending_removals: HashMap<ComponentKind, Tick>,
}

/// Everything the PVS decided for one session on one tick. Produced without
/// touching the session, then applied to it.
#[derive(Debug, Default)]
pub struct SessionUpdate {
    pub tick: Tick,
    /// The acknowledged tick was outside the change history
    pub too_old: bool,
    pub written: Vec<WrittenEntity>,
    /// Entities that were due but did not fit, with the delta base they
    /// still need (`None` when they need full state)
    pub deferred: Vec<(Entity, Option<Tick>)>,
    pub left: Vec<Entity>,
    pub deleted: Vec<Entity>,
}

#[derive(Debug)]
pub struct WrittenEntity {
    pub entity: Entity,
    pub full: bool,
    /// Component kinds written, and whether each was written in full
    pub components: Vec<(ComponentKind, bool)>,
    /// Component kinds found missing since they were last sent
    pub removed: Vec<ComponentKind>,
}

/// A connected player. Owns the channel and the record of what has been sent
/// over it. Nothing here survives a reconnect.
pub struct Session {
    key: SessionKey,
    channel: Box<dyn NetChannel>,
    attached: Option<Entity>,
    view_subscriptions: HashSet<Entity>,
    known: HashMap<Entity, EntityRecord>,
    /// Entities that left the view, with the tick they left. The receiver
    /// still holds them until they re-enter or are deleted.
    detached: HashMap<Entity, Tick>,
    pending_deletions: HashMap<Entity, Tick>,
    deferred: HashMap<Entity, Option<Tick>>,
    last_sent_tick: Option<Tick>,
}

impl Session {
    pub fn new(key: SessionKey, channel: Box<dyn NetChannel>) -> Self {
        Self {
            key,
            channel,
            attached: None,
            view_subscriptions: HashSet::new(),
            known: HashMap::new(),
            detached: HashMap::new(),
            pending_deletions: HashMap::new(),
            deferred: HashMap::new(),
            last_sent_tick: None,
        }
    }

    pub fn key(&self) -> SessionKey {
        self.key
    }

    pub fn acknowledged_tick(&self) -> Option<Tick> {
        self.channel.last_acknowledged_tick()
    }

    pub fn last_sent_tick(&self) -> Option<Tick> {
        self.last_sent_tick
    }

    pub(crate) fn send(&mut self, tick: Tick, payload: Vec<u8>) {
        self.last_sent_tick = Some(tick);
        self.channel.send(payload);
    }

    // Eyes

    pub fn attached(&self) -> Option<Entity> {
        self.attached
    }

    pub(crate) fn set_attached(&mut self, entity: Option<Entity>) {
        self.attached = entity;
    }

    pub fn view_subscriptions(&self) -> impl Iterator<Item = &Entity> {
        self.view_subscriptions.iter()
    }

    pub(crate) fn add_view_subscription(&mut self, entity: Entity) -> bool {
        self.view_subscriptions.insert(entity)
    }

    pub(crate) fn remove_view_subscription(&mut self, entity: &Entity) -> bool {
        self.view_subscriptions.remove(entity)
    }

    /// The attached entity followed by every view subscription
    pub fn eyes(&self) -> impl Iterator<Item = Entity> + '_ {
        self.attached
            .into_iter()
            .chain(self.view_subscriptions.iter().copied())
    }

    /// Drops eye references to an entity that no longer exists
    pub(crate) fn forget_eye(&mut self, entity: &Entity) {
        if self.attached == Some(*entity) {
            self.attached = None;
        }
        self.view_subscriptions.remove(entity);
    }

    // Sent state

    pub fn knows(&self, entity: &Entity) -> bool {
        self.known.contains_key(entity)
    }

    pub fn known_entities(&self) -> impl Iterator<Item = &Entity> {
        self.known.keys()
    }

    pub fn record(&self, entity: &Entity) -> Option<&EntityRecord> {
        self.known.get(entity)
    }

    pub fn component_status(&self, entity: &Entity, kind: &ComponentKind) -> Option<ComponentStatus> {
        Some(self.known.get(entity)?.components.get(kind)?.status)
    }

    /// Detached entities whose left marker is not yet acknowledged
    pub fn pending_left(&self) -> impl Iterator<Item = Entity> + '_ {
        let ack = self.acknowledged_tick();
        self.detached
            .iter()
            .filter(move |(_, tick)| ack.map_or(true, |ack| **tick > ack))
            .map(|(entity, _)| *entity)
    }

    pub fn detached_entities(&self) -> impl Iterator<Item = &Entity> {
        self.detached.keys()
    }

    pub fn is_detached(&self, entity: &Entity) -> bool {
        self.detached.contains_key(entity)
    }

    /// Deleted entities whose deletion is not yet acknowledged
    pub fn pending_deletions(&self) -> impl Iterator<Item = Entity> + '_ {
        self.pending_deletions.keys().copied()
    }

    pub fn deferred(&self, entity: &Entity) -> Option<Option<Tick>> {
        self.deferred.get(entity).copied()
    }

    pub fn deferred_entities(&self) -> impl Iterator<Item = &Entity> {
        self.deferred.keys()
    }

    /// Drops markers and removals the receiver has confirmed
    pub(crate) fn prune_acknowledged(&mut self) {
        let Some(ack) = self.acknowledged_tick() else {
            return;
        };
        self.pending_deletions.retain(|_, tick| *tick > ack);
        for record in self.known.values_mut() {
            record.pending_removals.retain(|_, tick| *tick > ack);
        }
    }

    pub(crate) fn apply(&mut self, update: SessionUpdate) {
        let tick = update.tick;

        if update.too_old {
            for record in self.known.values_mut() {
                for component in record.components.values_mut() {
                    component.status = ComponentStatus::Stale;
                }
            }
        }

        for entity in update.left {
            self.known.remove(&entity);
            self.detached.insert(entity, tick);
        }

        for entity in update.deleted {
            self.known.remove(&entity);
            self.detached.remove(&entity);
            self.pending_deletions.insert(entity, tick);
        }

        for written in update.written {
            self.detached.remove(&written.entity);

            let record = self.known.entry(written.entity).or_default();
            if written.full {
                record.baseline_tick = tick;
            }
            for kind in written.removed {
                record.components.remove(&kind);
                record.pending_removals.insert(kind, tick);
            }
            for (kind, full) in written.components {
                record.pending_removals.remove(&kind);
                let component = record.components.entry(kind).or_insert(ComponentRecord {
                    status: ComponentStatus::Unsent,
                    last_full_tick: tick,
                });
                if full {
                    component.status = ComponentStatus::SentFull;
                    component.last_full_tick = tick;
                } else {
                    component.status = ComponentStatus::SentDelta;
                }
            }
        }

        // every entity still owed a send is listed again, so the map is rebuilt
        let mut deferred = HashMap::new();
        for (entity, base) in update.deferred {
            let merged = match (self.deferred.get(&entity), base) {
                (Some(Some(old)), Some(new)) => Some((*old).min(new)),
                (Some(None), _) | (_, None) => None,
                (None, Some(new)) => Some(new),
            };
            deferred.insert(entity, merged);
        }
        self.deferred = deferred;
    }
}

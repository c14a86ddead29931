use log::{debug, warn};
use vantage_shared::{
    ChangeSet, ComponentChange, ComponentKinds, DirtyBuffer, Entity, EntityManager, EntityState,
    GameState, GetStateContext, Serde, Tick, UnsignedVariableInteger,
};

use crate::{
    pvs::{
        entity_lookup::EntityLookup,
        priority::{Priority, PriorityClass},
        view::{compute_view, SessionView},
        PvsConfig,
    },
    session::{Session, SessionUpdate, WrittenEntity},
};

/// How an entity is to be written for a session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendMode {
    Full,
    /// Components modified after the base tick
    Delta(Tick),
}

impl SendMode {
    fn deferred_base(&self) -> Option<Tick> {
        match self {
            SendMode::Full => None,
            SendMode::Delta(base) => Some(*base),
        }
    }
}

/// Extra bits the entity count prefix takes when `count` grows by one
fn entity_count_growth(count: usize) -> usize {
    let prefix_bits =
        |len: usize| UnsignedVariableInteger::<5>::new(len as u64).bit_length() as usize;
    prefix_bits(count + 1) - prefix_bits(count)
}

/// Per-tick visibility and payload assembly for every session
pub struct PvsSystem {
    config: PvsConfig,
    lookup: EntityLookup,
    overrides: Vec<Entity>,
}

impl PvsSystem {
    pub fn new(config: PvsConfig) -> Self {
        let lookup = EntityLookup::new(config.lookup_cell_size);
        Self {
            config,
            lookup,
            overrides: Vec::new(),
        }
    }

    pub fn config(&self) -> &PvsConfig {
        &self.config
    }

    pub fn lookup(&self) -> &EntityLookup {
        &self.lookup
    }

    /// Rebuilds the per-tick indexes. Called once after simulation and before
    /// any session is processed.
    pub fn begin_frame(&mut self, entities: &EntityManager) {
        if self.config.enabled {
            self.lookup.rebuild(entities);
        }
        self.overrides = entities
            .entities()
            .filter(|entity| {
                entities
                    .metadata(entity)
                    .is_some_and(|metadata| metadata.pvs_override)
            })
            .collect();
        self.overrides.sort_unstable();
    }

    pub fn compute_view(&self, session: &Session, entities: &EntityManager) -> SessionView {
        compute_view(
            session,
            entities,
            &self.lookup,
            &self.overrides,
            &self.config,
        )
    }

    /// Assembles the session's game state for the current tick, and the
    /// update that records what was sent. Neither the session nor the world
    /// is changed.
    pub fn write_state(
        &self,
        session: &Session,
        view: &SessionView,
        entities: &EntityManager,
        dirty: &DirtyBuffer,
        component_kinds: &ComponentKinds,
    ) -> (GameState, SessionUpdate) {
        let tick = dirty.current_tick();
        let ack = session.acknowledged_tick();

        let mut too_old = false;
        let changes: Option<ChangeSet> = match ack {
            None => None,
            Some(ack) => match dirty.changes_since(ack) {
                Ok(changes) => Some(changes),
                Err(error) => {
                    warn!(
                        "Session {:?} is too far behind ({}), sending full state",
                        session.key(),
                        error
                    );
                    too_old = true;
                    None
                }
            },
        };

        let mut state = GameState::new(if too_old { None } else { ack }, tick);
        let mut update = SessionUpdate {
            tick,
            too_old,
            left: view.left.clone(),
            deleted: view.deleted.clone(),
            ..Default::default()
        };

        // plan
        let mut due: Vec<(Priority, Entity, SendMode)> = Vec::new();
        for (entity, priority) in &view.visible {
            let Some(mode) = self.send_mode(session, entity, ack, too_old, changes.as_ref()) else {
                continue;
            };
            let mut priority = *priority;
            if priority.class == PriorityClass::InView && session.deferred(entity).is_some() {
                priority.class = PriorityClass::Deferred;
            }
            due.push((priority, *entity, mode));
        }
        due.sort_by(|(a, a_entity, _), (b, b_entity, _)| {
            a.cmp_urgency(b).then(a_entity.cmp(b_entity))
        });

        // markers are small and always sent, so they are counted up front
        state.left_pvs = view.left.clone();
        state.left_pvs.extend(
            session
                .pending_left()
                .filter(|entity| !view.deleted.contains(entity)),
        );
        state.deletions = view.deleted.clone();
        state.deletions.extend(session.pending_deletions());

        let budget_bits = self.config.payload_budget_bytes.saturating_mul(8);
        let mut used_bits = state.bit_length() as usize;
        let mut deferring = false;

        for (_, entity, mode) in due {
            if deferring {
                update.deferred.push((entity, mode.deferred_base()));
                continue;
            }

            let Some((entity_state, written)) =
                self.write_entity(session, &entity, mode, ack, entities, component_kinds)
            else {
                continue;
            };

            let bits = entity_state.bit_length() as usize
                + entity_count_growth(state.entity_states.len());
            if !update.written.is_empty() && used_bits + bits > budget_bits {
                debug!(
                    "Session {:?} payload budget reached at tick {}, deferring remaining entities",
                    session.key(),
                    tick
                );
                deferring = true;
                update.deferred.push((entity, mode.deferred_base()));
                continue;
            }

            used_bits += bits;
            state.entity_states.push(entity_state);
            update.written.push(written);
        }

        if !update.deferred.is_empty() {
            warn!(
                "Session {:?} deferred {} entities at tick {}",
                session.key(),
                update.deferred.len(),
                tick
            );
        }

        let written_entities: Vec<Entity> = update.written.iter().map(|w| w.entity).collect();
        state
            .left_pvs
            .retain(|entity| !written_entities.contains(entity));
        state.left_pvs.sort_unstable();
        state.deletions.sort_unstable();

        (state, update)
    }

    /// Decides whether and how a visible entity is sent this tick
    fn send_mode(
        &self,
        session: &Session,
        entity: &Entity,
        ack: Option<Tick>,
        too_old: bool,
        changes: Option<&ChangeSet>,
    ) -> Option<SendMode> {
        let Some(record) = session.record(entity) else {
            // entering
            return Some(SendMode::Full);
        };
        let Some(ack) = ack else {
            return Some(SendMode::Full);
        };
        if too_old || ack < record.baseline_tick {
            return Some(SendMode::Full);
        }

        match session.deferred(entity) {
            Some(None) => Some(SendMode::Full),
            Some(Some(base)) => Some(SendMode::Delta(base.min(ack))),
            None => {
                let changed = changes.is_some_and(|changes| changes.contains(entity));
                if changed || !record.pending_removals.is_empty() {
                    Some(SendMode::Delta(ack))
                } else {
                    None
                }
            }
        }
    }

    /// Harvests component state for one entity. Returns `None` for a delta
    /// that turned out to carry nothing.
    fn write_entity(
        &self,
        session: &Session,
        entity: &Entity,
        mode: SendMode,
        ack: Option<Tick>,
        entities: &EntityManager,
        component_kinds: &ComponentKinds,
    ) -> Option<(EntityState, WrittenEntity)> {
        let record = session.record(entity);
        let mut entity_state = match mode {
            SendMode::Full => EntityState::new_full(*entity),
            SendMode::Delta(_) => EntityState::new(*entity),
        };
        let mut written = WrittenEntity {
            entity: *entity,
            full: mode == SendMode::Full,
            components: Vec::new(),
            removed: Vec::new(),
        };

        for (net_id, kind) in component_kinds.kinds_on(entities, entity) {
            let component_record = record.and_then(|record| record.components.get(&kind));
            // a component only goes out as a delta once its last full state
            // has been acknowledged
            let delta_base = match (mode, component_record, ack) {
                (SendMode::Delta(base), Some(component), Some(ack))
                    if !component.status.needs_full_state() && ack >= component.last_full_tick =>
                {
                    Some(base)
                }
                _ => None,
            };

            if let Some(base) = delta_base {
                let modified = entities
                    .component_last_modified(kind.type_id(), entity)
                    .is_some_and(|last_modified| last_modified > base);
                if !modified {
                    continue;
                }
            }

            let full = delta_base.is_none();
            let context = match delta_base {
                Some(base) => GetStateContext::delta(session.key(), base),
                None => GetStateContext::full(session.key()),
            };
            let Some(bytes) = component_kinds.get_state(&kind, entities, entity, &context) else {
                continue;
            };
            entity_state.component_changes.push(ComponentChange {
                net_id,
                state: Some(bytes),
            });
            written.components.push((kind, full));
        }

        if let Some(record) = record {
            let mut removals: Vec<_> = record
                .components
                .keys()
                .filter(|kind| !entities.has_component_of_type(kind.type_id(), entity))
                .copied()
                .collect();
            written.removed = removals.clone();
            removals.extend(
                record
                    .pending_removals
                    .keys()
                    .filter(|kind| !entities.has_component_of_type(kind.type_id(), entity))
                    .copied(),
            );
            let mut removal_ids: Vec<_> = removals
                .iter()
                .filter_map(|kind| component_kinds.kind_to_net_id(kind).ok())
                .collect();
            removal_ids.sort_unstable();
            removal_ids.dedup();
            entity_state
                .component_changes
                .extend(removal_ids.into_iter().map(|net_id| ComponentChange {
                    net_id,
                    state: None,
                }));
        }

        if mode != SendMode::Full && entity_state.component_changes.is_empty() {
            return None;
        }
        Some((entity_state, written))
    }
}

use std::collections::HashSet;

use log::{trace, warn};

use vantage_shared::{
    ChangeRecorder, ComponentKind, ComponentKinds, Entity, EntityError, EntityManager, GameState,
    NetId,
};

/// What applying one game state did to the mirrored world
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AppliedState {
    pub entered: Vec<Entity>,
    pub left: Vec<Entity>,
    pub deleted: Vec<Entity>,
    pub updated: Vec<(Entity, NetId, ComponentKind)>,
    pub removed: Vec<(Entity, NetId, ComponentKind)>,
}

/// Applies received game states onto the client's mirror of the server world.
///
/// Entities that leave the view are detached, not deleted: they keep their
/// last known state until they re-enter or the server reports them deleted.
#[derive(Default)]
pub struct GameStateProcessor {
    detached: HashSet<Entity>,
}

impl GameStateProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_detached(&self, entity: &Entity) -> bool {
        self.detached.contains(entity)
    }

    pub fn detached_entities(&self) -> impl Iterator<Item = &Entity> {
        self.detached.iter()
    }

    /// Applies `current`, passing the matching snapshots from `next` along
    /// for interpolation. Snapshots that fail to apply are logged and
    /// skipped; the rest of the state still applies.
    pub fn apply(
        &mut self,
        entities: &mut EntityManager,
        recorder: &mut dyn ChangeRecorder,
        component_kinds: &ComponentKinds,
        current: &GameState,
        next: Option<&GameState>,
    ) -> AppliedState {
        let mut applied = AppliedState::default();

        for entity_state in &current.entity_states {
            let entity = entity_state.entity;

            let mut entered = false;
            if !entities.exists(&entity) {
                if let Err(error) = self.spawn_mirror(entities, recorder, entity, &mut applied) {
                    warn!("Could not mirror entity {}: {}", entity, error);
                    continue;
                }
                entered = true;
            } else if self.detached.remove(&entity) {
                entered = true;
            }

            let next_entity_state = next.and_then(|next| next.entity_state(&entity));

            for change in &entity_state.component_changes {
                let net_id = change.net_id;
                let kind = match component_kinds.net_id_to_kind(&net_id) {
                    Ok(kind) => kind,
                    Err(error) => {
                        warn!("Skipping component change on {}: {}", entity, error);
                        continue;
                    }
                };

                match &change.state {
                    Some(bytes) => {
                        let next_bytes = next_entity_state
                            .and_then(|state| state.change(&net_id))
                            .and_then(|change| change.state.as_deref());
                        match component_kinds.handle_state(
                            &net_id,
                            entities,
                            &entity,
                            Some(bytes.as_slice()),
                            next_bytes,
                        ) {
                            Ok(()) => applied.updated.push((entity, net_id, kind)),
                            Err(error) => warn!(
                                "Dropped {} state for {} at tick {}: {}",
                                component_kinds.net_id_name(&net_id),
                                entity,
                                current.to_tick,
                                error
                            ),
                        }
                    }
                    None => {
                        if entities.remove_component_of_type(kind.type_id(), &entity, recorder) {
                            applied.removed.push((entity, net_id, kind));
                        }
                    }
                }
            }

            if entity_state.full {
                // anything a full state no longer lists was removed, possibly
                // while the entity was out of view
                for (net_id, kind) in component_kinds.kinds_on(entities, &entity) {
                    if entity_state.change(&net_id).is_none()
                        && entities.remove_component_of_type(kind.type_id(), &entity, recorder)
                    {
                        applied.removed.push((entity, net_id, kind));
                    }
                }
            }

            if entered {
                trace!("Entity {} entered PVS at tick {}", entity, current.to_tick);
                applied.entered.push(entity);
            }
        }

        for entity in &current.left_pvs {
            if entities.exists(entity) && self.detached.insert(*entity) {
                trace!("Entity {} left PVS at tick {}", entity, current.to_tick);
                applied.left.push(*entity);
            }
        }

        for entity in &current.deletions {
            if !entities.exists(entity) {
                continue;
            }
            match entities.delete(entity) {
                Ok(deleted) => {
                    for entity in deleted {
                        self.detached.remove(&entity);
                        applied.deleted.push(entity);
                    }
                }
                Err(error) => warn!("Could not delete entity {}: {}", entity, error),
            }
        }

        applied
    }

    /// Spawns the server's handle locally. A live local entity still holding
    /// the slot belongs to a deletion this client never saw, so it is
    /// removed first.
    fn spawn_mirror(
        &mut self,
        entities: &mut EntityManager,
        recorder: &mut dyn ChangeRecorder,
        entity: Entity,
        applied: &mut AppliedState,
    ) -> Result<(), EntityError> {
        match entities.spawn_with_id(entity, recorder) {
            Err(EntityError::IdInUse { .. }) => {
                let stale = entities
                    .entities()
                    .find(|other| other.index() == entity.index());
                let Some(stale) = stale else {
                    return Err(EntityError::IdInUse { entity });
                };
                warn!("Entity {} replaces stale entity {}", entity, stale);
                for deleted in entities.delete(&stale)? {
                    self.detached.remove(&deleted);
                    applied.deleted.push(deleted);
                }
                entities.spawn_with_id(entity, recorder)
            }
            result => result,
        }
    }
}

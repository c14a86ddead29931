use std::collections::HashMap;

use log::trace;
use vantage_shared::{Entity, EntityManager, Eye, MapId, Vec2, DEFAULT_VISIBILITY_LAYER};

use crate::{
    pvs::{
        entity_lookup::SpatialQuery,
        priority::{Priority, PriorityClass},
        PvsConfig,
    },
    session::Session,
};

/// One point of view a session sees the world through
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EyeView {
    pub entity: Entity,
    pub map: MapId,
    pub position: Vec2,
    pub visibility_mask: u32,
}

/// The outcome of the visibility pass for one session on one tick
#[derive(Debug, Default)]
pub struct SessionView {
    /// Entities the session should see this tick
    pub visible: HashMap<Entity, Priority>,
    /// Known entities that are alive but no longer visible
    pub left: Vec<Entity>,
    /// Known entities that no longer exist
    pub deleted: Vec<Entity>,
}

impl SessionView {
    fn include(&mut self, entity: Entity, priority: Priority) {
        self.visible
            .entry(entity)
            .and_modify(|existing| *existing = existing.merge(priority))
            .or_insert(priority);
    }
}

/// Resolves a session's eyes. Eyes on deleted entities are skipped; an eye
/// without an `Eye` component uses the default mask.
pub fn session_eyes(session: &Session, entities: &EntityManager) -> Vec<EyeView> {
    session
        .eyes()
        .filter(|entity| entities.exists(entity))
        .map(|entity| EyeView {
            entity,
            map: entities.map(&entity),
            position: entities.world_position(&entity).unwrap_or(Vec2::ZERO),
            visibility_mask: entities
                .component::<Eye>(&entity)
                .map(|eye| eye.visibility_mask)
                .unwrap_or(DEFAULT_VISIBILITY_LAYER),
        })
        .collect()
}

fn distance_squared(eyes: &[EyeView], entities: &EntityManager, entity: &Entity) -> f32 {
    let map = entities.map(entity);
    let Some(position) = entities.world_position(entity) else {
        return f32::MAX;
    };
    eyes.iter()
        .filter(|eye| eye.map == map && map != MapId::NULLSPACE)
        .map(|eye| eye.position.distance_squared(position))
        .fold(f32::MAX, f32::min)
}

/// Decides what the session sees this tick. Reads the world and the session
/// but changes neither.
pub fn compute_view(
    session: &Session,
    entities: &EntityManager,
    lookup: &dyn SpatialQuery,
    overrides: &[Entity],
    config: &PvsConfig,
) -> SessionView {
    let eyes = session_eyes(session, entities);
    let mut view = SessionView::default();

    if config.enabled {
        for eye in &eyes {
            if eye.map == MapId::NULLSPACE {
                continue;
            }
            for entity in lookup.entities_in_range(eye.map, eye.position, config.view_range) {
                if entities.visibility_mask(&entity) & eye.visibility_mask == 0 {
                    continue;
                }
                let distance = distance_squared(&eyes, entities, &entity);
                view.include(entity, Priority::new(PriorityClass::InView, distance));
            }
        }
    } else {
        for entity in entities.entities() {
            let distance = distance_squared(&eyes, entities, &entity);
            view.include(entity, Priority::new(PriorityClass::InView, distance));
        }
    }

    for entity in overrides {
        if entities.exists(entity) {
            view.include(*entity, Priority::new(PriorityClass::Always, 0.0));
        }
    }

    if config.always_send_attached {
        if let Some(attached) = session.attached().filter(|entity| entities.exists(entity)) {
            view.include(attached, Priority::new(PriorityClass::Always, 0.0));
        }
    }

    for entity in session.known_entities() {
        if !entities.exists(entity) {
            view.deleted.push(*entity);
        } else if !view.visible.contains_key(entity) {
            view.left.push(*entity);
        }
    }
    for entity in session.detached_entities() {
        if !entities.exists(entity) {
            view.deleted.push(*entity);
        }
    }
    view.left.sort_unstable();
    view.deleted.sort_unstable();

    trace!(
        "Session {:?} sees {} entities ({} left, {} deleted)",
        session.key(),
        view.visible.len(),
        view.left.len(),
        view.deleted.len()
    );

    view
}

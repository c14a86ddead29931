use glam::Vec2;

use crate::{types::MapId, world::entity::Entity};

/// Position of an entity in the transform tree.
///
/// A child refers to its parent by handle only; the parent's `children`
/// list is the authoritative record of the relation.
#[derive(Clone, Debug, PartialEq)]
pub struct Transform {
    pub(crate) parent: Option<Entity>,
    pub(crate) children: Vec<Entity>,
    pub(crate) local_position: Vec2,
    pub(crate) map: MapId,
}

impl Transform {
    pub fn new(map: MapId, local_position: Vec2) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            local_position,
            map,
        }
    }

    pub fn parent(&self) -> Option<Entity> {
        self.parent
    }

    pub fn children(&self) -> &[Entity] {
        &self.children
    }

    /// Offset from the parent, or from the map origin for a root
    pub fn local_position(&self) -> Vec2 {
        self.local_position
    }

    pub fn map(&self) -> MapId {
        self.map
    }
}

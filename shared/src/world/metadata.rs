use crate::types::Tick;

/// Bookkeeping kept for every live entity
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityMetadata {
    /// Tick the entity entered the simulation
    pub creation_tick: Tick,
    /// Tick of the most recent networked change on any component
    pub last_modified_tick: Tick,
    /// Cached effective visibility mask, see `EntityManager::refresh_visibility`
    pub visibility_mask: u32,
    /// Sent to every session regardless of range or mask
    pub pvs_override: bool,
}

impl EntityMetadata {
    pub fn new(tick: Tick) -> Self {
        Self {
            creation_tick: tick,
            last_modified_tick: tick,
            visibility_mask: 1,
            pvs_override: false,
        }
    }
}

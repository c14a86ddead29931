use std::default::Default;

use vantage_shared::DEFAULT_DIRTY_BUFFER_SIZE;

/// Contains Config properties which will be used by the PVS
#[derive(Clone, Debug)]
pub struct PvsConfig {
    /// When false every entity is visible to every session
    pub enabled: bool,
    /// Half-extent of the square around each eye in which entities are visible
    pub view_range: f32,
    /// Ticks of change history kept. Sessions whose acknowledged tick falls
    /// further behind receive full state.
    pub dirty_buffer_size: usize,
    /// Upper bound on one session's payload per tick. At least one entity is
    /// written even if it alone is larger.
    pub payload_budget_bytes: usize,
    /// Edge length of a spatial lookup cell
    pub lookup_cell_size: f32,
    /// Always send a session its attached entity, wherever it is
    pub always_send_attached: bool,
}

impl Default for PvsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            view_range: 25.0,
            dirty_buffer_size: DEFAULT_DIRTY_BUFFER_SIZE,
            payload_budget_bytes: 8192,
            lookup_cell_size: 16.0,
            always_send_attached: true,
        }
    }
}

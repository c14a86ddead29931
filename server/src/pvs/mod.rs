mod entity_lookup;
mod priority;
mod pvs_config;
mod pvs_system;
mod view;

pub use entity_lookup::{EntityLookup, SpatialQuery};
pub use priority::{Priority, PriorityClass};
pub use pvs_config::PvsConfig;
pub use pvs_system::{PvsSystem, SendMode};
pub use view::{compute_view, session_eyes, EyeView, SessionView};

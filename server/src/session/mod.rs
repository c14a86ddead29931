mod channel;
mod component_status;
mod session;
mod session_scope;

pub use channel::NetChannel;
pub use component_status::ComponentStatus;
pub use session::{ComponentRecord, EntityRecord, Session, SessionUpdate, WrittenEntity};
pub use session_scope::{SessionScopeMut, SessionScopeRef};

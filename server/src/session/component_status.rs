/// Where a component stands from one session's point of view
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComponentStatus {
    /// Never sent to this session
    Unsent,
    /// Last sent as full state
    SentFull,
    /// Last sent relative to an acknowledged tick
    SentDelta,
    /// The session's ack fell out of the change history; full state is
    /// required on the next send
    Stale,
}

impl ComponentStatus {
    pub fn needs_full_state(&self) -> bool {
        matches!(self, ComponentStatus::Unsent | ComponentStatus::Stale)
    }
}

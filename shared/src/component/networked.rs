use vantage_serde::Serde;

use crate::types::{SessionKey, Tick};

/// Who a state is being produced for, and relative to which tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GetStateContext {
    /// Receiving session, or `None` when recording a replay
    pub player: Option<SessionKey>,
    /// Base tick the receiver already has, or `None` for full state
    pub from_tick: Option<Tick>,
}

impl GetStateContext {
    pub fn full(player: SessionKey) -> Self {
        Self {
            player: Some(player),
            from_tick: None,
        }
    }

    pub fn delta(player: SessionKey, from_tick: Tick) -> Self {
        Self {
            player: Some(player),
            from_tick: Some(from_tick),
        }
    }

    /// Full, player-agnostic state
    pub fn replay() -> Self {
        Self {
            player: None,
            from_tick: None,
        }
    }

    pub fn is_replay(&self) -> bool {
        self.player.is_none()
    }

    pub fn is_full_state(&self) -> bool {
        self.from_tick.is_none()
    }
}

/// Raised before a component's state is produced for a player; any handler
/// may cancel it to keep the component hidden from that player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GetStateAttempt {
    pub player: Option<SessionKey>,
    cancelled: bool,
}

impl GetStateAttempt {
    pub fn new(player: Option<SessionKey>) -> Self {
        Self {
            player,
            cancelled: false,
        }
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn cancelled(&self) -> bool {
        self.cancelled
    }
}

/// A component whose state is replicated from server to client.
///
/// `get_state` must be a pure function of the component (and the context),
/// returning `None` when there is nothing to send. `handle_state` must be
/// idempotent for a given pair of states and must tolerate any decoded state
/// without panicking, applying only what it can validate.
pub trait NetworkedComponent: Default + Send + Sync + 'static {
    type State: Serde;

    /// Stable name used in logs and the net graph
    const NAME: &'static str;

    fn get_state(&self, context: &GetStateContext) -> Option<Self::State>;

    /// Applies the state for the current tick; `next` is the state for the
    /// following tick when one is buffered, for interpolation.
    fn handle_state(&mut self, current: Option<&Self::State>, next: Option<&Self::State>);
}

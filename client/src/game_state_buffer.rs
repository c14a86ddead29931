use vantage_shared::{GameState, Tick, TickList, TickListError};

use crate::GameStateError;

pub struct BufferedState {
    pub state: GameState,
    /// Size of the payload the state was decoded from
    pub payload_bytes: usize,
}

/// Received game states waiting to be applied, oldest first
#[derive(Default)]
pub struct GameStateBuffer {
    states: TickList<BufferedState>,
    last_applied_tick: Option<Tick>,
}

impl GameStateBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, state: GameState, payload_bytes: usize) -> Result<(), GameStateError> {
        let tick = state.to_tick;
        if let Some(applied_tick) = self.last_applied_tick {
            if tick <= applied_tick {
                return Err(GameStateError::AlreadyApplied { tick, applied_tick });
            }
        }

        self.states
            .try_insert(
                tick,
                BufferedState {
                    state,
                    payload_bytes,
                },
            )
            .map_err(|error| match error {
                TickListError::DuplicateTick { tick } => GameStateError::DuplicateTick { tick },
            })
    }

    pub fn front(&self) -> Option<&BufferedState> {
        self.states.front().map(|(_, buffered)| buffered)
    }

    /// Takes the oldest state, which from then on counts as applied
    pub fn pop_front(&mut self) -> Option<BufferedState> {
        let (tick, buffered) = self.states.pop_front()?;
        self.last_applied_tick = Some(tick);
        Some(buffered)
    }

    pub fn last_applied_tick(&self) -> Option<Tick> {
        self.last_applied_tick
    }

    pub fn newest_tick(&self) -> Option<Tick> {
        self.states.back_tick()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

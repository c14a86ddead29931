use thiserror::Error;

use vantage_shared::{SerdeErr, Tick};

/// Errors that can occur while receiving a game state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameStateError {
    /// The payload is not a valid game state
    #[error("Failed to decode game state payload: {0}")]
    Decode(#[from] SerdeErr),

    /// A state for this tick is already waiting to be applied
    #[error("Game state for tick {tick} is already buffered")]
    DuplicateTick { tick: Tick },

    /// The state arrived after a newer one was applied
    #[error("Game state for tick {tick} arrived after tick {applied_tick} was applied")]
    AlreadyApplied { tick: Tick, applied_tick: Tick },
}

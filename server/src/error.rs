use thiserror::Error;

use vantage_shared::{ComponentError, EntityError, ProtocolError, SessionKey};

/// Errors surfaced by the Server API. The per-tick PVS pass itself never
/// fails; these come from calls made with bad arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VantageServerError {
    /// The session was never connected or has disconnected
    #[error("No session exists for key {key:?}")]
    NoSuchSession { key: SessionKey },

    /// Connecting would exceed `ServerConfig::max_sessions`
    #[error("Session limit of {max} reached")]
    SessionLimitReached { max: usize },

    #[error(transparent)]
    Entity(#[from] EntityError),

    #[error(transparent)]
    Component(#[from] ComponentError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

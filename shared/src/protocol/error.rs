use thiserror::Error;

use crate::component::error::ComponentError;

/// Errors that can occur while building a Protocol
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Protocol is locked and cannot be modified
    #[error("Protocol is already locked and cannot be modified. Protocol.lock() has been called and no further changes are allowed")]
    AlreadyLocked,

    /// A component registration was rejected
    #[error(transparent)]
    Component(#[from] ComponentError),
}

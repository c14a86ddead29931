use thiserror::Error;

use vantage_serde::SerdeErr;

use crate::{types::NetId, world::error::EntityError};

/// Errors that can occur while resolving or applying component state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComponentError {
    /// The component type was used on the network without being added to the Protocol
    #[error("Component type {type_name} is not registered in the Protocol")]
    NotRegistered { type_name: &'static str },

    /// A received snapshot names a net id no registered component has
    #[error("No component is registered with net id {net_id}")]
    UnknownNetId { net_id: NetId },

    /// The same component type was registered twice
    #[error("Component {name} is already registered")]
    AlreadyRegistered { name: &'static str },

    /// A received snapshot could not be decoded
    #[error("Failed to decode {name} state: {source}")]
    Decode {
        name: &'static str,
        #[source]
        source: SerdeErr,
    },

    /// The entity the state was meant for is not alive
    #[error(transparent)]
    Entity(#[from] EntityError),
}

//! # Vantage Shared
//! Entity store, change tracking, visibility layers and the component state
//! contract shared by vantage-server & vantage-client.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub use vantage_serde::{
    BitCounter, BitReader, BitWrite, BitWriter, ConstBitLength, Serde, SerdeErr,
    SignedVariableInteger, UnsignedInteger, UnsignedVariableInteger,
};

mod component;
mod game_state;
mod math;
mod protocol;
mod tick_list;
mod types;
mod world;

pub use component::{
    component_kinds::{ComponentKind, ComponentKinds},
    error::ComponentError,
    networked::{GetStateAttempt, GetStateContext, NetworkedComponent},
};
pub use game_state::{ComponentChange, EntityState, GameState};
pub use math::{Box2, Vec2};
pub use protocol::{Protocol, ProtocolError};
pub use tick_list::{TickList, TickListError};
pub use types::{MapId, NetId, SessionKey, Tick};
pub use world::{
    dirty_buffer::{
        ChangeRecorder, ChangeSet, DirtyBuffer, DirtySlot, TooOld, DEFAULT_DIRTY_BUFFER_SIZE,
    },
    entity::Entity,
    entity_allocator::EntityAllocator,
    entity_manager::EntityManager,
    error::EntityError,
    eye::{Eye, EyeState},
    metadata::EntityMetadata,
    storage::{ComponentStorage, ErasedStorage},
    transform::Transform,
    visibility::{Visibility, DEFAULT_VISIBILITY_LAYER},
};

//! # Vantage Server
//! Runs the authoritative world and, each tick, decides which entities and
//! which component changes every connected session receives.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod shared {
    pub use vantage_shared::{
        BitReader, BitWrite, BitWriter, ConstBitLength, Serde, SerdeErr, SignedVariableInteger,
        UnsignedInteger, UnsignedVariableInteger,
    };
}

mod error;
mod pvs;
mod server;
mod session;

pub use error::VantageServerError;
pub use pvs::{
    compute_view, session_eyes, EntityLookup, EyeView, Priority, PriorityClass, PvsConfig,
    PvsSystem, SendMode, SessionView, SpatialQuery,
};
pub use server::{Server, ServerConfig};
pub use session::{
    ComponentRecord, ComponentStatus, EntityRecord, NetChannel, Session, SessionScopeMut,
    SessionScopeRef, SessionUpdate, WrittenEntity,
};

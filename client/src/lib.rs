//! # Vantage Client
//! Buffers the game states a vantage server sends, applies them to a local
//! mirror of the server's entities and keeps the data behind the network
//! diagnostic overlay.

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

mod client;
mod client_config;
mod console;
mod error;
mod game_state_buffer;
mod game_state_processor;
mod net_graph;
mod state_events;

pub use client::Client;
pub use client_config::ClientConfig;
pub use console::{ConsoleCommand, ConsoleError};
pub use error::GameStateError;
pub use game_state_buffer::{BufferedState, GameStateBuffer};
pub use game_state_processor::{AppliedState, GameStateProcessor};
pub use net_graph::{NetGraph, NetGraphPoint, HISTORY_SIZE};
pub use state_events::{
    DeleteEntityEvent, EnterPvsEvent, LeavePvsEvent, RemoveComponentEvent, StateEvent,
    StateEvents, UpdateComponentEvent,
};

//! # Vantage Serde
//! Bit-level serialization shared between the vantage server & client.
//! Values are written least-significant-bit first into a growable buffer,
//! and a [`BitCounter`] can measure a value without writing it.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod bit_reader;
mod bit_writer;
mod error;
mod impls;
mod integer;
mod serde;

pub use bit_reader::BitReader;
pub use bit_writer::{BitCounter, BitWrite, BitWriter};
pub use error::SerdeErr;
pub use integer::{SignedVariableInteger, UnsignedInteger, UnsignedVariableInteger};
pub use serde::{ConstBitLength, Serde};

use thiserror::Error;

/// Errors that can occur while reading serialized data
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerdeErr {
    /// Attempted to read past the end of the buffer
    #[error("Attempted to read bit {bit_index} of a {bit_len}-bit buffer")]
    OutOfBounds { bit_index: u64, bit_len: u64 },

    /// A string payload was not valid UTF-8
    #[error("String payload is not valid UTF-8")]
    InvalidUtf8,

    /// A declared length cannot possibly fit in the remaining data
    #[error("Declared length {length} exceeds the {remaining_bits} bits remaining in the buffer")]
    LengthOverflow { length: u64, remaining_bits: u64 },

    /// An enum discriminant was not recognized
    #[error("Unknown {type_name} tag: {tag}")]
    InvalidTag { type_name: &'static str, tag: u64 },

    /// A decoded integer does not fit the requested type
    #[error("Decoded value {value} does not fit in {type_name}")]
    ValueOutOfRange { value: i128, type_name: &'static str },
}

use crate::{bit_reader::BitReader, bit_writer::BitCounter, bit_writer::BitWrite, error::SerdeErr};

/// A type that can be written to and read from a bit stream.
pub trait Serde: Sized + Clone + PartialEq {
    /// Serialize Self to a BitWrite
    fn ser(&self, writer: &mut dyn BitWrite);

    /// Parse Self from a BitReader
    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr>;

    /// Return length of value in bits
    fn bit_length(&self) -> u32 {
        let mut counter = BitCounter::new();
        self.ser(&mut counter);
        counter.bits_needed()
    }
}

/// Implemented by types whose serialized length never varies.
pub trait ConstBitLength {
    fn const_bit_length() -> u32;
}

use crate::{
    bit_reader::BitReader, bit_writer::BitWrite, error::SerdeErr, serde::Serde, ConstBitLength,
};

pub type UnsignedInteger<const BITS: u8> = SerdeInteger<false, false, BITS>;
pub type UnsignedVariableInteger<const BITS: u8> = SerdeInteger<false, true, BITS>;
pub type SignedVariableInteger<const BITS: u8> = SerdeInteger<true, true, BITS>;

/// An integer written with a fixed or variable number of bits.
///
/// Variable integers are written in `BITS`-sized groups, each preceded by a
/// continuation bit, so small values stay small on the wire.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct SerdeInteger<const SIGNED: bool, const VARIABLE: bool, const BITS: u8> {
    value: i128,
}

impl<const SIGNED: bool, const VARIABLE: bool, const BITS: u8> SerdeInteger<SIGNED, VARIABLE, BITS> {
    /// # Panics
    ///
    /// Panics if the value cannot be represented. Use `try_new` for values
    /// that come from outside the program.
    pub fn new<T: Into<i128>>(value: T) -> Self {
        let value = value.into();
        Self::try_new(value).unwrap_or_else(|_| {
            panic!("{} cannot be encoded in {} bits (signed: {})", value, BITS, SIGNED)
        })
    }

    pub fn try_new<T: Into<i128>>(value: T) -> Result<Self, SerdeErr> {
        let value = value.into();
        debug_assert!(BITS > 0 && BITS < 127, "integer bit width must be in 1..127");

        if !SIGNED && value < 0 {
            return Err(SerdeErr::ValueOutOfRange {
                value,
                type_name: "unsigned integer",
            });
        }
        if !VARIABLE && value.unsigned_abs() >= 1_u128 << BITS {
            return Err(SerdeErr::ValueOutOfRange {
                value,
                type_name: "fixed-width integer",
            });
        }

        Ok(Self { value })
    }

    pub fn get(&self) -> i128 {
        self.value
    }

    /// Converts the decoded value into a concrete integer type.
    pub fn to<T: TryFrom<i128>>(&self) -> Result<T, SerdeErr> {
        T::try_from(self.value).map_err(|_| SerdeErr::ValueOutOfRange {
            value: self.value,
            type_name: std::any::type_name::<T>(),
        })
    }
}

impl<const SIGNED: bool, const VARIABLE: bool, const BITS: u8> Serde
    for SerdeInteger<SIGNED, VARIABLE, BITS>
{
    fn ser(&self, writer: &mut dyn BitWrite) {
        if SIGNED {
            writer.write_bit(self.value < 0);
        }

        let mut magnitude = self.value.unsigned_abs();

        if VARIABLE {
            loop {
                let proceed = magnitude >= 1_u128 << BITS;
                writer.write_bit(proceed);
                for _ in 0..BITS {
                    writer.write_bit(magnitude & 1 != 0);
                    magnitude >>= 1;
                }
                if !proceed {
                    return;
                }
            }
        } else {
            for _ in 0..BITS {
                writer.write_bit(magnitude & 1 != 0);
                magnitude >>= 1;
            }
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let negative = SIGNED && reader.read_bit()?;

        let mut magnitude: u128 = 0;
        let mut shift: u32 = 0;

        if VARIABLE {
            loop {
                let proceed = reader.read_bit()?;
                for _ in 0..BITS {
                    if reader.read_bit()? {
                        if shift >= 127 {
                            return Err(SerdeErr::ValueOutOfRange {
                                value: i128::MAX,
                                type_name: "variable integer",
                            });
                        }
                        magnitude |= 1 << shift;
                    }
                    shift += 1;
                }
                if !proceed {
                    break;
                }
            }
        } else {
            for _ in 0..BITS {
                if reader.read_bit()? {
                    magnitude |= 1 << shift;
                }
                shift += 1;
            }
        }

        let value = magnitude as i128;
        Ok(Self {
            value: if negative { -value } else { value },
        })
    }

    fn bit_length(&self) -> u32 {
        let sign_bit = u32::from(SIGNED);
        if !VARIABLE {
            return sign_bit + u32::from(BITS);
        }

        let mut output = sign_bit;
        let mut magnitude = self.value.unsigned_abs();
        loop {
            output += 1 + u32::from(BITS);
            if magnitude < 1_u128 << BITS {
                return output;
            }
            magnitude >>= BITS;
        }
    }
}

impl<const SIGNED: bool, const BITS: u8> ConstBitLength for SerdeInteger<SIGNED, false, BITS> {
    fn const_bit_length() -> u32 {
        u32::from(SIGNED) + u32::from(BITS)
    }
}

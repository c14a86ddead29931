use crate::{BitReader, BitWrite, ConstBitLength, Serde, SerdeErr};

// Unit //

impl Serde for () {
    fn ser(&self, _: &mut dyn BitWrite) {}

    fn de(_: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(())
    }

    fn bit_length(&self) -> u32 {
        0
    }
}

impl ConstBitLength for () {
    fn const_bit_length() -> u32 {
        0
    }
}

// Boolean //

impl Serde for bool {
    fn ser(&self, writer: &mut dyn BitWrite) {
        writer.write_bit(*self);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        reader.read_bit()
    }

    fn bit_length(&self) -> u32 {
        1
    }
}

impl ConstBitLength for bool {
    fn const_bit_length() -> u32 {
        1
    }
}

// Numbers //

macro_rules! impl_serde_for_number {
    ($impl_type:ty, $byte_count:expr) => {
        impl Serde for $impl_type {
            fn ser(&self, writer: &mut dyn BitWrite) {
                writer.write_bytes(&self.to_le_bytes());
            }

            fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
                let mut bytes = [0u8; $byte_count];
                for byte in bytes.iter_mut() {
                    *byte = reader.read_byte()?;
                }
                Ok(<$impl_type>::from_le_bytes(bytes))
            }

            fn bit_length(&self) -> u32 {
                <Self as ConstBitLength>::const_bit_length()
            }
        }

        impl ConstBitLength for $impl_type {
            fn const_bit_length() -> u32 {
                $byte_count * 8
            }
        }
    };
}

impl_serde_for_number!(u8, 1);
impl_serde_for_number!(u16, 2);
impl_serde_for_number!(u32, 4);
impl_serde_for_number!(u64, 8);
impl_serde_for_number!(i8, 1);
impl_serde_for_number!(i16, 2);
impl_serde_for_number!(i32, 4);
impl_serde_for_number!(i64, 8);
impl_serde_for_number!(f32, 4);
impl_serde_for_number!(f64, 8);

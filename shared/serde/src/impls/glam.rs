use glam::Vec2;

use crate::{BitReader, BitWrite, ConstBitLength, Serde, SerdeErr};

impl Serde for Vec2 {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.x.ser(writer);
        self.y.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let x = f32::de(reader)?;
        let y = f32::de(reader)?;
        Ok(Vec2::new(x, y))
    }

    fn bit_length(&self) -> u32 {
        <Self as ConstBitLength>::const_bit_length()
    }
}

impl ConstBitLength for Vec2 {
    fn const_bit_length() -> u32 {
        64
    }
}

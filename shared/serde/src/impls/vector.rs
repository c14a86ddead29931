use crate::{BitReader, BitWrite, Serde, SerdeErr, UnsignedVariableInteger};

impl<T: Serde> Serde for Vec<T> {
    fn ser(&self, writer: &mut dyn BitWrite) {
        UnsignedVariableInteger::<5>::new(self.len() as u64).ser(writer);
        for item in self {
            item.ser(writer);
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let length: usize = UnsignedVariableInteger::<5>::de(reader)?.to()?;
        // zero-sized items can't be bounded by the buffer, everything else takes at least a bit
        if std::mem::size_of::<T>() > 0 {
            reader.check_remaining(length as u64, 1)?;
        }

        let mut output = Vec::with_capacity(length);
        for _ in 0..length {
            output.push(T::de(reader)?);
        }
        Ok(output)
    }
}

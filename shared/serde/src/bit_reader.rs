use crate::error::SerdeErr;

/// Reads bits back out of a buffer produced by [`BitWriter`](crate::BitWriter).
pub struct BitReader<'b> {
    buffer: &'b [u8],
    byte_index: usize,
    bit_index: u8,
}

impl<'b> BitReader<'b> {
    pub fn new(buffer: &'b [u8]) -> Self {
        Self {
            buffer,
            byte_index: 0,
            bit_index: 0,
        }
    }

    pub fn read_bit(&mut self) -> Result<bool, SerdeErr> {
        let Some(byte) = self.buffer.get(self.byte_index) else {
            return Err(SerdeErr::OutOfBounds {
                bit_index: self.bits_read(),
                bit_len: self.bit_len(),
            });
        };

        let bit = (byte >> self.bit_index) & 1 == 1;

        self.bit_index += 1;
        if self.bit_index == 8 {
            self.bit_index = 0;
            self.byte_index += 1;
        }

        Ok(bit)
    }

    pub fn read_byte(&mut self) -> Result<u8, SerdeErr> {
        let mut output = 0;
        for index in 0..8 {
            if self.read_bit()? {
                output |= 1 << index;
            }
        }
        Ok(output)
    }

    pub fn read_bytes(&mut self, length: usize) -> Result<Vec<u8>, SerdeErr> {
        self.check_remaining(length as u64, 8)?;
        let mut output = Vec::with_capacity(length);
        for _ in 0..length {
            output.push(self.read_byte()?);
        }
        Ok(output)
    }

    pub fn bits_read(&self) -> u64 {
        (self.byte_index as u64) * 8 + u64::from(self.bit_index)
    }

    pub fn bits_remaining(&self) -> u64 {
        self.bit_len().saturating_sub(self.bits_read())
    }

    /// Fails if `length` items of at least `min_item_bits` each cannot fit in
    /// what is left of the buffer. Guards allocations against hostile lengths.
    pub fn check_remaining(&self, length: u64, min_item_bits: u64) -> Result<(), SerdeErr> {
        let remaining_bits = self.bits_remaining();
        if length.saturating_mul(min_item_bits) > remaining_bits {
            return Err(SerdeErr::LengthOverflow {
                length,
                remaining_bits,
            });
        }
        Ok(())
    }

    fn bit_len(&self) -> u64 {
        (self.buffer.len() as u64) * 8
    }
}

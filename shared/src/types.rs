use vantage_serde::{BitReader, BitWrite, ConstBitLength, Serde, SerdeErr, UnsignedVariableInteger};

/// One discrete simulation step. Monotonically increasing; tick 0 is the
/// state before the first simulated step.
pub type Tick = u32;

/// Wire identifier of a registered networked component type
pub type NetId = u16;

/// Identifies the map an entity lives on
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MapId(pub u32);

impl MapId {
    /// Entities without a position live here; spatial queries never see them
    pub const NULLSPACE: MapId = MapId(0);
}

impl Serde for MapId {
    fn ser(&self, writer: &mut dyn BitWrite) {
        UnsignedVariableInteger::<4>::new(self.0).ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(MapId(UnsignedVariableInteger::<4>::de(reader)?.to()?))
    }
}

/// Identifies a connected player session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey(u64);

impl SessionKey {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn to_u64(&self) -> u64 {
        self.0
    }
}

impl Serde for SessionKey {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.0.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(SessionKey(u64::de(reader)?))
    }
}

impl ConstBitLength for SessionKey {
    fn const_bit_length() -> u32 {
        64
    }
}

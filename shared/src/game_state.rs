use vantage_serde::{BitReader, BitWrite, Serde, SerdeErr};

use crate::{
    types::{NetId, Tick},
    world::entity::Entity,
};

/// The serialized state of one component. `None` means the component was
/// removed from the entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentChange {
    pub net_id: NetId,
    pub state: Option<Vec<u8>>,
}

impl Serde for ComponentChange {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.net_id.ser(writer);
        self.state.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            net_id: NetId::de(reader)?,
            state: Option::<Vec<u8>>::de(reader)?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityState {
    pub entity: Entity,
    /// Lists every component the receiver should hold. Registered components
    /// missing from a full state have been removed.
    pub full: bool,
    pub component_changes: Vec<ComponentChange>,
}

impl EntityState {
    pub fn new(entity: Entity) -> Self {
        Self {
            entity,
            full: false,
            component_changes: Vec::new(),
        }
    }

    pub fn new_full(entity: Entity) -> Self {
        Self {
            full: true,
            ..Self::new(entity)
        }
    }

    pub fn change(&self, net_id: &NetId) -> Option<&ComponentChange> {
        self.component_changes
            .iter()
            .find(|change| change.net_id == *net_id)
    }
}

impl Serde for EntityState {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.entity.ser(writer);
        self.full.ser(writer);
        self.component_changes.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            entity: Entity::de(reader)?,
            full: bool::de(reader)?,
            component_changes: Vec::<ComponentChange>::de(reader)?,
        })
    }
}

/// Everything one session receives for one tick.
///
/// `from_tick` is the delta base the contents are relative to, `None` when
/// the payload does not depend on any earlier state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GameState {
    pub from_tick: Option<Tick>,
    pub to_tick: Tick,
    pub entity_states: Vec<EntityState>,
    /// Entities that are still alive but no longer visible to the receiver
    pub left_pvs: Vec<Entity>,
    /// Entities that no longer exist on the server
    pub deletions: Vec<Entity>,
}

impl GameState {
    pub fn new(from_tick: Option<Tick>, to_tick: Tick) -> Self {
        Self {
            from_tick,
            to_tick,
            ..Default::default()
        }
    }

    pub fn entity_state(&self, entity: &Entity) -> Option<&EntityState> {
        self.entity_states
            .iter()
            .find(|state| state.entity == *entity)
    }

    pub fn is_empty(&self) -> bool {
        self.entity_states.is_empty() && self.left_pvs.is_empty() && self.deletions.is_empty()
    }
}

impl Serde for GameState {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.from_tick.ser(writer);
        self.to_tick.ser(writer);
        self.entity_states.ser(writer);
        self.left_pvs.ser(writer);
        self.deletions.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            from_tick: Option::<Tick>::de(reader)?,
            to_tick: Tick::de(reader)?,
            entity_states: Vec::<EntityState>::de(reader)?,
            left_pvs: Vec::<Entity>::de(reader)?,
            deletions: Vec::<Entity>::de(reader)?,
        })
    }
}

use vantage_shared::{
    BitReader, BitWrite, Entity, GetStateAttempt, GetStateContext, NetworkedComponent, Protocol,
    Serde, SerdeErr, Tick,
};

/// Networked position, sent whole on every change
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PositionState {
    pub x: f32,
    pub y: f32,
}

impl Serde for PositionState {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.x.ser(writer);
        self.y.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            x: f32::de(reader)?,
            y: f32::de(reader)?,
        })
    }
}

impl NetworkedComponent for Position {
    type State = PositionState;
    const NAME: &'static str = "Position";

    fn get_state(&self, _context: &GetStateContext) -> Option<PositionState> {
        Some(PositionState {
            x: self.x,
            y: self.y,
        })
    }

    fn handle_state(&mut self, current: Option<&PositionState>, _next: Option<&PositionState>) {
        let Some(state) = current else {
            return;
        };
        if state.x.is_finite() {
            self.x = state.x;
        }
        if state.y.is_finite() {
            self.y = state.y;
        }
    }
}

/// A score that tracks when its value last changed, and produces no delta
/// when the receiver already has the current value
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Score {
    pub value: u32,
    pub changed_tick: Tick,
}

impl Score {
    pub fn set(&mut self, value: u32, tick: Tick) {
        if self.value != value {
            self.value = value;
            self.changed_tick = tick;
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoreState {
    pub value: u32,
}

impl Serde for ScoreState {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.value.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            value: u32::de(reader)?,
        })
    }
}

impl NetworkedComponent for Score {
    type State = ScoreState;
    const NAME: &'static str = "Score";

    fn get_state(&self, context: &GetStateContext) -> Option<ScoreState> {
        if let Some(from_tick) = context.from_tick {
            if from_tick >= self.changed_tick {
                return None;
            }
        }
        Some(ScoreState { value: self.value })
    }

    fn handle_state(&mut self, current: Option<&ScoreState>, _next: Option<&ScoreState>) {
        if let Some(state) = current {
            self.value = state.value;
        }
    }
}

/// Only sent to the session that owns it
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Secret {
    pub owner: u64,
    pub code: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SecretState {
    pub code: u32,
}

impl Serde for SecretState {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.code.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            code: u32::de(reader)?,
        })
    }
}

impl NetworkedComponent for Secret {
    type State = SecretState;
    const NAME: &'static str = "Secret";

    fn get_state(&self, _context: &GetStateContext) -> Option<SecretState> {
        Some(SecretState { code: self.code })
    }

    fn handle_state(&mut self, current: Option<&SecretState>, _next: Option<&SecretState>) {
        if let Some(state) = current {
            self.code = state.code;
        }
    }
}

fn hide_foreign_secrets(_entity: &Entity, secret: &Secret, attempt: &mut GetStateAttempt) {
    if attempt.player.map(|player| player.to_u64()) != Some(secret.owner) {
        attempt.cancel();
    }
}

/// Eye (net id 0), Position (1), Score (2), Secret (3)
pub fn protocol() -> Protocol {
    Protocol::builder()
        .add_component::<Position>()
        .add_component::<Score>()
        .add_component::<Secret>()
        .add_get_state_attempt::<Secret, _>(hide_foreign_secrets)
        .build()
}

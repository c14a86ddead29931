use glam::Vec2;
use vantage_serde::{BitReader, BitWrite, Serde, SerdeErr};

use crate::{
    component::networked::{GetStateContext, NetworkedComponent},
    world::visibility::DEFAULT_VISIBILITY_LAYER,
};

/// A player's point of view. Its `visibility_mask` selects which visibility
/// layers the PVS lets through for sessions looking through this entity.
#[derive(Clone, Debug, PartialEq)]
pub struct Eye {
    pub draw_fov: bool,
    pub zoom: Vec2,
    pub offset: Vec2,
    pub visibility_mask: u32,
}

impl Default for Eye {
    fn default() -> Self {
        Self {
            draw_fov: true,
            zoom: Vec2::ONE,
            offset: Vec2::ZERO,
            visibility_mask: DEFAULT_VISIBILITY_LAYER,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EyeState {
    pub draw_fov: bool,
    pub zoom: Vec2,
    pub offset: Vec2,
    pub visibility_mask: u32,
}

impl Serde for EyeState {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.draw_fov.ser(writer);
        self.zoom.ser(writer);
        self.offset.ser(writer);
        self.visibility_mask.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            draw_fov: bool::de(reader)?,
            zoom: Vec2::de(reader)?,
            offset: Vec2::de(reader)?,
            visibility_mask: u32::de(reader)?,
        })
    }
}

impl NetworkedComponent for Eye {
    type State = EyeState;
    const NAME: &'static str = "Eye";

    fn get_state(&self, _context: &GetStateContext) -> Option<EyeState> {
        Some(EyeState {
            draw_fov: self.draw_fov,
            zoom: self.zoom,
            offset: self.offset,
            visibility_mask: self.visibility_mask,
        })
    }

    fn handle_state(&mut self, current: Option<&EyeState>, _next: Option<&EyeState>) {
        let Some(state) = current else {
            return;
        };
        self.draw_fov = state.draw_fov;
        // a zero or non-finite zoom would collapse the view
        if state.zoom.is_finite() && state.zoom.x > 0.0 && state.zoom.y > 0.0 {
            self.zoom = state.zoom;
        }
        if state.offset.is_finite() {
            self.offset = state.offset;
        }
        self.visibility_mask = state.visibility_mask | DEFAULT_VISIBILITY_LAYER;
    }
}

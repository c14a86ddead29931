use std::collections::VecDeque;

use log::info;

use vantage_shared::{ComponentKinds, Entity, GameState, Tick};

use crate::AppliedState;

/// Number of ticks kept in the history
pub const HISTORY_SIZE: usize = 180;
/// Target payload rate, in bytes per second
const TARGET_PAYLOAD_BPS: usize = 56000 / 8;
/// Mid-range payload rate, in bytes per second
const MIDRANGE_PAYLOAD_BPS: usize = 33600 / 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetGraphPoint {
    pub tick: Tick,
    pub payload_bytes: usize,
    pub lag_ms: u32,
    /// Buffered states beyond the minimum; negative when the client is
    /// starved
    pub interp: i32,
}

/// Data model behind the network diagnostic overlay: payload size, lag and
/// interpolation depth for recent ticks, plus a change log for one watched
/// entity. Drawing is left to the game.
pub struct NetGraph {
    enabled: bool,
    history: VecDeque<NetGraphPoint>,
    total_payload: usize,
    warning_payload_size: usize,
    midrange_payload_size: usize,
    watch_entity: Option<Entity>,
    watch_log: Vec<String>,
}

impl Default for NetGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl NetGraph {
    pub fn new() -> Self {
        Self {
            enabled: false,
            history: VecDeque::with_capacity(HISTORY_SIZE),
            total_payload: 0,
            warning_payload_size: 0,
            midrange_payload_size: 0,
            watch_entity: None,
            watch_log: Vec::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Disabling clears the history
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.history.clear();
            self.total_payload = 0;
        }
    }

    /// Returns whether the graph is now enabled
    pub fn toggle(&mut self) -> bool {
        self.set_enabled(!self.enabled);
        self.enabled
    }

    pub fn watch_entity(&self) -> Option<Entity> {
        self.watch_entity
    }

    pub fn set_watch_entity(&mut self, entity: Option<Entity>) {
        self.watch_entity = entity;
    }

    pub fn history(&self) -> impl Iterator<Item = &NetGraphPoint> {
        self.history.iter()
    }

    pub fn average_payload(&self) -> usize {
        if self.history.is_empty() {
            return 0;
        }
        self.total_payload / self.history.len()
    }

    /// Payload size per tick at which the graph draws its warning line
    pub fn warning_payload_size(&self) -> usize {
        self.warning_payload_size
    }

    pub fn midrange_payload_size(&self) -> usize {
        self.midrange_payload_size
    }

    /// Lines logged for the watched entity since the last call
    pub fn take_watch_log(&mut self) -> Vec<String> {
        std::mem::take(&mut self.watch_log)
    }

    /// Records one applied game state. Does nothing while disabled.
    #[allow(clippy::too_many_arguments)]
    pub fn record(
        &mut self,
        state: &GameState,
        applied: &AppliedState,
        payload_bytes: usize,
        tick_rate: u32,
        lag_ms: u32,
        interp: i32,
        component_kinds: &ComponentKinds,
    ) {
        if !self.enabled {
            return;
        }

        let tick_rate = tick_rate.max(1) as usize;
        self.warning_payload_size = TARGET_PAYLOAD_BPS / tick_rate;
        self.midrange_payload_size = MIDRANGE_PAYLOAD_BPS / tick_rate;

        self.total_payload += payload_bytes;
        self.history.push_back(NetGraphPoint {
            tick: state.to_tick,
            payload_bytes,
            lag_ms,
            interp,
        });
        while self.history.len() > HISTORY_SIZE {
            if let Some(point) = self.history.pop_front() {
                self.total_payload -= point.payload_bytes;
            }
        }

        if let Some(watched) = self.watch_entity {
            self.log_watched(watched, state, applied, component_kinds);
        }
    }

    fn log_watched(
        &mut self,
        watched: Entity,
        state: &GameState,
        applied: &AppliedState,
        component_kinds: &ComponentKinds,
    ) {
        let mut details = Vec::new();

        if applied.entered.contains(&watched) {
            details.push("  Entered PVS".to_string());
        }
        if let Some(entity_state) = state.entity_state(&watched) {
            if !entity_state.component_changes.is_empty() {
                details.push("  Changes:".to_string());
            }
            for change in &entity_state.component_changes {
                let name = component_kinds.net_id_name(&change.net_id);
                match change.state {
                    Some(_) => details.push(format!("    [{}:{}] state", change.net_id, name)),
                    None => details.push(format!("    [{}:{}] removed", change.net_id, name)),
                }
            }
        }
        if applied.deleted.contains(&watched) {
            details.push("  Deleted".to_string());
        }

        if !details.is_empty() {
            let from = state
                .from_tick
                .map_or_else(|| "full".to_string(), |tick| tick.to_string());
            let mut line = format!(
                "watchEnt: from={}, to={}, eid={}",
                from, state.to_tick, watched
            );
            for detail in details {
                line.push('\n');
                line.push_str(&detail);
            }
            info!("{}", line);
            self.watch_log.push(line);
        }

        if applied.left.contains(&watched) {
            let line = format!(
                "watchEnt: Left PVS at tick {}, eid={}",
                state.to_tick, watched
            );
            info!("{}", line);
            self.watch_log.push(line);
        }
    }
}

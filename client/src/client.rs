use std::time::Duration;

use log::{trace, warn};

use vantage_shared::{
    BitReader, ComponentKinds, DirtyBuffer, Entity, EntityManager, GameState, Protocol, Serde,
    Tick,
};

use crate::{
    console::{ConsoleCommand, ConsoleError},
    game_state_buffer::GameStateBuffer,
    game_state_processor::GameStateProcessor,
    ClientConfig, GameStateError, NetGraph, StateEvents,
};

/// Receives game states from a server, buffers them for interpolation and
/// applies them to a local mirror of the server's entities
pub struct Client {
    client_config: ClientConfig,
    // Protocol
    component_kinds: ComponentKinds,
    tick_interval: Duration,
    tick_rate: u32,
    // World
    entities: EntityManager,
    dirty_buffer: DirtyBuffer,
    processor: GameStateProcessor,
    // States
    buffer: GameStateBuffer,
    acknowledged_tick: Option<Tick>,
    events: StateEvents,
    // Diagnostics
    net_graph: NetGraph,
    lag_ms: u32,
    local_entity: Option<Entity>,
}

impl Client {
    /// Create a new Client
    pub fn new<P: Into<Protocol>>(client_config: ClientConfig, protocol: P) -> Self {
        let protocol: Protocol = protocol.into();
        let tick_rate = protocol.tick_rate();

        let Protocol {
            component_kinds,
            tick_interval,
            ..
        } = protocol;

        Self {
            client_config,
            component_kinds,
            tick_interval,
            tick_rate,
            entities: EntityManager::new(),
            dirty_buffer: DirtyBuffer::default(),
            processor: GameStateProcessor::new(),
            buffer: GameStateBuffer::new(),
            acknowledged_tick: None,
            events: StateEvents::new(),
            net_graph: NetGraph::new(),
            lag_ms: 0,
            local_entity: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.client_config
    }

    pub fn component_kinds(&self) -> &ComponentKinds {
        &self.component_kinds
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    // States

    /// Decodes a payload from the server and buffers it. Returns the tick of
    /// the received state.
    pub fn receive(&mut self, payload: &[u8]) -> Result<Tick, GameStateError> {
        let mut reader = BitReader::new(payload);
        let state = GameState::de(&mut reader)?;
        let tick = state.to_tick;

        self.buffer.insert(state, payload.len())?;
        if self.acknowledged_tick.map_or(true, |acked| tick > acked) {
            self.acknowledged_tick = Some(tick);
        }

        trace!("Buffered game state for tick {} ({} bytes)", tick, payload.len());
        Ok(tick)
    }

    /// Newest tick received, to be reported back to the server
    pub fn acknowledged_tick(&self) -> Option<Tick> {
        self.acknowledged_tick
    }

    /// Tick of the most recently applied state
    pub fn current_tick(&self) -> Option<Tick> {
        self.buffer.last_applied_tick()
    }

    pub fn buffered_states(&self) -> usize {
        self.buffer.len()
    }

    /// Applies the oldest buffered state, keeping `min_buffer_size` states
    /// back. When the buffer has grown past `max_buffer_size` it is drained
    /// to `target_buffer_size`. Returns how many states were applied.
    pub fn process_states(&mut self) -> usize {
        let min = self.client_config.min_buffer_size;
        if self.buffer.len() <= min {
            return 0;
        }

        let catch_up = self.buffer.len() > self.client_config.max_buffer_size;
        self.apply_front();
        let mut applied = 1;

        if catch_up {
            let target = self.client_config.target_buffer_size.max(min);
            while self.buffer.len() > target {
                self.apply_front();
                applied += 1;
            }
            if applied > 1 {
                warn!("Applied {} game states at once to catch up", applied);
            }
        }

        applied
    }

    fn apply_front(&mut self) {
        let interp = self.buffer.len() as i32 - self.client_config.min_buffer_size as i32;
        let Some(buffered) = self.buffer.pop_front() else {
            return;
        };
        let current = &buffered.state;
        let next = self.buffer.front().map(|next| &next.state);

        self.dirty_buffer.begin_tick(current.to_tick);
        let applied = self.processor.apply(
            &mut self.entities,
            &mut self.dirty_buffer,
            &self.component_kinds,
            current,
            next,
        );

        self.net_graph.record(
            current,
            &applied,
            buffered.payload_bytes,
            self.tick_rate,
            self.lag_ms,
            interp,
            &self.component_kinds,
        );

        for entity in applied.entered {
            self.events.push_entered(entity);
        }
        for (entity, _, kind) in applied.updated {
            self.events.push_updated(entity, kind);
        }
        for (entity, _, kind) in applied.removed {
            self.events.push_removed(entity, kind);
        }
        for entity in applied.left {
            self.events.push_left(entity);
        }
        for entity in applied.deleted {
            if self.local_entity == Some(entity) {
                self.local_entity = None;
            }
            self.events.push_deleted(entity);
        }
    }

    /// Takes the events produced since the last call
    pub fn take_events(&mut self) -> StateEvents {
        std::mem::take(&mut self.events)
    }

    // Entities

    pub fn entities(&self) -> &EntityManager {
        &self.entities
    }

    /// Mutable access to the mirrored world, for client-only components
    pub fn entities_mut(&mut self) -> &mut EntityManager {
        &mut self.entities
    }

    pub fn component<C: Send + Sync + 'static>(&self, entity: &Entity) -> Option<&C> {
        self.entities.component::<C>(entity)
    }

    pub fn has_entity(&self, entity: &Entity) -> bool {
        self.entities.exists(entity)
    }

    /// Whether the entity left the view and is being kept at its last known
    /// state
    pub fn is_detached(&self, entity: &Entity) -> bool {
        self.processor.is_detached(entity)
    }

    /// Entities currently in view
    pub fn visible_entities(&self) -> Vec<Entity> {
        let mut visible: Vec<Entity> = self
            .entities
            .entities()
            .filter(|entity| !self.processor.is_detached(entity))
            .collect();
        visible.sort_unstable();
        visible
    }

    pub fn local_entity(&self) -> Option<Entity> {
        self.local_entity
    }

    /// Sets the entity the local player controls
    pub fn set_local_entity(&mut self, entity: Option<Entity>) {
        self.local_entity = entity;
    }

    // Diagnostics

    pub fn net_graph(&self) -> &NetGraph {
        &self.net_graph
    }

    pub fn net_graph_mut(&mut self) -> &mut NetGraph {
        &mut self.net_graph
    }

    /// Round trip time to the server, shown on the net graph
    pub fn set_lag(&mut self, lag_ms: u32) {
        self.lag_ms = lag_ms;
    }

    /// Runs a console command, returning the line to print
    pub fn execute_command(&mut self, line: &str) -> Result<String, ConsoleError> {
        let command = ConsoleCommand::parse(line)?;
        Ok(command.execute(&mut self.net_graph, self.local_entity))
    }
}

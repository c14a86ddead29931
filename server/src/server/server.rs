use std::{collections::HashMap, time::Duration};

use log::{debug, info};
use vantage_shared::{
    BitWriter, ChangeRecorder, ComponentChange, ComponentKinds, DirtyBuffer, Entity, EntityManager,
    EntityState, GameState, GetStateContext, MapId, Protocol, Serde, SessionKey, Tick, Vec2,
};

use crate::{
    pvs::PvsSystem,
    session::{NetChannel, Session, SessionScopeMut, SessionScopeRef},
    ServerConfig, VantageServerError,
};

/// Owns the authoritative world and, once per tick, decides what each
/// connected session sees and sends it.
///
/// A tick is driven as: [`Server::begin_tick`], simulation through the
/// mutation methods, then [`Server::send_all_states`].
pub struct Server {
    server_config: ServerConfig,
    // Protocol
    component_kinds: ComponentKinds,
    tick_interval: Duration,
    // World
    entities: EntityManager,
    dirty_buffer: DirtyBuffer,
    pvs: PvsSystem,
    // Sessions
    sessions: HashMap<SessionKey, Session>,
    next_session_key: u64,
}

impl Server {
    /// Create a new Server
    pub fn new<P: Into<Protocol>>(server_config: ServerConfig, protocol: P) -> Self {
        let protocol: Protocol = protocol.into();

        let Protocol {
            component_kinds,
            tick_interval,
            ..
        } = protocol;

        let dirty_buffer = DirtyBuffer::new(server_config.pvs.dirty_buffer_size);
        let pvs = PvsSystem::new(server_config.pvs.clone());

        Self {
            server_config,
            component_kinds,
            tick_interval,
            entities: EntityManager::new(),
            dirty_buffer,
            pvs,
            sessions: HashMap::new(),
            next_session_key: 0,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.server_config
    }

    pub fn component_kinds(&self) -> &ComponentKinds {
        &self.component_kinds
    }

    // Ticks

    /// Gets the current tick of the Server
    pub fn current_tick(&self) -> Tick {
        self.dirty_buffer.current_tick()
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Advances to the next tick. Every mutation until the next call is
    /// recorded against the new tick.
    pub fn begin_tick(&mut self) -> Tick {
        self.dirty_buffer.advance();
        self.dirty_buffer.current_tick()
    }

    /// Runs the PVS for every session and sends each its game state for the
    /// current tick. Must be called after the tick's simulation.
    pub fn send_all_states(&mut self) {
        let tick = self.current_tick();
        self.pvs.begin_frame(&self.entities);

        let mut session_keys: Vec<SessionKey> = self.sessions.keys().copied().collect();

        // shuffle order of sessions in order to avoid priority among them
        fastrand::shuffle(&mut session_keys);

        for session_key in session_keys {
            let Some(session) = self.sessions.get_mut(&session_key) else {
                continue;
            };

            session.prune_acknowledged();
            let view = self.pvs.compute_view(session, &self.entities);
            let (game_state, update) = self.pvs.write_state(
                session,
                &view,
                &self.entities,
                &self.dirty_buffer,
                &self.component_kinds,
            );
            session.apply(update);

            let mut writer = BitWriter::new();
            game_state.ser(&mut writer);
            let payload = writer.to_bytes();
            debug!(
                "Tick {}: {} entities, {} left, {} deleted, {} bytes to session {:?}",
                tick,
                game_state.entity_states.len(),
                game_state.left_pvs.len(),
                game_state.deletions.len(),
                payload.len(),
                session_key
            );
            session.send(tick, payload);
        }
    }

    /// Full, player-agnostic state of every entity, for recording replays
    pub fn replay_state(&self) -> GameState {
        let context = GetStateContext::replay();
        let mut game_state = GameState::new(None, self.current_tick());

        let mut entities: Vec<Entity> = self.entities.entities().collect();
        entities.sort_unstable();
        for entity in entities {
            let mut entity_state = EntityState::new_full(entity);
            for (net_id, kind) in self.component_kinds.kinds_on(&self.entities, &entity) {
                if let Some(bytes) =
                    self.component_kinds
                        .get_state(&kind, &self.entities, &entity, &context)
                {
                    entity_state.component_changes.push(ComponentChange {
                        net_id,
                        state: Some(bytes),
                    });
                }
            }
            game_state.entity_states.push(entity_state);
        }
        game_state
    }

    // Sessions

    /// Registers a new session communicating over `channel`. The session
    /// starts with no knowledge of the world and receives full state.
    pub fn connect(
        &mut self,
        channel: Box<dyn NetChannel>,
    ) -> Result<SessionKey, VantageServerError> {
        if let Some(max) = self.server_config.max_sessions {
            if self.sessions.len() >= max {
                return Err(VantageServerError::SessionLimitReached { max });
            }
        }

        let session_key = SessionKey::new(self.next_session_key);
        self.next_session_key += 1;
        self.sessions
            .insert(session_key, Session::new(session_key, channel));

        info!("Session {:?} connected", session_key);
        Ok(session_key)
    }

    /// Drops the session and everything recorded about it
    pub fn disconnect(&mut self, session_key: &SessionKey) -> Result<(), VantageServerError> {
        self.sessions
            .remove(session_key)
            .ok_or(VantageServerError::NoSuchSession { key: *session_key })?;

        info!("Session {:?} disconnected", session_key);
        Ok(())
    }

    pub fn session_exists(&self, session_key: &SessionKey) -> bool {
        self.sessions.contains_key(session_key)
    }

    /// Return a list of all currently connected Sessions' keys
    pub fn session_keys(&self) -> Vec<SessionKey> {
        self.sessions.keys().copied().collect()
    }

    pub fn sessions_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn session(&self, session_key: &SessionKey) -> Option<&Session> {
        self.sessions.get(session_key)
    }

    /// Returns a SessionScopeRef, which is used to query what a given
    /// session currently sees
    pub fn session_scope(
        &'_ self,
        session_key: &SessionKey,
    ) -> Result<SessionScopeRef<'_>, VantageServerError> {
        if self.sessions.contains_key(session_key) {
            return Ok(SessionScopeRef::new(self, session_key));
        }
        Err(VantageServerError::NoSuchSession { key: *session_key })
    }

    /// Returns a SessionScopeMut, which is used to attach eyes to a given
    /// session
    pub fn session_scope_mut(
        &'_ mut self,
        session_key: &SessionKey,
    ) -> Result<SessionScopeMut<'_>, VantageServerError> {
        if self.sessions.contains_key(session_key) {
            return Ok(SessionScopeMut::new(self, session_key));
        }
        Err(VantageServerError::NoSuchSession { key: *session_key })
    }

    pub(crate) fn session_scope_has_entity(&self, session_key: &SessionKey, entity: &Entity) -> bool {
        self.sessions
            .get(session_key)
            .is_some_and(|session| session.knows(entity))
    }

    pub(crate) fn session_attached(&self, session_key: &SessionKey) -> Option<Entity> {
        self.sessions.get(session_key)?.attached()
    }

    pub(crate) fn session_set_attached(
        &mut self,
        session_key: &SessionKey,
        entity: Option<Entity>,
    ) -> Result<(), VantageServerError> {
        if let Some(entity) = entity {
            self.check_entity(&entity)?;
        }
        let session = self
            .sessions
            .get_mut(session_key)
            .ok_or(VantageServerError::NoSuchSession { key: *session_key })?;
        session.set_attached(entity);
        Ok(())
    }

    pub(crate) fn session_set_view_subscription(
        &mut self,
        session_key: &SessionKey,
        entity: &Entity,
        subscribed: bool,
    ) -> Result<(), VantageServerError> {
        if subscribed {
            self.check_entity(entity)?;
        }
        let session = self
            .sessions
            .get_mut(session_key)
            .ok_or(VantageServerError::NoSuchSession { key: *session_key })?;
        if subscribed {
            session.add_view_subscription(*entity);
        } else {
            session.remove_view_subscription(entity);
        }
        Ok(())
    }

    fn check_entity(&self, entity: &Entity) -> Result<(), VantageServerError> {
        if self.entities.exists(entity) {
            Ok(())
        } else {
            Err(vantage_shared::EntityError::EntityDoesNotExist { entity: *entity }.into())
        }
    }

    // Entities

    pub fn entities(&self) -> &EntityManager {
        &self.entities
    }

    /// Direct access to the world and the change recorder, for batches of
    /// mutations the wrappers below do not cover
    pub fn world_mut(&mut self) -> (&mut EntityManager, &mut dyn ChangeRecorder) {
        (&mut self.entities, &mut self.dirty_buffer)
    }

    pub fn dirty_buffer(&self) -> &DirtyBuffer {
        &self.dirty_buffer
    }

    /// Creates a new Entity in nullspace
    pub fn spawn_entity(&mut self) -> Entity {
        self.entities.spawn(&mut self.dirty_buffer)
    }

    /// Creates a new Entity at `position` on `map`
    pub fn spawn_entity_at(&mut self, map: MapId, position: Vec2) -> Entity {
        self.entities
            .spawn_at(map, position, &mut self.dirty_buffer)
    }

    /// Deletes the Entity and its children. Sessions are told on their next
    /// state.
    pub fn despawn_entity(&mut self, entity: &Entity) -> Result<Vec<Entity>, VantageServerError> {
        let deleted = self.entities.delete(entity)?;
        for session in self.sessions.values_mut() {
            for entity in &deleted {
                session.forget_eye(entity);
            }
        }
        debug!("Despawned {} entities rooted at {}", deleted.len(), entity);
        Ok(deleted)
    }

    pub fn insert_component<C: Send + Sync + 'static>(
        &mut self,
        entity: &Entity,
        component: C,
    ) -> Result<Option<C>, VantageServerError> {
        Ok(self
            .entities
            .insert_component(entity, component, &mut self.dirty_buffer)?)
    }

    pub fn remove_component<C: Send + Sync + 'static>(&mut self, entity: &Entity) -> Option<C> {
        self.entities
            .remove_component::<C>(entity, &mut self.dirty_buffer)
    }

    pub fn component<C: Send + Sync + 'static>(&self, entity: &Entity) -> Option<&C> {
        self.entities.component::<C>(entity)
    }

    /// Mutable access to a component; the change is replicated
    pub fn modify_component<C: Send + Sync + 'static>(&mut self, entity: &Entity) -> Option<&mut C> {
        self.entities
            .modify_component::<C>(entity, &mut self.dirty_buffer)
    }

    /// Marks the Entity as changed this tick
    pub fn dirty(&mut self, entity: &Entity) {
        self.entities.dirty(entity, &mut self.dirty_buffer);
    }

    pub fn set_parent(
        &mut self,
        entity: &Entity,
        parent: Option<Entity>,
    ) -> Result<(), VantageServerError> {
        Ok(self
            .entities
            .set_parent(entity, parent, &mut self.dirty_buffer)?)
    }

    pub fn set_local_position(
        &mut self,
        entity: &Entity,
        position: Vec2,
    ) -> Result<(), VantageServerError> {
        Ok(self
            .entities
            .set_local_position(entity, position, &mut self.dirty_buffer)?)
    }

    pub fn set_layer(&mut self, entity: &Entity, layer: u32) -> Result<(), VantageServerError> {
        Ok(self.entities.set_layer(entity, layer)?)
    }

    pub fn add_layer(&mut self, entity: &Entity, layer: u32) -> Result<(), VantageServerError> {
        Ok(self.entities.add_layer(entity, layer)?)
    }

    pub fn remove_layer(&mut self, entity: &Entity, layer: u32) -> Result<(), VantageServerError> {
        Ok(self.entities.remove_layer(entity, layer)?)
    }

    /// Sends the Entity to every session regardless of view
    pub fn set_pvs_override(
        &mut self,
        entity: &Entity,
        value: bool,
    ) -> Result<(), VantageServerError> {
        Ok(self.entities.set_pvs_override(entity, value)?)
    }
}

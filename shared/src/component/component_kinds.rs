use std::{any::TypeId, collections::HashMap};

use log::info;
use vantage_serde::{BitReader, BitWriter, Serde};

use crate::{
    component::{
        error::ComponentError,
        networked::{GetStateAttempt, GetStateContext, NetworkedComponent},
    },
    types::NetId,
    world::{entity::Entity, entity_manager::EntityManager},
};

/// ComponentKind - should be one unique value for each type of networked Component
#[derive(Eq, Hash, Copy, Clone, PartialEq, Debug)]
pub struct ComponentKind {
    type_id: TypeId,
}

impl ComponentKind {
    pub fn of<C: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<C>(),
        }
    }

    pub fn type_id(&self) -> &TypeId {
        &self.type_id
    }
}

type GetStateFn = fn(&EntityManager, &Entity, &GetStateContext) -> Option<Vec<u8>>;
type HandleStateFn =
    fn(&mut EntityManager, &Entity, Option<&[u8]>, Option<&[u8]>) -> Result<(), ComponentError>;
type AttemptHandler = Box<dyn Fn(&EntityManager, &Entity, &mut GetStateAttempt) + Send + Sync>;

struct ComponentRegistration {
    net_id: NetId,
    name: &'static str,
    get_state: GetStateFn,
    handle_state: HandleStateFn,
    attempt_handlers: Vec<AttemptHandler>,
}

/// Registry of networked component types, resolved once at startup. Maps each
/// type to a wire id and to monomorphized get/handle state functions so the
/// PVS never needs to know a component's concrete type.
#[derive(Default)]
pub struct ComponentKinds {
    current_net_id: NetId,
    kind_map: HashMap<ComponentKind, ComponentRegistration>,
    net_id_map: HashMap<NetId, ComponentKind>,
}

impl ComponentKinds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_component<C: NetworkedComponent>(&mut self) -> Result<(), ComponentError> {
        let kind = ComponentKind::of::<C>();
        if self.kind_map.contains_key(&kind) {
            return Err(ComponentError::AlreadyRegistered { name: C::NAME });
        }

        let net_id = self.current_net_id;
        self.kind_map.insert(
            kind,
            ComponentRegistration {
                net_id,
                name: C::NAME,
                get_state: get_state_bytes::<C>,
                handle_state: handle_state_bytes::<C>,
                attempt_handlers: Vec::new(),
            },
        );
        self.net_id_map.insert(net_id, kind);
        self.current_net_id += 1;

        info!("Registered component {} with net id {}", C::NAME, net_id);
        Ok(())
    }

    /// Adds a handler that runs before `C`'s state is produced for a player
    /// and may cancel it
    pub fn add_get_state_attempt<C, F>(&mut self, handler: F) -> Result<(), ComponentError>
    where
        C: NetworkedComponent,
        F: Fn(&Entity, &C, &mut GetStateAttempt) + Send + Sync + 'static,
    {
        let registration = self
            .kind_map
            .get_mut(&ComponentKind::of::<C>())
            .ok_or(ComponentError::NotRegistered { type_name: C::NAME })?;
        registration
            .attempt_handlers
            .push(Box::new(
                move |manager: &EntityManager, entity: &Entity, attempt: &mut GetStateAttempt| {
                    if let Some(component) = manager.component::<C>(entity) {
                        handler(entity, component, attempt);
                    }
                },
            ));
        Ok(())
    }

    pub fn kind_to_net_id(&self, kind: &ComponentKind) -> Result<NetId, ComponentError> {
        self.kind_map
            .get(kind)
            .map(|registration| registration.net_id)
            .ok_or(ComponentError::NotRegistered {
                type_name: "unknown",
            })
    }

    pub fn net_id_to_kind(&self, net_id: &NetId) -> Result<ComponentKind, ComponentError> {
        self.net_id_map
            .get(net_id)
            .copied()
            .ok_or(ComponentError::UnknownNetId { net_id: *net_id })
    }

    pub fn kind_name(&self, kind: &ComponentKind) -> &'static str {
        self.kind_map
            .get(kind)
            .map(|registration| registration.name)
            .unwrap_or("unknown")
    }

    pub fn net_id_name(&self, net_id: &NetId) -> &'static str {
        self.net_id_map
            .get(net_id)
            .map(|kind| self.kind_name(kind))
            .unwrap_or("unknown")
    }

    pub fn len(&self) -> usize {
        self.kind_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kind_map.is_empty()
    }

    /// Registered kinds the entity currently has, in net id order
    pub fn kinds_on(&self, manager: &EntityManager, entity: &Entity) -> Vec<(NetId, ComponentKind)> {
        let mut kinds: Vec<(NetId, ComponentKind)> = self
            .kind_map
            .iter()
            .filter(|(kind, _)| manager.has_component_of_type(kind.type_id(), entity))
            .map(|(kind, registration)| (registration.net_id, *kind))
            .collect();
        kinds.sort_unstable_by_key(|(net_id, _)| *net_id);
        kinds
    }

    /// Produces the serialized state of the entity's component for the given
    /// context. Returns `None` if the entity lacks the component, an attempt
    /// handler cancelled, or the component had nothing to send.
    pub fn get_state(
        &self,
        kind: &ComponentKind,
        manager: &EntityManager,
        entity: &Entity,
        context: &GetStateContext,
    ) -> Option<Vec<u8>> {
        let registration = self.kind_map.get(kind)?;

        if context.player.is_some() && !registration.attempt_handlers.is_empty() {
            let mut attempt = GetStateAttempt::new(context.player);
            for handler in &registration.attempt_handlers {
                handler(manager, entity, &mut attempt);
                if attempt.cancelled() {
                    return None;
                }
            }
        }

        (registration.get_state)(manager, entity, context)
    }

    /// Decodes a received pair of states and applies them to the entity's
    /// component, creating it from `Default` if needed. On a decode failure
    /// the component is left untouched.
    pub fn handle_state(
        &self,
        net_id: &NetId,
        manager: &mut EntityManager,
        entity: &Entity,
        current: Option<&[u8]>,
        next: Option<&[u8]>,
    ) -> Result<(), ComponentError> {
        let kind = self.net_id_to_kind(net_id)?;
        let registration = self
            .kind_map
            .get(&kind)
            .ok_or(ComponentError::UnknownNetId { net_id: *net_id })?;
        (registration.handle_state)(manager, entity, current, next)
    }
}

fn get_state_bytes<C: NetworkedComponent>(
    manager: &EntityManager,
    entity: &Entity,
    context: &GetStateContext,
) -> Option<Vec<u8>> {
    let state = manager.component::<C>(entity)?.get_state(context)?;
    let mut writer = BitWriter::new();
    state.ser(&mut writer);
    Some(writer.to_bytes())
}

fn decode_state<C: NetworkedComponent>(bytes: &[u8]) -> Result<C::State, ComponentError> {
    let mut reader = BitReader::new(bytes);
    C::State::de(&mut reader).map_err(|source| ComponentError::Decode {
        name: C::NAME,
        source,
    })
}

fn handle_state_bytes<C: NetworkedComponent>(
    manager: &mut EntityManager,
    entity: &Entity,
    current: Option<&[u8]>,
    next: Option<&[u8]>,
) -> Result<(), ComponentError> {
    let current = current.map(decode_state::<C>).transpose()?;
    let next = next.map(decode_state::<C>).transpose()?;

    match manager.component_mut::<C>(entity) {
        Some(component) => component.handle_state(current.as_ref(), next.as_ref()),
        None => {
            let mut component = C::default();
            component.handle_state(current.as_ref(), next.as_ref());
            manager.insert_local_component(entity, component)?;
        }
    }
    Ok(())
}

use std::time::Duration;

use crate::{
    component::{
        component_kinds::ComponentKinds,
        networked::{GetStateAttempt, NetworkedComponent},
    },
    world::{entity::Entity, eye::Eye},
};

pub mod error;
pub use error::ProtocolError;

/// Everything both ends must agree on before connecting: which components are
/// networked (and their wire ids) and the tick interval.
pub struct Protocol {
    pub component_kinds: ComponentKinds,
    /// The duration between each tick
    pub tick_interval: Duration,
    locked: bool,
}

impl Default for Protocol {
    fn default() -> Self {
        let mut component_kinds = ComponentKinds::new();
        // registered first on every protocol, so it always has net id 0
        let _ = component_kinds.add_component::<Eye>();

        Self {
            component_kinds,
            tick_interval: Duration::from_millis(50),
            locked: false,
        }
    }
}

impl Protocol {
    pub fn builder() -> Self {
        Self::default()
    }

    /// Ticks per second, rounded down, never zero
    pub fn tick_rate(&self) -> u32 {
        let millis = self.tick_interval.as_millis().max(1);
        ((1000 / millis) as u32).max(1)
    }

    pub fn tick_interval(&mut self, duration: Duration) -> &mut Self {
        self.check_lock();
        self.tick_interval = duration;
        self
    }

    /// # Panics
    ///
    /// Panics if the protocol is locked or the component is already registered
    pub fn add_component<C: NetworkedComponent>(&mut self) -> &mut Self {
        if let Err(error) = self.try_add_component::<C>() {
            panic!("{}", error);
        }
        self
    }

    /// # Panics
    ///
    /// Panics if the protocol is locked or `C` is not registered
    pub fn add_get_state_attempt<C, F>(&mut self, handler: F) -> &mut Self
    where
        C: NetworkedComponent,
        F: Fn(&Entity, &C, &mut GetStateAttempt) + Send + Sync + 'static,
    {
        if let Err(error) = self.try_add_get_state_attempt::<C, F>(handler) {
            panic!("{}", error);
        }
        self
    }

    // Non-panicking builder methods

    pub fn try_tick_interval(&mut self, duration: Duration) -> Result<&mut Self, ProtocolError> {
        self.try_check_lock()?;
        self.tick_interval = duration;
        Ok(self)
    }

    pub fn try_add_component<C: NetworkedComponent>(&mut self) -> Result<&mut Self, ProtocolError> {
        self.try_check_lock()?;
        self.component_kinds.add_component::<C>()?;
        Ok(self)
    }

    pub fn try_add_get_state_attempt<C, F>(&mut self, handler: F) -> Result<&mut Self, ProtocolError>
    where
        C: NetworkedComponent,
        F: Fn(&Entity, &C, &mut GetStateAttempt) + Send + Sync + 'static,
    {
        self.try_check_lock()?;
        self.component_kinds.add_get_state_attempt::<C, F>(handler)?;
        Ok(self)
    }

    pub fn try_lock(&mut self) -> Result<(), ProtocolError> {
        self.try_check_lock()?;
        self.locked = true;
        Ok(())
    }

    pub fn lock(&mut self) {
        self.check_lock();
        self.locked = true;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Returns Err if protocol is locked
    pub fn try_check_lock(&self) -> Result<(), ProtocolError> {
        if self.locked {
            Err(ProtocolError::AlreadyLocked)
        } else {
            Ok(())
        }
    }

    /// Panics if protocol is locked
    pub fn check_lock(&self) {
        if self.locked {
            panic!("Protocol already locked!");
        }
    }

    pub fn build(&mut self) -> Self {
        std::mem::take(self)
    }
}

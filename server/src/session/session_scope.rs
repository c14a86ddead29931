use vantage_shared::{Entity, SessionKey};

use crate::{Server, VantageServerError};

pub struct SessionScopeRef<'s> {
    server: &'s Server,
    key: SessionKey,
}

impl<'s> SessionScopeRef<'s> {
    pub(crate) fn new(server: &'s Server, key: &SessionKey) -> Self {
        Self { server, key: *key }
    }

    /// Returns true if the Entity has been sent to the Session and has not
    /// since left its view
    pub fn has(&self, entity: &Entity) -> bool {
        self.server.session_scope_has_entity(&self.key, entity)
    }

    /// Returns the Entity the Session is attached to, if any
    pub fn attached(&self) -> Option<Entity> {
        self.server.session_attached(&self.key)
    }
}

pub struct SessionScopeMut<'s> {
    server: &'s mut Server,
    key: SessionKey,
}

impl<'s> SessionScopeMut<'s> {
    pub(crate) fn new(server: &'s mut Server, key: &SessionKey) -> Self {
        Self { server, key: *key }
    }

    /// Returns true if the Entity has been sent to the Session and has not
    /// since left its view
    pub fn has(&self, entity: &Entity) -> bool {
        self.server.session_scope_has_entity(&self.key, entity)
    }

    /// Attaches the Session to an Entity, which becomes its primary eye
    pub fn attach(&mut self, entity: &Entity) -> Result<&mut Self, VantageServerError> {
        self.server.session_set_attached(&self.key, Some(*entity))?;

        Ok(self)
    }

    /// Detaches the Session from its Entity
    pub fn detach(&mut self) -> Result<&mut Self, VantageServerError> {
        self.server.session_set_attached(&self.key, None)?;

        Ok(self)
    }

    /// Adds an extra eye the Session also sees through
    pub fn add_view_subscriber(&mut self, entity: &Entity) -> Result<&mut Self, VantageServerError> {
        self.server
            .session_set_view_subscription(&self.key, entity, true)?;

        Ok(self)
    }

    /// Removes an extra eye from the Session
    pub fn remove_view_subscriber(
        &mut self,
        entity: &Entity,
    ) -> Result<&mut Self, VantageServerError> {
        self.server
            .session_set_view_subscription(&self.key, entity, false)?;

        Ok(self)
    }
}

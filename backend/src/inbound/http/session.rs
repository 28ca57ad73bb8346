//! Session helpers keeping HTTP handlers free of framework-specific logic.
//!
//! The cookie session carries the authenticated user's id and role. Handlers
//! go through [`SessionContext`] so optional-auth endpoints, mandatory-auth
//! endpoints, and role-gated endpoints all resolve identity the same way.

use actix_session::Session;
use actix_web::{dev::Payload, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use std::str::FromStr;

use crate::domain::ports::{Actor, AuthenticatedIdentity};
use crate::domain::{Error, Role, UserId};

pub(crate) const USER_ID_KEY: &str = "user_id";
pub(crate) const ROLE_KEY: &str = "role";

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a new wrapper from the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Persist the authenticated identity in the session cookie.
    pub fn persist_identity(&self, identity: &AuthenticatedIdentity) -> Result<(), Error> {
        self.0
            .insert(USER_ID_KEY, identity.id.to_string())
            .and_then(|()| self.0.insert(ROLE_KEY, identity.role.as_str()))
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Drop the session entirely, invalidating the cookie.
    pub fn clear(&self) {
        self.0.purge();
    }

    /// Fetch the current identity from the session, if present.
    ///
    /// A cookie carrying an unparseable id or role is treated as anonymous
    /// rather than failing the request.
    pub fn identity(&self) -> Result<Option<Actor>, Error> {
        let read = |key: &str| {
            self.0
                .get::<String>(key)
                .map_err(|error| Error::internal(format!("failed to read session: {error}")))
        };
        let (Some(raw_id), Some(raw_role)) = (read(USER_ID_KEY)?, read(ROLE_KEY)?) else {
            return Ok(None);
        };

        match (UserId::new(&raw_id), Role::from_str(&raw_role)) {
            (Ok(id), Ok(role)) => Ok(Some(Actor { id, role })),
            _ => {
                tracing::warn!("unparseable identity in session cookie");
                Ok(None)
            }
        }
    }

    /// Require an authenticated identity or return `401 Unauthorized`.
    pub fn require_identity(&self) -> Result<Actor, Error> {
        self.identity()?
            .ok_or_else(|| Error::unauthorized("login required"))
    }

    /// Require an authenticated identity holding `role` or return
    /// `403 Forbidden` (`401` when anonymous).
    pub fn require_role(&self, role: Role) -> Result<Actor, Error> {
        let actor = self.require_identity()?;
        if actor.role != role {
            return Err(Error::forbidden(format!(
                "this action requires the {role} role"
            )));
        }
        Ok(actor)
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}

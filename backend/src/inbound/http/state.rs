//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AdminCommand, EventsCommand, EventsQuery, IdentityCommand, IdentityQuery, LoginService,
    RegistrationsCommand, RegistrationsQuery,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub identity: Arc<dyn IdentityCommand>,
    pub identity_query: Arc<dyn IdentityQuery>,
    pub admin: Arc<dyn AdminCommand>,
    pub events: Arc<dyn EventsCommand>,
    pub events_query: Arc<dyn EventsQuery>,
    pub registrations: Arc<dyn RegistrationsCommand>,
    pub registrations_query: Arc<dyn RegistrationsQuery>,
}

//! Server construction and middleware wiring.

mod config;

pub use config::{AdminSeed, Cli, ConfigError, ServerConfig};

use std::sync::Arc;

use actix_session::{
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
    SessionMiddleware,
};
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{web, App, HttpServer};
use tracing::info;

#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[cfg(debug_assertions)]
use crate::doc::ApiDoc;
use crate::domain::ports::UserRepository;
use crate::domain::{
    EmailAddress, EventService, IdentityService, PasswordHash, RegistrationService, User,
};
use crate::inbound::http::health::{live, ready, HealthState};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::{admin, auth, events, organizers, profile, registrations};
use crate::middleware::Trace;
use crate::outbound::persistence::{
    MemoryEventRepository, MemoryRegistrationLedger, MemoryStore, MemoryUserRepository,
};

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    key: Key,
    cookie_secure: bool,
}

/// Wire the in-memory adapters and services into the handler state.
///
/// Public so integration tests can assemble the full service stack over a
/// store they control.
pub fn build_http_state(store: &MemoryStore) -> web::Data<HttpState> {
    let users = Arc::new(MemoryUserRepository::new(store.clone()));
    let events = Arc::new(MemoryEventRepository::new(store.clone()));
    let ledger = Arc::new(MemoryRegistrationLedger::new(store.clone()));

    let identity = Arc::new(IdentityService::new(users.clone()));
    let event_service = Arc::new(EventService::new(events.clone(), users));
    let registration_service = Arc::new(RegistrationService::new(events, ledger));

    web::Data::new(HttpState {
        login: identity.clone(),
        identity: identity.clone(),
        identity_query: identity.clone(),
        admin: identity,
        events: event_service.clone(),
        events_query: event_service,
        registrations: registration_service.clone(),
        registrations_query: registration_service,
    })
}

/// Ensure the bootstrap admin account exists. Reuses the existing record
/// when the email is already present.
async fn seed_admin(store: &MemoryStore, seed: &AdminSeed) -> std::io::Result<()> {
    let users = MemoryUserRepository::new(store.clone());
    let email = EmailAddress::new(&seed.email)
        .map_err(|err| std::io::Error::other(format!("invalid admin email: {err}")))?;

    let existing = users
        .find_by_email(&email)
        .await
        .map_err(|err| std::io::Error::other(format!("admin lookup failed: {err}")))?;
    if existing.is_some() {
        info!(email = %email.as_str(), "admin account already present; skipping seed");
        return Ok(());
    }

    let admin = User::admin(email, PasswordHash::derive(&seed.password));
    users
        .insert(&admin)
        .await
        .map_err(|err| std::io::Error::other(format!("admin seed failed: {err}")))?;
    info!(id = %admin.id, "seeded admin account");
    Ok(())
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        key,
        cookie_secure,
    } = deps;

    let session = SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(SameSite::Lax)
        .session_lifecycle(
            PersistentSession::default().session_ttl(actix_web::cookie::time::Duration::hours(2)),
        )
        .build();

    let api = web::scope("/api/v1")
        .wrap(session)
        .service(auth::register)
        .service(auth::login)
        .service(auth::logout)
        .service(auth::change_password)
        .service(profile::get_profile)
        .service(profile::update_profile)
        .service(profile::get_preferences)
        .service(profile::update_preferences)
        .service(profile::follow_organizer)
        .service(profile::unfollow_organizer)
        .service(organizers::list_organizers)
        .service(organizers::get_organizer_profile)
        .service(organizers::update_organizer_profile)
        .service(admin::create_organizer)
        .service(admin::remove_organizer)
        .service(admin::reset_organizer_password)
        .service(events::list_events)
        .service(events::create_event)
        .service(events::get_event)
        .service(events::update_event)
        .service(events::publish_event)
        .service(events::set_event_ongoing)
        .service(events::close_event)
        .service(events::complete_event)
        .service(events::extend_event)
        .service(registrations::register_for_event)
        .service(registrations::purchase_merch)
        .service(registrations::registration_history);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .service(api)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    #[cfg(not(debug_assertions))]
    let app = app;

    app
}

/// Construct the Actix HTTP server over a fresh in-memory store.
///
/// Seeds the admin account when configured, binds the listener, and marks
/// the health state ready. The returned [`Server`] must be awaited to drive
/// the listener.
pub async fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let store = MemoryStore::new();
    if let Some(seed) = &config.admin_seed {
        seed_admin(&store, seed).await?;
    }

    let http_state = build_http_state(&store);
    let server_health_state = health_state.clone();
    let ServerConfig {
        key,
        cookie_secure,
        bind_addr,
        admin_seed: _,
    } = config;

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            key: key.clone(),
            cookie_secure,
        })
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}

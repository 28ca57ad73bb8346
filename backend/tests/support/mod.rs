//! Shared harness assembling the full HTTP application over an in-memory
//! store the test controls.

use actix_http::Request;
use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web, App, Error};
use serde_json::json;

use fest_backend::domain::ports::UserRepository;
use fest_backend::domain::{EmailAddress, PasswordHash, User};
use fest_backend::inbound::http::{admin, auth, events, organizers, profile, registrations};
use fest_backend::outbound::persistence::{MemoryStore, MemoryUserRepository};
use fest_backend::server::build_http_state;
use fest_backend::Trace;

/// Build an initialised test service mirroring the production wiring.
pub async fn spawn_app(
    store: &MemoryStore,
) -> impl Service<Request, Response = ServiceResponse, Error = Error> {
    let state = build_http_state(store);
    let session = SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".into())
        .cookie_secure(false)
        .build();

    test::init_service(
        App::new()
            .app_data(state)
            .wrap(Trace)
            .service(
                web::scope("/api/v1")
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
                    .service(registrations::registration_history),
            ),
    )
    .await
}

/// Insert an admin account directly into the store.
pub async fn seed_admin(store: &MemoryStore, email: &str, password: &str) {
    let users = MemoryUserRepository::new(store.clone());
    let admin = User::admin(
        EmailAddress::new(email).expect("admin email"),
        PasswordHash::derive(password),
    );
    users.insert(&admin).await.expect("seed admin");
}

/// Log in and return the session cookie.
pub async fn login(
    app: &impl Service<Request, Response = ServiceResponse, Error = Error>,
    email: &str,
    password: &str,
) -> Cookie<'static> {
    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({ "email": email, "password": password }))
        .to_request();
    let res = test::call_service(app, req).await;
    assert!(res.status().is_success(), "login failed: {}", res.status());
    res.response()
        .cookies()
        .find(|c| c.name() == "session")
        .expect("session cookie")
        .into_owned()
}

/// Register a Non-IIIT participant and return their session cookie.
pub async fn register_participant(
    app: &impl Service<Request, Response = ServiceResponse, Error = Error>,
    email: &str,
    password: &str,
) -> Cookie<'static> {
    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": email,
            "password": password,
            "participantType": "Non-IIIT",
            "college": "Analytical College"
        }))
        .to_request();
    let res = test::call_service(app, req).await;
    assert_eq!(res.status().as_u16(), 201, "signup failed");
    login(app, email, password).await
}

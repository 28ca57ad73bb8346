//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every REST endpoint from the inbound layer, the
//! request and response schemas they reference, and the session-cookie
//! security scheme. Swagger UI serves the generated document in debug
//! builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Error, ErrorCode, FormField, InputKind, MerchItem, MerchSelection};
use crate::inbound::http::admin::{CreateOrganizerPayload, CreatedResponse, ResetPasswordPayload};
use crate::inbound::http::auth::{
    ChangePasswordRequest, IdentityResponse, LoginRequest, RegisterRequest,
};
use crate::inbound::http::events::{
    CreateEventRequest, EventListQuery, EventResponse, ExtendEventRequest, StatusResponse,
    UpdateEventRequest,
};
use crate::inbound::http::organizers::{
    OrganizerProfileResponse, OrganizerResponse, UpdateOrganizerRequest,
};
use crate::inbound::http::profile::{
    PreferencesRequest, PreferencesResponse, ProfileResponse, UpdateProfileRequest,
};
use crate::inbound::http::registrations::{
    HistoryResponse, PurchasePayload, RegisterPayload, RegistrationResponse,
};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/auth/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Fest backend API",
        description = "HTTP interface for campus-fest event management."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::auth::register,
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::logout,
        crate::inbound::http::auth::change_password,
        crate::inbound::http::profile::get_profile,
        crate::inbound::http::profile::update_profile,
        crate::inbound::http::profile::get_preferences,
        crate::inbound::http::profile::update_preferences,
        crate::inbound::http::profile::follow_organizer,
        crate::inbound::http::profile::unfollow_organizer,
        crate::inbound::http::organizers::list_organizers,
        crate::inbound::http::organizers::get_organizer_profile,
        crate::inbound::http::organizers::update_organizer_profile,
        crate::inbound::http::admin::create_organizer,
        crate::inbound::http::admin::remove_organizer,
        crate::inbound::http::admin::reset_organizer_password,
        crate::inbound::http::events::list_events,
        crate::inbound::http::events::get_event,
        crate::inbound::http::events::create_event,
        crate::inbound::http::events::update_event,
        crate::inbound::http::events::publish_event,
        crate::inbound::http::events::set_event_ongoing,
        crate::inbound::http::events::close_event,
        crate::inbound::http::events::complete_event,
        crate::inbound::http::events::extend_event,
        crate::inbound::http::registrations::register_for_event,
        crate::inbound::http::registrations::purchase_merch,
        crate::inbound::http::registrations::registration_history,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        FormField,
        InputKind,
        MerchItem,
        MerchSelection,
        RegisterRequest,
        LoginRequest,
        ChangePasswordRequest,
        IdentityResponse,
        ProfileResponse,
        UpdateProfileRequest,
        PreferencesRequest,
        PreferencesResponse,
        OrganizerResponse,
        OrganizerProfileResponse,
        UpdateOrganizerRequest,
        CreateOrganizerPayload,
        ResetPasswordPayload,
        CreatedResponse,
        EventResponse,
        CreateEventRequest,
        UpdateEventRequest,
        ExtendEventRequest,
        EventListQuery,
        StatusResponse,
        RegisterPayload,
        PurchasePayload,
        RegistrationResponse,
        HistoryResponse,
    )),
    tags(
        (name = "auth", description = "Signup, login, and credential management"),
        (name = "users", description = "Profiles, preferences, and follows"),
        (name = "organizers", description = "Organizer directory and profiles"),
        (name = "admin", description = "Organizer account provisioning"),
        (name = "events", description = "Event lifecycle and listings"),
        (name = "registrations", description = "Registrations and purchases"),
        (name = "health", description = "Health probes")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use utoipa::openapi::schema::Schema;
    use utoipa::openapi::RefOr;

    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[test]
    fn error_schema_has_code_and_message() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error_schema = schemas.get("Error").expect("Error schema");

        assert_object_schema_has_field(error_schema, "code");
        assert_object_schema_has_field(error_schema, "message");
    }

    #[test]
    fn registers_every_surface_path() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/auth/register",
            "/api/v1/events",
            "/api/v1/events/{id}/register",
            "/api/v1/registrations/me",
            "/health/ready",
        ] {
            assert!(
                doc.paths.paths.contains_key(path),
                "missing path {path} in document"
            );
        }
    }
}

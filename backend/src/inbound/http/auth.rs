//! Authentication HTTP handlers.
//!
//! ```text
//! POST /api/v1/auth/register
//! POST /api/v1/auth/login
//! POST /api/v1/auth/logout
//! POST /api/v1/auth/change-password
//! ```

use std::str::FromStr;

use actix_web::{post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::RegisterParticipantRequest;
use crate::domain::{Error, LoginCredentials, LoginValidationError, ParticipantType};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{invalid_value_error, missing_field_error, parse_email};
use crate::inbound::http::ApiResult;

/// Request payload for participant signup.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub participant_type: Option<String>,
    pub college: Option<String>,
    pub contact_number: Option<String>,
    pub interests: Option<Vec<String>>,
}

/// Request payload for login.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Request payload for a self-service password change.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// The signed-in identity, also returned on signup.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdentityResponse {
    pub id: String,
    pub role: String,
}

fn parse_register_request(payload: RegisterRequest) -> Result<RegisterParticipantRequest, Error> {
    let first_name = payload
        .first_name
        .ok_or_else(|| missing_field_error("firstName"))?;
    let last_name = payload
        .last_name
        .ok_or_else(|| missing_field_error("lastName"))?;
    let email = payload.email.ok_or_else(|| missing_field_error("email"))?;
    let password = payload
        .password
        .ok_or_else(|| missing_field_error("password"))?;
    let participant_type = payload
        .participant_type
        .ok_or_else(|| missing_field_error("participantType"))?;

    let participant_type = ParticipantType::from_str(&participant_type).map_err(|_| {
        invalid_value_error(
            "participantType",
            participant_type,
            "participantType must be IIIT or Non-IIIT",
        )
    })?;

    Ok(RegisterParticipantRequest {
        first_name,
        last_name,
        email: parse_email("email", &email)?,
        password,
        participant_type,
        college: payload.college,
        contact_number: payload.contact_number,
        interests: payload.interests.unwrap_or_default(),
    })
}

fn parse_login_request(payload: LoginRequest) -> Result<LoginCredentials, Error> {
    let email = payload.email.ok_or_else(|| missing_field_error("email"))?;
    let password = payload
        .password
        .ok_or_else(|| missing_field_error("password"))?;

    LoginCredentials::try_from_parts(&email, &password).map_err(|err| match err {
        LoginValidationError::EmptyEmail => missing_field_error("email"),
        LoginValidationError::EmptyPassword => missing_field_error("password"),
    })
}

/// Register a participant account.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = IdentityResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "Email already registered", body = Error)
    ),
    tags = ["auth"],
    security([]),
    operation_id = "register"
)]
#[post("/auth/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let request = parse_register_request(payload.into_inner())?;
    let id = state.identity.register_participant(request).await?;
    Ok(HttpResponse::Created().json(IdentityResponse {
        id: id.to_string(),
        role: crate::domain::Role::Participant.as_str().to_owned(),
    }))
}

/// Authenticate and open a session.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = IdentityResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error)
    ),
    tags = ["auth"],
    security([]),
    operation_id = "login"
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let credentials = parse_login_request(payload.into_inner())?;
    let identity = state.login.authenticate(&credentials).await?;
    session.persist_identity(&identity)?;
    Ok(HttpResponse::Ok().json(IdentityResponse {
        id: identity.id.to_string(),
        role: identity.role.as_str().to_owned(),
    }))
}

/// Close the current session.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses(
        (status = 204, description = "Signed out")
    ),
    tags = ["auth"],
    operation_id = "logout"
)]
#[post("/auth/logout")]
pub async fn logout(session: SessionContext) -> ApiResult<HttpResponse> {
    session.clear();
    Ok(HttpResponse::NoContent().finish())
}

/// Change the caller's password.
#[utoipa::path(
    post,
    path = "/api/v1/auth/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Not signed in or wrong current password", body = Error)
    ),
    tags = ["auth"],
    operation_id = "changePassword"
)]
#[post("/auth/change-password")]
pub async fn change_password(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<ChangePasswordRequest>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_identity()?;
    let payload = payload.into_inner();
    let current = payload
        .current_password
        .ok_or_else(|| missing_field_error("currentPassword"))?;
    let new = payload
        .new_password
        .ok_or_else(|| missing_field_error("newPassword"))?;

    state.identity.change_password(&actor.id, &current, &new).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    fn full_register_payload() -> RegisterRequest {
        RegisterRequest {
            first_name: Some("Ada".into()),
            last_name: Some("Lovelace".into()),
            email: Some("Ada@IIIT.ac.in".into()),
            password: Some("hunter2".into()),
            participant_type: Some("IIIT".into()),
            college: None,
            contact_number: None,
            interests: Some(vec!["robotics".into()]),
        }
    }

    #[rstest]
    fn register_payload_parses_and_normalises() {
        let parsed = parse_register_request(full_register_payload()).expect("parsed");
        assert_eq!(parsed.email.as_str(), "ada@iiit.ac.in");
        assert_eq!(parsed.participant_type, ParticipantType::Iiit);
        assert_eq!(parsed.interests, vec!["robotics".to_owned()]);
    }

    #[rstest]
    fn register_payload_requires_core_fields() {
        let payload = RegisterRequest {
            email: None,
            ..full_register_payload()
        };
        let err = parse_register_request(payload).expect_err("missing email");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(err.details().expect("details")["field"], "email");
    }

    #[rstest]
    fn register_payload_rejects_unknown_participant_type() {
        let payload = RegisterRequest {
            participant_type: Some("alumni".into()),
            ..full_register_payload()
        };
        let err = parse_register_request(payload).expect_err("bad type");
        assert_eq!(err.details().expect("details")["field"], "participantType");
    }

    #[rstest]
    fn login_payload_requires_both_fields() {
        let err = parse_login_request(LoginRequest {
            email: Some("ada@example.com".into()),
            password: None,
        })
        .expect_err("missing password");
        assert_eq!(err.details().expect("details")["field"], "password");
    }
}

//! Admin HTTP handlers for organizer account lifecycle.
//!
//! ```text
//! POST   /api/v1/admin/organizers
//! DELETE /api/v1/admin/organizers/{id}
//! POST   /api/v1/admin/organizers/{id}/reset-password
//! ```

use actix_web::{delete, post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::CreateOrganizerRequest;
use crate::domain::{Error, Role};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{missing_field_error, parse_email, parse_user_id};
use crate::inbound::http::ApiResult;

/// Request payload for provisioning an organizer account.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrganizerPayload {
    pub organizer_name: Option<String>,
    pub organizer_category: Option<String>,
    pub organizer_description: Option<String>,
    pub organizer_contact_email: Option<String>,
    pub login_email: Option<String>,
    pub password: Option<String>,
}

/// Request payload for an admin password reset.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordPayload {
    pub new_password: Option<String>,
}

/// Identifier of a newly provisioned organizer.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatedResponse {
    pub id: String,
}

fn parse_create_organizer(payload: CreateOrganizerPayload) -> Result<CreateOrganizerRequest, Error> {
    let organizer_name = payload
        .organizer_name
        .ok_or_else(|| missing_field_error("organizerName"))?;
    let login_email = payload
        .login_email
        .ok_or_else(|| missing_field_error("loginEmail"))?;
    let password = payload
        .password
        .ok_or_else(|| missing_field_error("password"))?;

    Ok(CreateOrganizerRequest {
        organizer_name,
        organizer_category: payload.organizer_category,
        organizer_description: payload.organizer_description,
        organizer_contact_email: payload.organizer_contact_email,
        login_email: parse_email("loginEmail", &login_email)?,
        password,
    })
}

/// Provision an organizer account.
#[utoipa::path(
    post,
    path = "/api/v1/admin/organizers",
    request_body = CreateOrganizerPayload,
    responses(
        (status = 201, description = "Organizer created", body = CreatedResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Not an admin", body = Error),
        (status = 409, description = "Email already registered", body = Error)
    ),
    tags = ["admin"],
    operation_id = "createOrganizer"
)]
#[post("/admin/organizers")]
pub async fn create_organizer(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateOrganizerPayload>,
) -> ApiResult<HttpResponse> {
    session.require_role(Role::Admin)?;
    let request = parse_create_organizer(payload.into_inner())?;
    let id = state.admin.create_organizer(request).await?;
    Ok(HttpResponse::Created().json(CreatedResponse { id: id.to_string() }))
}

/// Remove an organizer account.
#[utoipa::path(
    delete,
    path = "/api/v1/admin/organizers/{id}",
    params(("id" = String, Path, description = "Organizer identifier")),
    responses(
        (status = 204, description = "Organizer removed"),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Not an admin", body = Error),
        (status = 404, description = "No such organizer", body = Error)
    ),
    tags = ["admin"],
    operation_id = "removeOrganizer"
)]
#[delete("/admin/organizers/{id}")]
pub async fn remove_organizer(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    session.require_role(Role::Admin)?;
    let organizer = parse_user_id("id", &path.into_inner())?;
    state.admin.remove_organizer(&organizer).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Overwrite an organizer's password.
#[utoipa::path(
    post,
    path = "/api/v1/admin/organizers/{id}/reset-password",
    params(("id" = String, Path, description = "Organizer identifier")),
    request_body = ResetPasswordPayload,
    responses(
        (status = 204, description = "Password reset"),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Not an admin", body = Error),
        (status = 404, description = "No such organizer", body = Error)
    ),
    tags = ["admin"],
    operation_id = "resetOrganizerPassword"
)]
#[post("/admin/organizers/{id}/reset-password")]
pub async fn reset_organizer_password(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<ResetPasswordPayload>,
) -> ApiResult<HttpResponse> {
    session.require_role(Role::Admin)?;
    let organizer = parse_user_id("id", &path.into_inner())?;
    let new_password = payload
        .into_inner()
        .new_password
        .ok_or_else(|| missing_field_error("newPassword"))?;
    state
        .admin
        .reset_organizer_password(&organizer, &new_password)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

//! Registration and purchase HTTP handlers.
//!
//! ```text
//! POST /api/v1/events/{id}/register
//! POST /api/v1/events/{id}/purchase
//! GET  /api/v1/registrations/me
//! ```

use std::collections::BTreeMap;

use actix_web::{get, post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::HistoryEntry;
use crate::domain::{
    Error, EventKind, MerchSelection, Registration, RegistrationPayload, RegistrationStatus,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::parse_event_id;
use crate::inbound::http::ApiResult;

/// Request payload for a normal-event registration.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPayload {
    /// Answers keyed by form field label. Defaults to empty when the event
    /// has no form.
    pub answers: Option<BTreeMap<String, String>>,
}

/// Request payload for a merchandise purchase. Both fields are optional
/// on the wire: the first item and a quantity of one are assumed.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchasePayload {
    #[serde(default)]
    pub item_index: usize,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

/// A registration receipt.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub id: String,
    pub event: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    pub ticket: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answers: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<MerchSelection>,
    pub fee_paid: u32,
    pub created_at: String,
}

fn kind_str(kind: EventKind) -> &'static str {
    match kind {
        EventKind::Normal => "normal",
        EventKind::Merchandise => "merchandise",
    }
}

fn status_str(status: RegistrationStatus) -> &'static str {
    match status {
        RegistrationStatus::Registered => "registered",
        RegistrationStatus::Cancelled => "cancelled",
        RegistrationStatus::Rejected => "rejected",
        RegistrationStatus::Completed => "completed",
    }
}

impl From<Registration> for RegistrationResponse {
    fn from(registration: Registration) -> Self {
        let (answers, item) = match registration.payload {
            RegistrationPayload::Form { answers } => (Some(answers), None),
            RegistrationPayload::Merch { item } => (None, Some(item)),
        };
        Self {
            id: registration.id.to_string(),
            event: registration.event.to_string(),
            kind: kind_str(registration.kind).to_owned(),
            status: status_str(registration.status).to_owned(),
            ticket: registration.ticket.to_string(),
            answers,
            item,
            fee_paid: registration.fee_paid,
            created_at: registration.created_at.to_rfc3339(),
        }
    }
}

/// One row of the caller's registration history. Event fields are absent
/// when the parent event has since been removed.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    #[serde(flatten)]
    pub registration: RegistrationResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[serde(rename = "eventType", skip_serializing_if = "Option::is_none")]
    pub event_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_organizer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_end_date: Option<String>,
}

impl From<HistoryEntry> for HistoryResponse {
    fn from(entry: HistoryEntry) -> Self {
        Self {
            registration: entry.registration.into(),
            event_name: entry.event_name,
            event_kind: entry.event_kind.map(|k| kind_str(k).to_owned()),
            event_organizer: entry.event_organizer.map(|id| id.to_string()),
            event_start_date: entry.event_start.map(|ts| ts.to_rfc3339()),
            event_end_date: entry.event_end.map(|ts| ts.to_rfc3339()),
        }
    }
}

/// Register the caller for a normal event.
#[utoipa::path(
    post,
    path = "/api/v1/events/{id}/register",
    params(("id" = String, Path, description = "Event identifier")),
    request_body = RegisterPayload,
    responses(
        (status = 201, description = "Registered", body = RegistrationResponse),
        (status = 400, description = "Not open or missing answers", body = Error),
        (status = 401, description = "Not signed in", body = Error),
        (status = 404, description = "No normal event with this id", body = Error),
        (status = 409, description = "Capacity reached", body = Error)
    ),
    tags = ["registrations"],
    operation_id = "registerForEvent"
)]
#[post("/events/{id}/register")]
pub async fn register_for_event(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<RegisterPayload>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_identity()?;
    let id = parse_event_id("id", &path.into_inner())?;
    let answers = payload.into_inner().answers.unwrap_or_default();
    let registration = state
        .registrations
        .register_normal(&actor.id, &id, answers)
        .await?;
    Ok(HttpResponse::Created().json(RegistrationResponse::from(registration)))
}

/// Purchase merchandise from a merchandise event.
#[utoipa::path(
    post,
    path = "/api/v1/events/{id}/purchase",
    params(("id" = String, Path, description = "Event identifier")),
    request_body = PurchasePayload,
    responses(
        (status = 201, description = "Purchased", body = RegistrationResponse),
        (status = 400, description = "Not open or invalid quantity", body = Error),
        (status = 401, description = "Not signed in", body = Error),
        (status = 404, description = "No merchandise event with this id", body = Error),
        (status = 409, description = "Insufficient stock", body = Error)
    ),
    tags = ["registrations"],
    operation_id = "purchaseMerch"
)]
#[post("/events/{id}/purchase")]
pub async fn purchase_merch(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<PurchasePayload>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_identity()?;
    let id = parse_event_id("id", &path.into_inner())?;
    let purchase = payload.into_inner();
    let registration = state
        .registrations
        .purchase_merch(&actor.id, &id, purchase.item_index, purchase.quantity)
        .await?;
    Ok(HttpResponse::Created().json(RegistrationResponse::from(registration)))
}

/// The caller's registration history, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/registrations/me",
    responses(
        (status = 200, description = "Registration history", body = [HistoryResponse]),
        (status = 401, description = "Not signed in", body = Error)
    ),
    tags = ["registrations"],
    operation_id = "registrationHistory"
)]
#[get("/registrations/me")]
pub async fn registration_history(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let actor = session.require_identity()?;
    let entries = state.registrations_query.history(&actor.id).await?;
    let body: Vec<HistoryResponse> = entries.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

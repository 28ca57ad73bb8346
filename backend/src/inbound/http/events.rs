//! Event HTTP handlers: listing, creation, status-gated updates, lifecycle
//! triggers, and deadline extension.
//!
//! ```text
//! GET   /api/v1/events
//! GET   /api/v1/events/{id}
//! POST  /api/v1/events
//! PATCH /api/v1/events/{id}
//! POST  /api/v1/events/{id}/publish
//! POST  /api/v1/events/{id}/ongoing
//! POST  /api/v1/events/{id}/close
//! POST  /api/v1/events/{id}/complete
//! POST  /api/v1/events/{id}/extend
//! ```

use std::str::FromStr;

use actix_web::{get, patch, post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

use crate::domain::lifecycle::{EventUpdate, Trigger};
use crate::domain::ports::{EventListFilter, ExtendRequest};
use crate::domain::{
    Error, Event, EventKind, EventStatus, FormField, MerchItem, NewEvent, Schedule,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    invalid_value_error, missing_field_error, parse_event_id, parse_timestamp, parse_user_id,
};
use crate::inbound::http::ApiResult;

/// A full event record.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub id: String,
    pub organizer: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub eligibility: String,
    pub registration_deadline: String,
    pub start_date: String,
    pub end_date: String,
    pub registration_limit: u32,
    pub registration_fee: u32,
    pub tags: Vec<String>,
    pub form_fields: Vec<FormField>,
    pub form_locked: bool,
    pub merch: Vec<MerchItem>,
    pub created_at: String,
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        Self {
            id: event.id.to_string(),
            organizer: event.organizer.to_string(),
            kind: match event.kind {
                EventKind::Normal => "normal".to_owned(),
                EventKind::Merchandise => "merchandise".to_owned(),
            },
            status: event.status.as_str().to_owned(),
            name: event.name,
            description: event.description,
            eligibility: event.eligibility,
            registration_deadline: event.schedule.registration_deadline.to_rfc3339(),
            start_date: event.schedule.start_date.to_rfc3339(),
            end_date: event.schedule.end_date.to_rfc3339(),
            registration_limit: event.registration_limit,
            registration_fee: event.registration_fee,
            tags: event.tags,
            form_fields: event.form_fields,
            form_locked: event.form_locked,
            merch: event.merch_items,
            created_at: event.created_at.to_rfc3339(),
        }
    }
}

/// Request payload for event creation.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub eligibility: Option<String>,
    pub registration_deadline: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub registration_limit: Option<u32>,
    pub registration_fee: Option<u32>,
    pub tags: Option<Vec<String>>,
    pub form_fields: Option<Vec<FormField>>,
    pub merch: Option<Vec<MerchItem>>,
}

/// Request payload for a status-gated event update. Absent fields are
/// untouched; present fields the current status disallows are dropped.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub eligibility: Option<String>,
    pub registration_deadline: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub registration_limit: Option<u32>,
    pub registration_fee: Option<u32>,
    pub tags: Option<Vec<String>>,
    pub form_fields: Option<Vec<FormField>>,
    pub merch: Option<Vec<MerchItem>>,
    pub status: Option<String>,
}

/// Request payload for extending an open event.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtendEventRequest {
    pub registration_deadline: Option<String>,
    pub registration_limit: Option<u32>,
}

/// Query parameters accepted by the event listing.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventListQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub eligibility: Option<String>,
    pub organizer: Option<String>,
    pub name: Option<String>,
    pub starts_after: Option<String>,
    pub starts_before: Option<String>,
    #[serde(default)]
    pub followed_only: bool,
    /// Include draft, closed, and completed events in the listing.
    #[serde(default)]
    pub include_inactive: bool,
}

/// The status an event landed in after a lifecycle trigger.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: String,
}

fn parse_kind(value: String) -> Result<EventKind, Error> {
    EventKind::from_str(&value)
        .map_err(|_| invalid_value_error("type", value, "type must be normal or merchandise"))
}

fn parse_status(value: String) -> Result<EventStatus, Error> {
    EventStatus::from_str(&value).map_err(|_| {
        invalid_value_error(
            "status",
            value,
            "status must be draft, published, ongoing, closed, or completed",
        )
    })
}

fn parse_create_request(payload: CreateEventRequest) -> Result<NewEvent, Error> {
    let name = payload.name.ok_or_else(|| missing_field_error("name"))?;
    let kind = payload.kind.ok_or_else(|| missing_field_error("type"))?;
    let deadline = payload
        .registration_deadline
        .ok_or_else(|| missing_field_error("registrationDeadline"))?;
    let start = payload
        .start_date
        .ok_or_else(|| missing_field_error("startDate"))?;
    let end = payload
        .end_date
        .ok_or_else(|| missing_field_error("endDate"))?;
    let registration_limit = payload
        .registration_limit
        .ok_or_else(|| missing_field_error("registrationLimit"))?;

    let schedule = Schedule::new(
        parse_timestamp("registrationDeadline", &deadline)?,
        parse_timestamp("startDate", &start)?,
        parse_timestamp("endDate", &end)?,
    )
    .map_err(|err| {
        Error::invalid_request(err.to_string())
            .with_details(serde_json::json!({ "field": "startDate" }))
    })?;

    Ok(NewEvent {
        name,
        description: payload.description,
        kind: parse_kind(kind)?,
        eligibility: payload.eligibility,
        schedule,
        registration_limit,
        registration_fee: payload.registration_fee.unwrap_or(0),
        tags: payload.tags.unwrap_or_default(),
        form_fields: payload.form_fields.unwrap_or_default(),
        merch_items: payload.merch.unwrap_or_default(),
    })
}

fn parse_update_request(payload: UpdateEventRequest) -> Result<EventUpdate, Error> {
    Ok(EventUpdate {
        name: payload.name,
        description: payload.description,
        kind: payload.kind.map(parse_kind).transpose()?,
        eligibility: payload.eligibility,
        registration_deadline: payload
            .registration_deadline
            .as_deref()
            .map(|ts| parse_timestamp("registrationDeadline", ts))
            .transpose()?,
        start_date: payload
            .start_date
            .as_deref()
            .map(|ts| parse_timestamp("startDate", ts))
            .transpose()?,
        end_date: payload
            .end_date
            .as_deref()
            .map(|ts| parse_timestamp("endDate", ts))
            .transpose()?,
        registration_limit: payload.registration_limit,
        registration_fee: payload.registration_fee,
        tags: payload.tags,
        form_fields: payload.form_fields,
        merch_items: payload.merch,
        status: payload.status.map(parse_status).transpose()?,
    })
}

fn parse_list_query(query: EventListQuery) -> Result<EventListFilter, Error> {
    Ok(EventListFilter {
        kind: query.kind.map(parse_kind).transpose()?,
        eligibility: query.eligibility,
        organizer: query
            .organizer
            .as_deref()
            .map(|raw| parse_user_id("organizer", raw))
            .transpose()?,
        name_contains: query.name,
        starts_after: query
            .starts_after
            .as_deref()
            .map(|ts| parse_timestamp("startsAfter", ts))
            .transpose()?,
        starts_before: query
            .starts_before
            .as_deref()
            .map(|ts| parse_timestamp("startsBefore", ts))
            .transpose()?,
        active_only: !query.include_inactive,
        followed_only: query.followed_only,
        organizers_in: None,
    })
}

/// List events. Signed-in callers receive the preference-ranked order;
/// anonymous callers the chronological one.
#[utoipa::path(
    get,
    path = "/api/v1/events",
    responses(
        (status = 200, description = "Events", body = [EventResponse]),
        (status = 400, description = "Invalid query", body = Error)
    ),
    tags = ["events"],
    security([]),
    operation_id = "listEvents"
)]
#[get("/events")]
pub async fn list_events(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<EventListQuery>,
) -> ApiResult<HttpResponse> {
    let viewer = session.identity()?.map(|actor| actor.id);
    let filter = parse_list_query(query.into_inner())?;
    let events = state.events_query.list(filter, viewer.as_ref()).await?;
    let body: Vec<EventResponse> = events.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// Fetch one event.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}",
    params(("id" = String, Path, description = "Event identifier")),
    responses(
        (status = 200, description = "Event", body = EventResponse),
        (status = 404, description = "No such event", body = Error)
    ),
    tags = ["events"],
    security([]),
    operation_id = "getEvent"
)]
#[get("/events/{id}")]
pub async fn get_event(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_event_id("id", &path.into_inner())?;
    let event = state.events_query.get(&id).await?;
    Ok(HttpResponse::Ok().json(EventResponse::from(event)))
}

/// Create a draft event owned by the signed-in organizer.
#[utoipa::path(
    post,
    path = "/api/v1/events",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Draft created", body = EventResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Participants cannot create events", body = Error)
    ),
    tags = ["events"],
    operation_id = "createEvent"
)]
#[post("/events")]
pub async fn create_event(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateEventRequest>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_identity()?;
    let new = parse_create_request(payload.into_inner())?;
    let id = state.events.create(&actor, new).await?;
    let event = state.events_query.get(&id).await?;
    Ok(HttpResponse::Created().json(EventResponse::from(event)))
}

/// Apply a status-gated field update to an event.
#[utoipa::path(
    patch,
    path = "/api/v1/events/{id}",
    params(("id" = String, Path, description = "Event identifier")),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Updated event", body = EventResponse),
        (status = 400, description = "Invalid request or transition", body = Error),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Not the owning organizer", body = Error),
        (status = 404, description = "No such event", body = Error)
    ),
    tags = ["events"],
    operation_id = "updateEvent"
)]
#[patch("/events/{id}")]
pub async fn update_event(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<UpdateEventRequest>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_identity()?;
    let id = parse_event_id("id", &path.into_inner())?;
    let update = parse_update_request(payload.into_inner())?;

    let summary = state.events.update(&actor, &id, update).await?;
    if !summary.dropped.is_empty() {
        let dropped: Vec<&str> = summary.dropped.iter().map(|f| f.as_str()).collect();
        debug!(event = %id, ?dropped, "update fields dropped by status permissions");
    }

    let event = state.events_query.get(&id).await?;
    Ok(HttpResponse::Ok().json(EventResponse::from(event)))
}

async fn fire_trigger(
    state: &HttpState,
    session: &SessionContext,
    raw_id: String,
    trigger: Trigger,
) -> ApiResult<HttpResponse> {
    let actor = session.require_identity()?;
    let id = parse_event_id("id", &raw_id)?;
    let status = state.events.trigger(&actor, &id, trigger).await?;
    Ok(HttpResponse::Ok().json(StatusResponse {
        status: status.as_str().to_owned(),
    }))
}

/// Publish a draft event.
#[utoipa::path(
    post,
    path = "/api/v1/events/{id}/publish",
    params(("id" = String, Path, description = "Event identifier")),
    responses(
        (status = 200, description = "Now published", body = StatusResponse),
        (status = 400, description = "Transition not permitted", body = Error),
        (status = 403, description = "Not the owning organizer", body = Error),
        (status = 404, description = "No such event", body = Error)
    ),
    tags = ["events"],
    operation_id = "publishEvent"
)]
#[post("/events/{id}/publish")]
pub async fn publish_event(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    fire_trigger(&state, &session, path.into_inner(), Trigger::Publish).await
}

/// Mark a published event as running.
#[utoipa::path(
    post,
    path = "/api/v1/events/{id}/ongoing",
    params(("id" = String, Path, description = "Event identifier")),
    responses(
        (status = 200, description = "Now ongoing", body = StatusResponse),
        (status = 400, description = "Transition not permitted", body = Error),
        (status = 403, description = "Not the owning organizer", body = Error),
        (status = 404, description = "No such event", body = Error)
    ),
    tags = ["events"],
    operation_id = "setEventOngoing"
)]
#[post("/events/{id}/ongoing")]
pub async fn set_event_ongoing(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    fire_trigger(&state, &session, path.into_inner(), Trigger::SetOngoing).await
}

/// Close registrations for an event.
#[utoipa::path(
    post,
    path = "/api/v1/events/{id}/close",
    params(("id" = String, Path, description = "Event identifier")),
    responses(
        (status = 200, description = "Now closed", body = StatusResponse),
        (status = 400, description = "Transition not permitted", body = Error),
        (status = 403, description = "Not the owning organizer", body = Error),
        (status = 404, description = "No such event", body = Error)
    ),
    tags = ["events"],
    operation_id = "closeEvent"
)]
#[post("/events/{id}/close")]
pub async fn close_event(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    fire_trigger(&state, &session, path.into_inner(), Trigger::Close).await
}

/// Mark an event as completed.
#[utoipa::path(
    post,
    path = "/api/v1/events/{id}/complete",
    params(("id" = String, Path, description = "Event identifier")),
    responses(
        (status = 200, description = "Now completed", body = StatusResponse),
        (status = 400, description = "Transition not permitted", body = Error),
        (status = 403, description = "Not the owning organizer", body = Error),
        (status = 404, description = "No such event", body = Error)
    ),
    tags = ["events"],
    operation_id = "completeEvent"
)]
#[post("/events/{id}/complete")]
pub async fn complete_event(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    fire_trigger(&state, &session, path.into_inner(), Trigger::SetCompleted).await
}

/// Push the registration deadline later and/or raise the limit.
#[utoipa::path(
    post,
    path = "/api/v1/events/{id}/extend",
    params(("id" = String, Path, description = "Event identifier")),
    request_body = ExtendEventRequest,
    responses(
        (status = 200, description = "Updated event", body = EventResponse),
        (status = 400, description = "Invalid extension", body = Error),
        (status = 403, description = "Not the owning organizer", body = Error),
        (status = 404, description = "No such event", body = Error)
    ),
    tags = ["events"],
    operation_id = "extendEvent"
)]
#[post("/events/{id}/extend")]
pub async fn extend_event(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<ExtendEventRequest>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_identity()?;
    let id = parse_event_id("id", &path.into_inner())?;
    let payload = payload.into_inner();
    let request = ExtendRequest {
        registration_deadline: payload
            .registration_deadline
            .as_deref()
            .map(|ts| parse_timestamp("registrationDeadline", ts))
            .transpose()?,
        registration_limit: payload.registration_limit,
    };

    state.events.extend(&actor, &id, request).await?;
    let event = state.events_query.get(&id).await?;
    Ok(HttpResponse::Ok().json(EventResponse::from(event)))
}

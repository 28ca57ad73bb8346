//! Event domain services: creation, status-gated updates, lifecycle
//! triggers, deadline extension, and the public listing with
//! preference-based ranking.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use crate::domain::lifecycle::{self, EventUpdate, ExtendError, Trigger, UpdateError};
use crate::domain::ports::{
    Actor, EventListFilter, EventPersistenceError, EventRepository, EventUpdateSummary,
    EventsCommand, EventsQuery, ExtendRequest, UserPersistenceError, UserRepository,
};
use crate::domain::{
    ranking, Error, Event, EventId, EventStatus, EventValidationError, NewEvent, Role, UserId,
};

/// Event service implementing the events command and query ports.
#[derive(Clone)]
pub struct EventService<E, U> {
    events: Arc<E>,
    users: Arc<U>,
}

impl<E, U> EventService<E, U> {
    /// Create a new service over the event and user repositories.
    pub fn new(events: Arc<E>, users: Arc<U>) -> Self {
        Self { events, users }
    }
}

impl<E, U> EventService<E, U>
where
    E: EventRepository,
    U: UserRepository,
{
    fn map_event_error(error: EventPersistenceError) -> Error {
        match error {
            EventPersistenceError::Connection { message } => {
                Error::service_unavailable(format!("event repository unavailable: {message}"))
            }
            EventPersistenceError::Query { message } => {
                Error::internal(format!("event repository error: {message}"))
            }
        }
    }

    fn map_user_error(error: UserPersistenceError) -> Error {
        match error {
            UserPersistenceError::Connection { message } => {
                Error::service_unavailable(format!("user repository unavailable: {message}"))
            }
            UserPersistenceError::Query { message } => {
                Error::internal(format!("user repository error: {message}"))
            }
            UserPersistenceError::DuplicateEmail { email } => {
                Error::internal(format!("unexpected email conflict: {email}"))
            }
        }
    }

    fn map_validation_error(error: EventValidationError) -> Error {
        let field = match &error {
            EventValidationError::EmptyName => "name",
            EventValidationError::StartNotBeforeEnd => "startDate",
            EventValidationError::ZeroRegistrationLimit => "registrationLimit",
            EventValidationError::ZeroPurchaseLimit => "merch",
            EventValidationError::UnknownKind { .. } => "type",
            EventValidationError::UnknownStatus { .. } => "status",
        };
        Error::invalid_request(error.to_string()).with_details(json!({ "field": field }))
    }

    fn map_update_error(error: UpdateError) -> Error {
        match error {
            UpdateError::FormSchemaLocked => {
                Error::invalid_request("form fields can only be edited while the event is a draft")
                    .with_details(json!({
                        "field": "formFields",
                        "code": "form_locked",
                    }))
            }
            UpdateError::Transition(err) => Error::invalid_transition(err.to_string()),
            err @ UpdateError::UnreachableStatus { .. } => {
                Error::invalid_transition(err.to_string())
            }
            UpdateError::Validation(err) => Self::map_validation_error(err),
        }
    }

    fn map_extend_error(error: ExtendError) -> Error {
        match error {
            ExtendError::NotExtensible { .. } => Error::invalid_transition(error.to_string()),
            ExtendError::DeadlineNotFuture
            | ExtendError::DeadlineMovedBackward
            | ExtendError::LimitLowered => Error::invalid_request(error.to_string()),
        }
    }

    async fn fetch(&self, id: &EventId) -> Result<Event, Error> {
        self.events
            .find_by_id(id)
            .await
            .map_err(Self::map_event_error)?
            .ok_or_else(|| Error::not_found("event not found"))
    }

    async fn fetch_owned(&self, actor: &Actor, id: &EventId) -> Result<Event, Error> {
        let event = self.fetch(id).await?;
        if !actor.owns_or_admin(&event.organizer) {
            return Err(Error::forbidden("you do not manage this event"));
        }
        Ok(event)
    }
}

#[async_trait]
impl<E, U> EventsCommand for EventService<E, U>
where
    E: EventRepository,
    U: UserRepository,
{
    async fn create(&self, actor: &Actor, new: NewEvent) -> Result<EventId, Error> {
        if actor.role == Role::Participant {
            return Err(Error::forbidden("only organizers may create events"));
        }

        let event =
            Event::create(actor.id.clone(), new).map_err(Self::map_validation_error)?;
        self.events
            .insert(&event)
            .await
            .map_err(Self::map_event_error)?;
        Ok(event.id)
    }

    async fn update(
        &self,
        actor: &Actor,
        event: &EventId,
        update: EventUpdate,
    ) -> Result<EventUpdateSummary, Error> {
        let mut record = self.fetch_owned(actor, event).await?;
        let outcome =
            lifecycle::apply_update(&mut record, update).map_err(Self::map_update_error)?;
        self.events
            .update(&record)
            .await
            .map_err(Self::map_event_error)?;
        Ok(EventUpdateSummary {
            status: record.status,
            dropped: outcome.dropped,
        })
    }

    async fn trigger(
        &self,
        actor: &Actor,
        event: &EventId,
        trigger: Trigger,
    ) -> Result<EventStatus, Error> {
        let mut record = self.fetch_owned(actor, event).await?;
        record.status = lifecycle::transition(record.status, trigger)
            .map_err(|err| Error::invalid_transition(err.to_string()))?;
        self.events
            .update(&record)
            .await
            .map_err(Self::map_event_error)?;
        Ok(record.status)
    }

    async fn extend(
        &self,
        actor: &Actor,
        event: &EventId,
        request: ExtendRequest,
    ) -> Result<(), Error> {
        let mut record = self.fetch_owned(actor, event).await?;
        lifecycle::extend(
            &mut record,
            request.registration_deadline,
            request.registration_limit,
            Utc::now(),
        )
        .map_err(Self::map_extend_error)?;
        self.events
            .update(&record)
            .await
            .map_err(Self::map_event_error)
    }
}

#[async_trait]
impl<E, U> EventsQuery for EventService<E, U>
where
    E: EventRepository,
    U: UserRepository,
{
    async fn get(&self, event: &EventId) -> Result<Event, Error> {
        self.fetch(event).await
    }

    async fn list(
        &self,
        mut filter: EventListFilter,
        viewer: Option<&UserId>,
    ) -> Result<Vec<Event>, Error> {
        let preferences = match viewer {
            Some(id) => self
                .users
                .find_by_id(id)
                .await
                .map_err(Self::map_user_error)?
                .map(|user| user.preferences),
            None => None,
        };

        if filter.followed_only {
            let Some(preferences) = preferences.as_ref() else {
                return Err(Error::unauthorized(
                    "sign in to filter by followed organizers",
                ));
            };
            if preferences.followed_organizers.is_empty() {
                return Ok(Vec::new());
            }
            filter.organizers_in = Some(preferences.followed_organizers.clone());
        }

        let events = self
            .events
            .list(&filter)
            .await
            .map_err(Self::map_event_error)?;

        Ok(match preferences {
            Some(preferences) => ranking::rank(events, &preferences),
            None => ranking::chronological(events),
        })
    }
}

//! Registration domain services: enrollment, merchandise purchase, and the
//! participant history view.
//!
//! The capacity and stock checks live inside the ledger's conditional
//! inserts; this service owns the request-level guards that run before the
//! ledger is touched (event existence, kind, deadline, window, and the
//! per-transaction purchase limit).

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tracing::warn;

use crate::domain::ports::{
    EventPersistenceError, EventRepository, HistoryEntry, LedgerError, MerchPurchase,
    RegistrationLedger, RegistrationsCommand, RegistrationsQuery,
};
use crate::domain::{Error, Event, EventId, EventKind, Registration, UserId};

/// Registration service implementing the registrations command and query
/// ports.
#[derive(Clone)]
pub struct RegistrationService<E, L> {
    events: Arc<E>,
    ledger: Arc<L>,
}

impl<E, L> RegistrationService<E, L> {
    /// Create a new service over the event repository and the ledger.
    pub fn new(events: Arc<E>, ledger: Arc<L>) -> Self {
        Self { events, ledger }
    }
}

impl<E, L> RegistrationService<E, L>
where
    E: EventRepository,
    L: RegistrationLedger,
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

    fn map_ledger_error(error: LedgerError) -> Error {
        match error {
            LedgerError::Connection { message } => {
                Error::service_unavailable(format!("registration ledger unavailable: {message}"))
            }
            LedgerError::Query { message } => {
                Error::internal(format!("registration ledger error: {message}"))
            }
            LedgerError::CapacityExhausted { limit } => {
                Error::conflict("event has reached its registration limit").with_details(json!({
                    "registrationLimit": limit,
                }))
            }
            LedgerError::StockExhausted { available } => {
                Error::conflict("not enough stock remaining").with_details(json!({
                    "available": available,
                }))
            }
            LedgerError::InvalidItem { index } => {
                Error::invalid_request("no merchandise item at the requested index").with_details(
                    json!({
                        "field": "itemIndex",
                        "index": index,
                    }),
                )
            }
            LedgerError::DuplicateTicket { ticket } => {
                Error::internal(format!("ticket collision: {ticket}"))
            }
        }
    }

    async fn fetch_open(&self, id: &EventId, kind: EventKind) -> Result<Event, Error> {
        let event = self
            .events
            .find_by_id(id)
            .await
            .map_err(Self::map_event_error)?
            .ok_or_else(|| Error::not_found("event not found"))?;

        // An event of the other kind does not exist as far as this
        // endpoint is concerned.
        if event.kind != kind {
            return Err(Error::not_found("event not found"));
        }
        if Utc::now() > event.schedule.registration_deadline {
            return Err(Error::invalid_request("the registration deadline has passed"));
        }
        if !event.status.accepts_registrations() {
            return Err(
                Error::invalid_request("registrations are not open for this event").with_details(
                    json!({
                        "status": event.status.as_str(),
                    }),
                ),
            );
        }
        Ok(event)
    }

    fn check_answers(event: &Event, answers: &BTreeMap<String, String>) -> Result<(), Error> {
        for field in event.form_fields.iter().filter(|field| field.required) {
            let missing = answers
                .get(&field.label)
                .map_or(true, |value| value.trim().is_empty());
            if missing {
                return Err(
                    Error::invalid_request("a required form field is missing an answer")
                        .with_details(json!({
                            "field": field.label,
                            "code": "missing_answer",
                        })),
                );
            }
        }
        Ok(())
    }

    /// First successful registration freezes the form schema. The record is
    /// already committed at this point, so a lock failure is logged rather
    /// than surfaced.
    async fn freeze_form(&self, event: &Event) {
        if event.form_locked {
            return;
        }
        if let Err(err) = self.events.lock_form(&event.id).await {
            warn!(event = %event.id, error = %err, "failed to lock form schema");
        }
    }
}

#[async_trait]
impl<E, L> RegistrationsCommand for RegistrationService<E, L>
where
    E: EventRepository,
    L: RegistrationLedger,
{
    async fn register_normal(
        &self,
        caller: &UserId,
        event: &EventId,
        answers: BTreeMap<String, String>,
    ) -> Result<Registration, Error> {
        let record = self.fetch_open(event, EventKind::Normal).await?;
        Self::check_answers(&record, &answers)?;

        let registration = Registration::normal(
            record.id.clone(),
            caller.clone(),
            answers,
            record.registration_fee,
        );
        let registration = self
            .ledger
            .insert_normal(registration, record.registration_limit)
            .await
            .map_err(Self::map_ledger_error)?;

        self.freeze_form(&record).await;
        Ok(registration)
    }

    async fn purchase_merch(
        &self,
        caller: &UserId,
        event: &EventId,
        item_index: usize,
        quantity: u32,
    ) -> Result<Registration, Error> {
        if quantity == 0 {
            return Err(
                Error::invalid_request("quantity must be at least 1").with_details(json!({
                    "field": "quantity",
                })),
            );
        }

        let record = self.fetch_open(event, EventKind::Merchandise).await?;
        let Some(item) = record.merch_item(item_index) else {
            return Err(Self::map_ledger_error(LedgerError::InvalidItem {
                index: item_index,
            }));
        };
        // Exhausted stock answers before the limit check; the ledger
        // re-checks it atomically at insert time.
        if quantity > item.stock {
            return Err(Self::map_ledger_error(LedgerError::StockExhausted {
                available: item.stock,
            }));
        }
        // Limit enforcement is per transaction: a caller may repeat the
        // purchase in later requests.
        if quantity > item.purchase_limit_per_participant {
            return Err(
                Error::invalid_request("quantity exceeds the per-participant purchase limit")
                    .with_details(json!({
                        "field": "quantity",
                        "purchaseLimitPerParticipant": item.purchase_limit_per_participant,
                    })),
            );
        }

        self.ledger
            .insert_merch(MerchPurchase {
                event: record.id.clone(),
                user: caller.clone(),
                item_index,
                quantity,
                // The fee is flat per registration, not per unit.
                fee_paid: record.registration_fee,
            })
            .await
            .map_err(Self::map_ledger_error)
    }
}

#[async_trait]
impl<E, L> RegistrationsQuery for RegistrationService<E, L>
where
    E: EventRepository,
    L: RegistrationLedger,
{
    async fn history(&self, caller: &UserId) -> Result<Vec<HistoryEntry>, Error> {
        let registrations = self
            .ledger
            .find_by_user(caller)
            .await
            .map_err(Self::map_ledger_error)?;

        let mut entries = Vec::with_capacity(registrations.len());
        for registration in registrations {
            let event = self
                .events
                .find_by_id(&registration.event)
                .await
                .map_err(Self::map_event_error)?;
            entries.push(match event {
                Some(event) => HistoryEntry {
                    registration,
                    event_name: Some(event.name),
                    event_kind: Some(event.kind),
                    event_organizer: Some(event.organizer),
                    event_start: Some(event.schedule.start_date),
                    event_end: Some(event.schedule.end_date),
                },
                // Parent event deleted since; keep the receipt either way.
                None => HistoryEntry {
                    registration,
                    event_name: None,
                    event_kind: None,
                    event_organizer: None,
                    event_start: None,
                    event_end: None,
                },
            });
        }
        Ok(entries)
    }
}

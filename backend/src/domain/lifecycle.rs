//! Event lifecycle: the status transition table, the status-keyed
//! allowed-field lookup, and update application.
//!
//! The transition table and field permissions are explicit data rather than
//! scattered conditionals, so the silent-drop-vs-hard-error asymmetry of
//! update handling stays auditable in one place:
//!
//! ```text
//! draft ──publish──▶ published ──setOngoing──▶ ongoing
//!                        │                        │
//!                        └───────close──▶ closed  ├─setCompleted─▶ completed
//!                                           └─────┘
//! ```

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::event::{
    Event, EventKind, EventStatus, EventValidationError, FormField, MerchItem, Schedule,
};

/// Lifecycle trigger names, one per dedicated transition endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    Publish,
    Close,
    SetOngoing,
    SetCompleted,
}

impl Trigger {
    /// Allowed source states and the resulting state for this trigger.
    const fn edge(self) -> (&'static [EventStatus], EventStatus) {
        match self {
            Self::Publish => (&[EventStatus::Draft], EventStatus::Published),
            Self::Close => (
                &[EventStatus::Published, EventStatus::Ongoing],
                EventStatus::Closed,
            ),
            Self::SetOngoing => (&[EventStatus::Published], EventStatus::Ongoing),
            Self::SetCompleted => (
                &[EventStatus::Ongoing, EventStatus::Closed],
                EventStatus::Completed,
            ),
        }
    }

    /// The trigger that would move an event into `target`, if any.
    /// No trigger re-enters draft.
    pub fn for_target(target: EventStatus) -> Option<Self> {
        match target {
            EventStatus::Draft => None,
            EventStatus::Published => Some(Self::Publish),
            EventStatus::Ongoing => Some(Self::SetOngoing),
            EventStatus::Closed => Some(Self::Close),
            EventStatus::Completed => Some(Self::SetCompleted),
        }
    }

    /// Trigger name used in error details.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Publish => "publish",
            Self::Close => "close",
            Self::SetOngoing => "setOngoing",
            Self::SetCompleted => "setCompleted",
        }
    }
}

/// A transition attempted from a state outside the trigger's source set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {trigger} an event in status {from}", trigger = trigger.as_str(), from = from.as_str())]
pub struct InvalidTransition {
    pub from: EventStatus,
    pub trigger: Trigger,
}

/// Apply a trigger to the current status. The event is untouched on error.
pub fn transition(from: EventStatus, trigger: Trigger) -> Result<EventStatus, InvalidTransition> {
    let (sources, target) = trigger.edge();
    if sources.contains(&from) {
        Ok(target)
    } else {
        Err(InvalidTransition { from, trigger })
    }
}

/// Field tags for the status-keyed mutability table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventField {
    Name,
    Description,
    Kind,
    Eligibility,
    RegistrationDeadline,
    StartDate,
    EndDate,
    RegistrationLimit,
    RegistrationFee,
    Tags,
    FormFields,
    MerchItems,
    Status,
}

impl EventField {
    /// Wire name reported when an update silently drops the field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Description => "description",
            Self::Kind => "type",
            Self::Eligibility => "eligibility",
            Self::RegistrationDeadline => "registrationDeadline",
            Self::StartDate => "startDate",
            Self::EndDate => "endDate",
            Self::RegistrationLimit => "registrationLimit",
            Self::RegistrationFee => "registrationFee",
            Self::Tags => "tags",
            Self::FormFields => "formFields",
            Self::MerchItems => "merch",
            Self::Status => "status",
        }
    }
}

const DRAFT_FIELDS: &[EventField] = &[
    EventField::Name,
    EventField::Description,
    EventField::Kind,
    EventField::Eligibility,
    EventField::RegistrationDeadline,
    EventField::StartDate,
    EventField::EndDate,
    EventField::RegistrationLimit,
    EventField::RegistrationFee,
    EventField::Tags,
    EventField::FormFields,
    EventField::MerchItems,
    EventField::Status,
];

const PUBLISHED_FIELDS: &[EventField] = &[
    EventField::Description,
    EventField::RegistrationDeadline,
    EventField::RegistrationLimit,
    EventField::Status,
];

const STATUS_ONLY: &[EventField] = &[EventField::Status];

/// Fields an update may touch while the event sits in `status`.
pub fn allowed_fields(status: EventStatus) -> &'static [EventField] {
    match status {
        EventStatus::Draft => DRAFT_FIELDS,
        EventStatus::Published => PUBLISHED_FIELDS,
        EventStatus::Ongoing | EventStatus::Closed | EventStatus::Completed => STATUS_ONLY,
    }
}

/// Allow-listed update payload; absent fields are untouched.
#[derive(Debug, Clone, Default)]
pub struct EventUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub kind: Option<EventKind>,
    pub eligibility: Option<String>,
    pub registration_deadline: Option<DateTime<Utc>>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub registration_limit: Option<u32>,
    pub registration_fee: Option<u32>,
    pub tags: Option<Vec<String>>,
    pub form_fields: Option<Vec<FormField>>,
    pub merch_items: Option<Vec<MerchItem>>,
    pub status: Option<EventStatus>,
}

impl EventUpdate {
    fn requested_fields(&self) -> Vec<EventField> {
        let mut fields = Vec::new();
        let mut push = |present: bool, field: EventField| {
            if present {
                fields.push(field);
            }
        };
        push(self.name.is_some(), EventField::Name);
        push(self.description.is_some(), EventField::Description);
        push(self.kind.is_some(), EventField::Kind);
        push(self.eligibility.is_some(), EventField::Eligibility);
        push(
            self.registration_deadline.is_some(),
            EventField::RegistrationDeadline,
        );
        push(self.start_date.is_some(), EventField::StartDate);
        push(self.end_date.is_some(), EventField::EndDate);
        push(
            self.registration_limit.is_some(),
            EventField::RegistrationLimit,
        );
        push(self.registration_fee.is_some(), EventField::RegistrationFee);
        push(self.tags.is_some(), EventField::Tags);
        push(self.form_fields.is_some(), EventField::FormFields);
        push(self.merch_items.is_some(), EventField::MerchItems);
        push(self.status.is_some(), EventField::Status);
        fields
    }
}

/// Failures raised while applying an update.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpdateError {
    /// Form-schema edits are a hard error outside draft or once locked,
    /// distinct from the generic silent field drop.
    #[error("form fields are locked after publish or first registration")]
    FormSchemaLocked,
    /// A lifecycle transition embedded in the update was rejected.
    #[error(transparent)]
    Transition(#[from] InvalidTransition),
    /// No trigger re-enters the requested status (draft).
    #[error("no transition leads to status {target}", target = target.as_str())]
    UnreachableStatus { target: EventStatus },
    /// Field-level validation failed on the applied set.
    #[error(transparent)]
    Validation(#[from] EventValidationError),
}

/// Result of a successful update: which fields were applied and which were
/// silently dropped by the status table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateOutcome {
    pub applied: Vec<EventField>,
    pub dropped: Vec<EventField>,
}

/// Apply `update` to `event` under the current status's field permissions.
///
/// Disallowed fields are dropped silently and reported in the outcome.
/// Form-schema edits outside draft (or after the lock flipped) fail hard.
/// A status change is routed through [`transition`]; the event is left
/// unchanged on any error.
pub fn apply_update(event: &mut Event, update: EventUpdate) -> Result<UpdateOutcome, UpdateError> {
    let allowed = allowed_fields(event.status);
    let mut outcome = UpdateOutcome::default();
    for field in update.requested_fields() {
        if allowed.contains(&field) {
            outcome.applied.push(field);
        } else {
            outcome.dropped.push(field);
        }
    }

    // Hard error, not a silent drop: schema edits signal organizer intent to
    // bypass the freeze.
    if update.form_fields.is_some() && (event.status != EventStatus::Draft || event.form_locked) {
        return Err(UpdateError::FormSchemaLocked);
    }

    // Validate the merged schedule before mutating anything.
    let applies = |field: EventField| outcome.applied.contains(&field);
    let next_start = update
        .start_date
        .filter(|_| applies(EventField::StartDate))
        .unwrap_or(event.schedule.start_date);
    let next_end = update
        .end_date
        .filter(|_| applies(EventField::EndDate))
        .unwrap_or(event.schedule.end_date);
    let next_deadline = update
        .registration_deadline
        .filter(|_| applies(EventField::RegistrationDeadline))
        .unwrap_or(event.schedule.registration_deadline);
    let next_schedule = Schedule::new(next_deadline, next_start, next_end)?;

    if let Some(limit) = update.registration_limit.filter(|_| applies(EventField::RegistrationLimit)) {
        if limit == 0 {
            return Err(EventValidationError::ZeroRegistrationLimit.into());
        }
    }
    if let Some(name) = update.name.as_deref().filter(|_| applies(EventField::Name)) {
        if name.trim().is_empty() {
            return Err(EventValidationError::EmptyName.into());
        }
    }

    let next_status = match update.status.filter(|_| applies(EventField::Status)) {
        Some(target) if target == event.status => None,
        Some(target) => {
            let trigger = Trigger::for_target(target)
                .ok_or(UpdateError::UnreachableStatus { target })?;
            Some(transition(event.status, trigger)?)
        }
        None => None,
    };

    // All checks passed; mutate.
    event.schedule = next_schedule;
    if applies(EventField::Name) {
        if let Some(name) = update.name {
            event.name = name;
        }
    }
    if applies(EventField::Description) {
        event.description = update.description;
    }
    if applies(EventField::Kind) {
        if let Some(kind) = update.kind {
            event.kind = kind;
        }
    }
    if applies(EventField::Eligibility) {
        if let Some(eligibility) = update.eligibility {
            event.eligibility = eligibility;
        }
    }
    if applies(EventField::RegistrationLimit) {
        if let Some(limit) = update.registration_limit {
            event.registration_limit = limit;
        }
    }
    if applies(EventField::RegistrationFee) {
        if let Some(fee) = update.registration_fee {
            event.registration_fee = fee;
        }
    }
    if applies(EventField::Tags) {
        if let Some(tags) = update.tags {
            event.tags = tags;
        }
    }
    if applies(EventField::FormFields) {
        if let Some(fields) = update.form_fields {
            event.form_fields = fields;
        }
    }
    if applies(EventField::MerchItems) {
        if let Some(items) = update.merch_items {
            event.merch_items = items;
        }
    }
    if let Some(status) = next_status {
        event.status = status;
    }

    Ok(outcome)
}

/// Failures raised by [`extend`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtendError {
    /// Extension is only permitted while registrations are open.
    #[error("cannot extend an event in status {status}", status = status.as_str())]
    NotExtensible { status: EventStatus },
    /// The new deadline must sit strictly in the future.
    #[error("new registrationDeadline must be in the future")]
    DeadlineNotFuture,
    /// The deadline may only move later, never earlier.
    #[error("registrationDeadline may only be extended, not shortened")]
    DeadlineMovedBackward,
    /// The registration limit may only be raised.
    #[error("registrationLimit may only be raised, never lowered")]
    LimitLowered,
}

/// Extend an open event: push the registration deadline later and/or raise
/// the registration limit. Both arguments optional; the event is unchanged
/// on error.
pub fn extend(
    event: &mut Event,
    new_deadline: Option<DateTime<Utc>>,
    new_limit: Option<u32>,
    now: DateTime<Utc>,
) -> Result<(), ExtendError> {
    if !event.status.accepts_registrations() {
        return Err(ExtendError::NotExtensible {
            status: event.status,
        });
    }
    if let Some(deadline) = new_deadline {
        if deadline <= now {
            return Err(ExtendError::DeadlineNotFuture);
        }
        if deadline < event.schedule.registration_deadline {
            return Err(ExtendError::DeadlineMovedBackward);
        }
    }
    if let Some(limit) = new_limit {
        if limit < event.registration_limit {
            return Err(ExtendError::LimitLowered);
        }
    }

    if let Some(deadline) = new_deadline {
        event.schedule.registration_deadline = deadline;
    }
    if let Some(limit) = new_limit {
        event.registration_limit = limit;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::{Event, EventKind, NewEvent};
    use crate::domain::user::UserId;
    use chrono::{Duration, TimeZone, Utc};
    use rstest::{fixture, rstest};

    const ALL_STATUSES: [EventStatus; 5] = [
        EventStatus::Draft,
        EventStatus::Published,
        EventStatus::Ongoing,
        EventStatus::Closed,
        EventStatus::Completed,
    ];
    const ALL_TRIGGERS: [Trigger; 4] = [
        Trigger::Publish,
        Trigger::Close,
        Trigger::SetOngoing,
        Trigger::SetCompleted,
    ];

    #[fixture]
    fn event() -> Event {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).single().expect("ts");
        let schedule =
            Schedule::new(start - Duration::days(7), start, start + Duration::days(1))
                .expect("schedule");
        Event::create(
            UserId::random(),
            NewEvent {
                name: "Hack Night".into(),
                description: Some("overnight build session".into()),
                kind: EventKind::Normal,
                eligibility: None,
                schedule,
                registration_limit: 10,
                registration_fee: 50,
                tags: vec!["coding".into()],
                form_fields: vec![FormField {
                    label: "Team name".into(),
                    kind: crate::domain::event::InputKind::Text,
                    required: true,
                    options: Vec::new(),
                }],
                merch_items: Vec::new(),
            },
        )
        .expect("event")
    }

    #[rstest]
    #[case(EventStatus::Draft, Trigger::Publish, EventStatus::Published)]
    #[case(EventStatus::Published, Trigger::Close, EventStatus::Closed)]
    #[case(EventStatus::Ongoing, Trigger::Close, EventStatus::Closed)]
    #[case(EventStatus::Published, Trigger::SetOngoing, EventStatus::Ongoing)]
    #[case(EventStatus::Ongoing, Trigger::SetCompleted, EventStatus::Completed)]
    #[case(EventStatus::Closed, Trigger::SetCompleted, EventStatus::Completed)]
    fn allowed_edges(
        #[case] from: EventStatus,
        #[case] trigger: Trigger,
        #[case] expected: EventStatus,
    ) {
        assert_eq!(transition(from, trigger).expect("allowed"), expected);
    }

    #[rstest]
    fn every_edge_outside_the_table_is_rejected() {
        let allowed: &[(EventStatus, Trigger)] = &[
            (EventStatus::Draft, Trigger::Publish),
            (EventStatus::Published, Trigger::Close),
            (EventStatus::Ongoing, Trigger::Close),
            (EventStatus::Published, Trigger::SetOngoing),
            (EventStatus::Ongoing, Trigger::SetCompleted),
            (EventStatus::Closed, Trigger::SetCompleted),
        ];
        for from in ALL_STATUSES {
            for trigger in ALL_TRIGGERS {
                let expected_ok = allowed.contains(&(from, trigger));
                assert_eq!(
                    transition(from, trigger).is_ok(),
                    expected_ok,
                    "{from:?} x {trigger:?}"
                );
            }
        }
    }

    #[rstest]
    fn completed_is_terminal() {
        for trigger in ALL_TRIGGERS {
            let err = transition(EventStatus::Completed, trigger).expect_err("terminal");
            assert_eq!(err.from, EventStatus::Completed);
        }
    }

    #[rstest]
    fn published_update_drops_disallowed_fields(mut event: Event) {
        event.status = EventStatus::Published;
        let original_name = event.name.clone();
        let outcome = apply_update(
            &mut event,
            EventUpdate {
                name: Some("renamed".into()),
                description: Some("new blurb".into()),
                registration_limit: Some(20),
                ..EventUpdate::default()
            },
        )
        .expect("update succeeds");

        assert_eq!(event.name, original_name, "name silently dropped");
        assert_eq!(event.description.as_deref(), Some("new blurb"));
        assert_eq!(event.registration_limit, 20);
        assert_eq!(outcome.dropped, vec![EventField::Name]);
        assert!(outcome.applied.contains(&EventField::Description));
    }

    #[rstest]
    #[case(EventStatus::Ongoing)]
    #[case(EventStatus::Closed)]
    #[case(EventStatus::Completed)]
    fn late_statuses_accept_only_status(#[case] status: EventStatus, mut event: Event) {
        event.status = status;
        let outcome = apply_update(
            &mut event,
            EventUpdate {
                description: Some("ignored".into()),
                registration_limit: Some(99),
                ..EventUpdate::default()
            },
        )
        .expect("silent drop is a success");
        assert!(outcome.applied.is_empty());
        assert_eq!(event.registration_limit, 10);
    }

    #[rstest]
    fn form_schema_edit_outside_draft_is_a_hard_error(mut event: Event) {
        event.status = EventStatus::Published;
        let err = apply_update(
            &mut event,
            EventUpdate {
                form_fields: Some(Vec::new()),
                ..EventUpdate::default()
            },
        )
        .expect_err("hard error, not a drop");
        assert_eq!(err, UpdateError::FormSchemaLocked);
        assert_eq!(event.form_fields.len(), 1, "event unchanged");
    }

    #[rstest]
    fn form_schema_edit_after_lock_is_rejected_even_in_draft(mut event: Event) {
        event.lock_form();
        let err = apply_update(
            &mut event,
            EventUpdate {
                form_fields: Some(Vec::new()),
                ..EventUpdate::default()
            },
        )
        .expect_err("locked");
        assert_eq!(err, UpdateError::FormSchemaLocked);
    }

    #[rstest]
    fn merged_schedule_is_revalidated(mut event: Event) {
        let inverted_start = event.schedule.end_date + Duration::days(1);
        let err = apply_update(
            &mut event,
            EventUpdate {
                start_date: Some(inverted_start),
                ..EventUpdate::default()
            },
        )
        .expect_err("inverted schedule");
        assert_eq!(
            err,
            UpdateError::Validation(EventValidationError::StartNotBeforeEnd)
        );
    }

    #[rstest]
    fn update_routes_status_through_the_transition_table(mut event: Event) {
        apply_update(
            &mut event,
            EventUpdate {
                status: Some(EventStatus::Published),
                ..EventUpdate::default()
            },
        )
        .expect("draft -> published");
        assert_eq!(event.status, EventStatus::Published);

        let err = apply_update(
            &mut event,
            EventUpdate {
                status: Some(EventStatus::Completed),
                ..EventUpdate::default()
            },
        )
        .expect_err("published -> completed skips a state");
        assert!(matches!(err, UpdateError::Transition(_)));
        assert_eq!(event.status, EventStatus::Published, "unchanged on error");
    }

    #[rstest]
    fn no_update_reenters_draft(mut event: Event) {
        event.status = EventStatus::Published;
        let err = apply_update(
            &mut event,
            EventUpdate {
                status: Some(EventStatus::Draft),
                ..EventUpdate::default()
            },
        )
        .expect_err("draft unreachable");
        assert_eq!(
            err,
            UpdateError::UnreachableStatus {
                target: EventStatus::Draft
            }
        );
    }

    #[rstest]
    fn extend_pushes_deadline_and_raises_limit(mut event: Event) {
        event.status = EventStatus::Published;
        let now = event.schedule.registration_deadline - Duration::days(1);
        let later = event.schedule.registration_deadline + Duration::days(3);
        extend(&mut event, Some(later), Some(25), now).expect("extends");
        assert_eq!(event.schedule.registration_deadline, later);
        assert_eq!(event.registration_limit, 25);
    }

    #[rstest]
    fn extend_rejects_lowering_the_limit(mut event: Event) {
        event.status = EventStatus::Published;
        let now = event.schedule.registration_deadline - Duration::days(1);
        let err = extend(&mut event, None, Some(5), now).expect_err("lowering rejected");
        assert_eq!(err, ExtendError::LimitLowered);
        assert_eq!(event.registration_limit, 10);
    }

    #[rstest]
    fn extend_rejects_past_deadlines(mut event: Event) {
        event.status = EventStatus::Ongoing;
        let now = event.schedule.registration_deadline + Duration::days(1);
        let past_deadline = event.schedule.registration_deadline;
        let err = extend(&mut event, Some(past_deadline), None, now)
        .expect_err("must be future");
        assert_eq!(err, ExtendError::DeadlineNotFuture);
    }

    #[rstest]
    #[case(EventStatus::Draft)]
    #[case(EventStatus::Closed)]
    #[case(EventStatus::Completed)]
    fn extend_requires_an_open_event(#[case] status: EventStatus, mut event: Event) {
        event.status = status;
        let now = Utc::now();
        let err = extend(&mut event, None, Some(50), now).expect_err("closed to extension");
        assert_eq!(err, ExtendError::NotExtensible { status });
    }
}

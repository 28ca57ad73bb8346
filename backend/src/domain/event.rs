//! Event aggregate: one event's lifecycle state, schedule, registration
//! form schema, and (for merchandise events) inventory.
//!
//! The transition table and the status-keyed field permissions live in
//! [`super::lifecycle`]; this module owns the data and its construction
//! invariants.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::UserId;

/// Unique event identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    /// Parse an identifier from its string form.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, uuid::Error> {
        Uuid::parse_str(raw.as_ref()).map(Self)
    }

    /// Mint a fresh random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Event kind, immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Normal,
    Merchandise,
}

impl std::str::FromStr for EventKind {
    type Err = EventValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Self::Normal),
            "merchandise" => Ok(Self::Merchandise),
            other => Err(EventValidationError::UnknownKind {
                value: other.to_owned(),
            }),
        }
    }
}

/// Lifecycle status. Transitions are restricted to the table in
/// [`super::lifecycle::transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Draft,
    Published,
    Ongoing,
    Closed,
    Completed,
}

impl EventStatus {
    /// Wire name used in requests and responses.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Ongoing => "ongoing",
            Self::Closed => "closed",
            Self::Completed => "completed",
        }
    }

    /// Whether registrations and purchases are accepted in this status.
    pub fn accepts_registrations(self) -> bool {
        matches!(self, Self::Published | Self::Ongoing)
    }
}

impl std::str::FromStr for EventStatus {
    type Err = EventValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "ongoing" => Ok(Self::Ongoing),
            "closed" => Ok(Self::Closed),
            "completed" => Ok(Self::Completed),
            other => Err(EventValidationError::UnknownStatus {
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input control kind for a registration form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Text,
    Textarea,
    Dropdown,
    Checkbox,
    File,
}

/// One field of the registration form schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    pub label: String,
    pub kind: InputKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<String>,
}

/// One merchandise line item with independent stock and a per-participant
/// purchase limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MerchItem {
    pub name: String,
    pub size: Option<String>,
    pub color: Option<String>,
    pub variant: Option<String>,
    pub stock: u32,
    pub purchase_limit_per_participant: u32,
}

/// Scheduling fields with the `start < end` invariant.
///
/// # Examples
/// ```
/// use chrono::{TimeZone, Utc};
/// use fest_backend::domain::Schedule;
///
/// let deadline = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
/// let start = Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap();
/// let end = Utc.with_ymd_and_hms(2026, 1, 3, 0, 0, 0).unwrap();
/// let schedule = Schedule::new(deadline, start, end).unwrap();
/// assert_eq!(schedule.start_date, start);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub registration_deadline: DateTime<Utc>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl Schedule {
    /// Construct a schedule, rejecting `start >= end`.
    pub fn new(
        registration_deadline: DateTime<Utc>,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Result<Self, EventValidationError> {
        if start_date >= end_date {
            return Err(EventValidationError::StartNotBeforeEnd);
        }
        Ok(Self {
            registration_deadline,
            start_date,
            end_date,
        })
    }
}

/// Validation failures raised by event constructors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventValidationError {
    /// Event name was blank.
    #[error("event name must not be empty")]
    EmptyName,
    /// `startDate` must be strictly before `endDate`.
    #[error("startDate must be before endDate")]
    StartNotBeforeEnd,
    /// Registration limit must be a positive integer.
    #[error("registrationLimit must be at least 1")]
    ZeroRegistrationLimit,
    /// A merchandise item declared a zero per-participant purchase limit.
    #[error("purchaseLimitPerParticipant must be at least 1")]
    ZeroPurchaseLimit,
    /// Kind string outside the accepted set.
    #[error("unknown event type: {value}")]
    UnknownKind { value: String },
    /// Status string outside the accepted set.
    #[error("unknown event status: {value}")]
    UnknownStatus { value: String },
}

/// Constructor input for [`Event::create`].
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub name: String,
    pub description: Option<String>,
    pub kind: EventKind,
    pub eligibility: Option<String>,
    pub schedule: Schedule,
    pub registration_limit: u32,
    pub registration_fee: u32,
    pub tags: Vec<String>,
    pub form_fields: Vec<FormField>,
    pub merch_items: Vec<MerchItem>,
}

/// An event record. New events always start in draft; mutation after
/// creation flows through [`super::lifecycle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: EventId,
    pub organizer: UserId,
    pub kind: EventKind,
    pub status: EventStatus,
    pub name: String,
    pub description: Option<String>,
    pub eligibility: String,
    pub schedule: Schedule,
    pub registration_limit: u32,
    pub registration_fee: u32,
    pub tags: Vec<String>,
    pub form_fields: Vec<FormField>,
    pub form_locked: bool,
    pub merch_items: Vec<MerchItem>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Create a draft event owned by `organizer`.
    pub fn create(organizer: UserId, new: NewEvent) -> Result<Self, EventValidationError> {
        if new.name.trim().is_empty() {
            return Err(EventValidationError::EmptyName);
        }
        if new.registration_limit == 0 {
            return Err(EventValidationError::ZeroRegistrationLimit);
        }
        if new.merch_items.iter().any(|i| i.purchase_limit_per_participant == 0) {
            return Err(EventValidationError::ZeroPurchaseLimit);
        }
        Ok(Self {
            id: EventId::random(),
            organizer,
            kind: new.kind,
            status: EventStatus::Draft,
            name: new.name,
            description: new.description,
            eligibility: new.eligibility.unwrap_or_else(|| "All".to_owned()),
            schedule: new.schedule,
            registration_limit: new.registration_limit,
            registration_fee: new.registration_fee,
            tags: new.tags,
            form_fields: new.form_fields,
            form_locked: false,
            merch_items: new.merch_items,
            created_at: Utc::now(),
        })
    }

    /// Look up a merchandise line item by caller-supplied index.
    pub fn merch_item(&self, index: usize) -> Option<&MerchItem> {
        self.merch_items.get(index)
    }

    /// Flip the one-way form lock. Idempotent; the flag is never cleared.
    pub fn lock_form(&mut self) {
        self.form_locked = true;
    }
}

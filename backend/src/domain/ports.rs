//! Domain ports defining the edges of the hexagon.
//!
//! Driven ports describe how the domain expects to talk to storage adapters;
//! driving ports are the use-case surface the inbound HTTP layer depends on.
//! Each driven trait exposes strongly typed errors so adapters map their
//! failures into predictable variants instead of returning `anyhow::Result`.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use super::event::{Event, EventId, EventKind, EventStatus, NewEvent};
use super::lifecycle::{EventField, EventUpdate, Trigger};
use super::registration::Registration;
use super::user::{EmailAddress, ParticipantType, Preferences, Role, User, UserId};
use super::Error;

/// Persistence errors raised by [`UserRepository`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserPersistenceError {
    /// Repository connection could not be established.
    #[error("user repository connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("user repository query failed: {message}")]
    Query { message: String },
    /// The unique email key is already taken.
    #[error("email already registered: {email}")]
    DuplicateEmail { email: String },
}

impl UserPersistenceError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Helper for unique-email violations.
    pub fn duplicate_email(email: impl Into<String>) -> Self {
        Self::DuplicateEmail {
            email: email.into(),
        }
    }
}

/// Persistence errors raised by [`EventRepository`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventPersistenceError {
    /// Repository connection could not be established.
    #[error("event repository connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("event repository query failed: {message}")]
    Query { message: String },
}

impl EventPersistenceError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Errors raised by [`RegistrationLedger`] adapters.
///
/// The conditional variants (`CapacityExhausted`, `StockExhausted`,
/// `InvalidItem`) report a failed conditional insert, the ledger's whole
/// reason for existing: the check and the write happen inside one critical
/// section so concurrent requests can never overshoot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Ledger connection could not be established.
    #[error("registration ledger connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("registration ledger query failed: {message}")]
    Query { message: String },
    /// The event's active registration count already sits at its limit.
    #[error("registration limit of {limit} reached")]
    CapacityExhausted { limit: u32 },
    /// The requested quantity exceeds the item's remaining stock.
    #[error("only {available} units left in stock")]
    StockExhausted { available: u32 },
    /// The item index does not address a merchandise line item.
    #[error("no merchandise item at index {index}")]
    InvalidItem { index: usize },
    /// A minted ticket identifier collided with an existing one.
    #[error("ticket identifier already in use: {ticket}")]
    DuplicateTicket { ticket: String },
}

impl LedgerError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Persistence port for user aggregates.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user, enforcing the unique email key.
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError>;

    /// Replace an existing user record.
    async fn update(&self, user: &User) -> Result<(), UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch a user by normalised email.
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError>;

    /// All users holding the given role, ordered by creation time.
    async fn list_by_role(&self, role: Role) -> Result<Vec<User>, UserPersistenceError>;

    /// Hard-delete a user. Returns whether a record existed.
    async fn delete(&self, id: &UserId) -> Result<bool, UserPersistenceError>;
}

/// Filters accepted by the public event listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventListFilter {
    pub kind: Option<EventKind>,
    pub eligibility: Option<String>,
    pub organizer: Option<UserId>,
    /// Case-insensitive substring match on the event name.
    pub name_contains: Option<String>,
    /// Date-range overlap on `startDate`.
    pub starts_after: Option<DateTime<Utc>>,
    pub starts_before: Option<DateTime<Utc>>,
    /// Shortcut for `status ∈ {published, ongoing}`.
    pub active_only: bool,
    /// Restrict to events owned by organizers the viewer follows. Requires
    /// an authenticated viewer; the service resolves the follow set into
    /// `organizers_in` before the repository sees the filter.
    pub followed_only: bool,
    /// Restrict to events owned by any of these organizers.
    pub organizers_in: Option<BTreeSet<UserId>>,
}

/// Persistence port for event aggregates.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Insert a new event.
    async fn insert(&self, event: &Event) -> Result<(), EventPersistenceError>;

    /// Replace an existing event record.
    async fn update(&self, event: &Event) -> Result<(), EventPersistenceError>;

    /// Fetch an event by identifier.
    async fn find_by_id(&self, id: &EventId) -> Result<Option<Event>, EventPersistenceError>;

    /// Events matching the filter, in unspecified order.
    async fn list(&self, filter: &EventListFilter) -> Result<Vec<Event>, EventPersistenceError>;

    /// Flip the one-way form lock. Idempotent; succeeds if already locked.
    async fn lock_form(&self, id: &EventId) -> Result<(), EventPersistenceError>;
}

/// A merchandise purchase to be applied as one atomic unit: the stock
/// decrement, the item snapshot, and the ledger insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerchPurchase {
    pub event: EventId,
    pub user: UserId,
    pub item_index: usize,
    pub quantity: u32,
    pub fee_paid: u32,
}

/// Persistence port for the registration ledger.
///
/// The insert operations are conditional updates per the concurrency model:
/// adapters must perform the capacity/stock check and the write inside a
/// single critical section against the shared store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegistrationLedger: Send + Sync {
    /// Insert a normal registration iff the event's active count is below
    /// `limit`. Atomic with respect to concurrent inserts on the same event.
    async fn insert_normal(
        &self,
        registration: Registration,
        limit: u32,
    ) -> Result<Registration, LedgerError>;

    /// Decrement the item's stock and insert the receipt as one unit,
    /// denormalizing the item's attributes into the record.
    async fn insert_merch(&self, purchase: MerchPurchase) -> Result<Registration, LedgerError>;

    /// Count of records holding a seat against the event's limit.
    async fn count_active(&self, event: &EventId) -> Result<u32, LedgerError>;

    /// Every registration owned by the user, newest first.
    async fn find_by_user(&self, user: &UserId) -> Result<Vec<Registration>, LedgerError>;
}

/// The resolved identity acting on a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
}

impl Actor {
    /// Whether the actor may administer resources owned by `owner`.
    pub fn owns_or_admin(&self, owner: &UserId) -> bool {
        self.role == Role::Admin || &self.id == owner
    }
}

/// Identity and role returned by a successful authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    pub id: UserId,
    pub role: Role,
}

/// Input for participant self-registration.
#[derive(Debug, Clone)]
pub struct RegisterParticipantRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: EmailAddress,
    pub password: String,
    pub participant_type: ParticipantType,
    pub college: Option<String>,
    pub contact_number: Option<String>,
    pub interests: Vec<String>,
}

/// Input for admin organizer provisioning.
#[derive(Debug, Clone)]
pub struct CreateOrganizerRequest {
    pub organizer_name: String,
    pub organizer_category: Option<String>,
    pub organizer_description: Option<String>,
    pub organizer_contact_email: Option<String>,
    pub login_email: EmailAddress,
    pub password: String,
}

/// Role-scoped participant profile edit; absent fields are untouched.
#[derive(Debug, Clone, Default)]
pub struct ParticipantProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub contact_number: Option<String>,
    pub college: Option<String>,
    pub interests: Option<Vec<String>>,
}

/// Role-scoped organizer profile edit; absent fields are untouched.
#[derive(Debug, Clone, Default)]
pub struct OrganizerProfileUpdate {
    pub organizer_name: Option<String>,
    pub organizer_category: Option<String>,
    pub organizer_description: Option<String>,
    pub organizer_contact_email: Option<String>,
    pub contact_number: Option<String>,
}

/// A row of the public organizer directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizerListing {
    pub id: UserId,
    pub organizer_name: String,
    pub organizer_category: Option<String>,
    pub organizer_description: Option<String>,
    pub organizer_contact_email: Option<String>,
    /// `Some` only when the directory was fetched by a signed-in viewer.
    pub is_followed: Option<bool>,
}

/// Driving port: credential authentication.
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Resolve credentials to an identity, or fail with a single
    /// non-discriminating `Unauthorized` error.
    async fn authenticate(
        &self,
        credentials: &super::LoginCredentials,
    ) -> Result<AuthenticatedIdentity, Error>;
}

/// Driving port: identity and preference mutations.
#[async_trait]
pub trait IdentityCommand: Send + Sync {
    /// Self-service participant signup.
    async fn register_participant(
        &self,
        request: RegisterParticipantRequest,
    ) -> Result<UserId, Error>;

    /// Change the caller's own password after verifying the current one.
    async fn change_password(
        &self,
        user: &UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), Error>;

    /// Apply a participant profile edit and return the updated record.
    async fn update_participant_profile(
        &self,
        user: &UserId,
        update: ParticipantProfileUpdate,
    ) -> Result<User, Error>;

    /// Apply an organizer profile edit and return the updated record.
    async fn update_organizer_profile(
        &self,
        user: &UserId,
        update: OrganizerProfileUpdate,
    ) -> Result<User, Error>;

    /// Follow an organizer; re-following is a no-op success.
    async fn follow(&self, user: &UserId, organizer: &UserId) -> Result<(), Error>;

    /// Unfollow an organizer; unfollowing a stranger is a no-op success.
    async fn unfollow(&self, user: &UserId, organizer: &UserId) -> Result<(), Error>;

    /// Replace both preference arrays wholesale. Partially invalid follow
    /// lists are rejected as a unit.
    async fn set_preferences(
        &self,
        user: &UserId,
        interests: Vec<String>,
        followed_organizers: Vec<UserId>,
    ) -> Result<Preferences, Error>;
}

/// Driving port: identity reads.
#[async_trait]
pub trait IdentityQuery: Send + Sync {
    /// Fetch a user's full record.
    async fn profile(&self, user: &UserId) -> Result<User, Error>;

    /// Fetch a user's preference data.
    async fn preferences(&self, user: &UserId) -> Result<Preferences, Error>;

    /// The public organizer directory, follow-flagged for signed-in viewers.
    async fn organizer_directory(
        &self,
        viewer: Option<&UserId>,
    ) -> Result<Vec<OrganizerListing>, Error>;
}

/// Driving port: admin organizer lifecycle.
#[async_trait]
pub trait AdminCommand: Send + Sync {
    /// Provision an organizer account.
    async fn create_organizer(&self, request: CreateOrganizerRequest) -> Result<UserId, Error>;

    /// Remove an organizer account.
    async fn remove_organizer(&self, organizer: &UserId) -> Result<(), Error>;

    /// Overwrite an organizer's password.
    async fn reset_organizer_password(
        &self,
        organizer: &UserId,
        new_password: &str,
    ) -> Result<(), Error>;
}

/// Deadline/limit extension for an open event.
#[derive(Debug, Clone, Default)]
pub struct ExtendRequest {
    pub registration_deadline: Option<DateTime<Utc>>,
    pub registration_limit: Option<u32>,
}

/// Summary returned by a successful event update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventUpdateSummary {
    pub status: EventStatus,
    /// Fields silently discarded by the status-keyed permission table.
    pub dropped: Vec<EventField>,
}

/// Driving port: event lifecycle mutations.
#[async_trait]
pub trait EventsCommand: Send + Sync {
    /// Create a draft event owned by the acting organizer.
    async fn create(&self, actor: &Actor, new: NewEvent) -> Result<EventId, Error>;

    /// Apply a status-gated field update.
    async fn update(
        &self,
        actor: &Actor,
        event: &EventId,
        update: EventUpdate,
    ) -> Result<EventUpdateSummary, Error>;

    /// Fire a lifecycle trigger.
    async fn trigger(
        &self,
        actor: &Actor,
        event: &EventId,
        trigger: Trigger,
    ) -> Result<EventStatus, Error>;

    /// Push the registration deadline later and/or raise the limit.
    async fn extend(
        &self,
        actor: &Actor,
        event: &EventId,
        request: ExtendRequest,
    ) -> Result<(), Error>;
}

/// Driving port: event reads, available to anonymous callers.
#[async_trait]
pub trait EventsQuery: Send + Sync {
    /// Fetch one event.
    async fn get(&self, event: &EventId) -> Result<Event, Error>;

    /// List events under the filter. Authenticated viewers receive the
    /// preference-ranked order; anonymous viewers the chronological one.
    async fn list(
        &self,
        filter: EventListFilter,
        viewer: Option<&UserId>,
    ) -> Result<Vec<Event>, Error>;
}

/// One row of a participant's registration history, with the parent event's
/// descriptive fields joined in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub registration: Registration,
    pub event_name: Option<String>,
    pub event_kind: Option<EventKind>,
    pub event_organizer: Option<UserId>,
    pub event_start: Option<DateTime<Utc>>,
    pub event_end: Option<DateTime<Utc>>,
}

/// Driving port: enrollment and purchases.
#[async_trait]
pub trait RegistrationsCommand: Send + Sync {
    /// Register the caller for a normal event.
    async fn register_normal(
        &self,
        caller: &UserId,
        event: &EventId,
        answers: BTreeMap<String, String>,
    ) -> Result<Registration, Error>;

    /// Purchase merchandise from a merchandise event.
    async fn purchase_merch(
        &self,
        caller: &UserId,
        event: &EventId,
        item_index: usize,
        quantity: u32,
    ) -> Result<Registration, Error>;
}

/// Driving port: registration reads.
#[async_trait]
pub trait RegistrationsQuery: Send + Sync {
    /// The caller's registrations with parent-event fields joined in.
    async fn history(&self, caller: &UserId) -> Result<Vec<HistoryEntry>, Error>;
}

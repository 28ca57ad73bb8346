//! Domain primitives, aggregates, and services.
//!
//! Purpose: define strongly typed entities for identities, events, and the
//! registration ledger, the pure lifecycle/ranking logic over them, the
//! ports at the hexagon's edges, and the services implementing the driving
//! ports. Serialisation contracts (serde) are documented in each type's
//! Rustdoc.

pub mod auth;
pub mod error;
pub mod event;
pub mod event_service;
pub mod identity_service;
pub mod lifecycle;
pub mod ports;
pub mod ranking;
pub mod registration;
pub mod registration_service;
pub mod user;

pub use self::auth::{
    LoginCredentials, LoginValidationError, PasswordHash, PasswordHashParseError,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::event::{
    Event, EventId, EventKind, EventStatus, EventValidationError, FormField, InputKind, MerchItem,
    NewEvent, Schedule,
};
pub use self::event_service::EventService;
pub use self::identity_service::IdentityService;
pub use self::lifecycle::{
    allowed_fields, apply_update, extend, transition, EventField, EventUpdate, ExtendError,
    InvalidTransition, Trigger, UpdateError, UpdateOutcome,
};
pub use self::ranking::FOLLOW_WEIGHT;
pub use self::registration::{
    MerchSelection, Registration, RegistrationId, RegistrationPayload, RegistrationStatus,
    TicketId,
};
pub use self::registration_service::RegistrationService;
pub use self::user::{
    EmailAddress, OrganizerProfile, ParticipantProfile, ParticipantType, Preferences, Role, User,
    UserId, UserValidationError, IIIT_DOMAINS,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use fest_backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;

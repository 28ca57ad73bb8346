//! User aggregate: identity, role-scoped profile data, and preferences.
//!
//! Participants, organizers, and admins all live in one record; role-specific
//! attributes sit in optional profile structs so the persistence layer stays
//! a single keyspace. Constructors enforce the role-specific validation rules
//! (notably the institutional email allow-list for IIIT participants).

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::auth::PasswordHash;

/// Email domains accepted for participants registering as IIIT members.
pub const IIIT_DOMAINS: [&str; 2] = ["iiit.ac.in", "students.iiit.ac.in"];

/// Unique user identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
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

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Access role attached to an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Participant,
    Organizer,
    Admin,
}

impl Role {
    /// Wire name used in sessions and responses.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Participant => "participant",
            Self::Organizer => "organizer",
            Self::Admin => "admin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "participant" => Ok(Self::Participant),
            "organizer" => Ok(Self::Organizer),
            "admin" => Ok(Self::Admin),
            other => Err(UserValidationError::UnknownRole {
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Participant classification used for the institutional email rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticipantType {
    #[serde(rename = "IIIT")]
    Iiit,
    #[serde(rename = "Non-IIIT")]
    NonIiit,
}

impl std::str::FromStr for ParticipantType {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IIIT" => Ok(Self::Iiit),
            "Non-IIIT" => Ok(Self::NonIiit),
            other => Err(UserValidationError::UnknownParticipantType {
                value: other.to_owned(),
            }),
        }
    }
}

/// Validation failures raised by user constructors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserValidationError {
    /// An email address failed basic shape validation.
    #[error("email address is malformed: {value}")]
    MalformedEmail { value: String },
    /// An IIIT participant supplied an email outside the allow-listed domains.
    #[error("IIIT participants must use an IIIT-issued email")]
    NonInstitutionalEmail,
    /// A required name field was blank.
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },
    /// Role string outside the accepted set.
    #[error("unknown role: {value}")]
    UnknownRole { value: String },
    /// Participant type string outside the accepted set.
    #[error("unknown participant type: {value}")]
    UnknownParticipantType { value: String },
}

/// Lowercased, shape-validated email address.
///
/// ## Invariants
/// - Exactly one `@` with a non-empty local part and domain.
/// - Stored lowercase so uniqueness checks are case-insensitive.
///
/// # Examples
/// ```
/// use fest_backend::domain::EmailAddress;
///
/// let email = EmailAddress::new("Ada@IIIT.ac.in").unwrap();
/// assert_eq!(email.as_str(), "ada@iiit.ac.in");
/// assert_eq!(email.domain(), "iiit.ac.in");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and normalise a raw email string.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let normalized = raw.as_ref().trim().to_lowercase();
        let mut parts = normalized.split('@');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(local), Some(domain), None) if !local.is_empty() && !domain.is_empty() => {
                Ok(Self(normalized))
            }
            _ => Err(UserValidationError::MalformedEmail { value: normalized }),
        }
    }

    /// Borrow the normalised address.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Domain part of the address.
    pub fn domain(&self) -> &str {
        self.0.rsplit('@').next().unwrap_or_default()
    }

    /// Whether the domain is on the institutional allow-list.
    pub fn is_institutional(&self) -> bool {
        IIIT_DOMAINS.contains(&self.domain())
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Participant-only attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantProfile {
    pub first_name: String,
    pub last_name: String,
    pub participant_type: ParticipantType,
    pub college: Option<String>,
    pub contact_number: Option<String>,
}

/// Organizer-only attributes (kept on the user record, mirroring the store).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizerProfile {
    pub organizer_name: String,
    pub organizer_category: Option<String>,
    pub organizer_description: Option<String>,
    pub organizer_contact_email: Option<String>,
    pub contact_number: Option<String>,
}

/// Interest tags and followed organizers driving event ranking.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Preferences {
    pub interests: Vec<String>,
    pub followed_organizers: BTreeSet<UserId>,
}

/// A user record: identity, credential digest, role, and profile data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: EmailAddress,
    pub password: PasswordHash,
    pub role: Role,
    pub participant: Option<ParticipantProfile>,
    pub organizer: Option<OrganizerProfile>,
    pub preferences: Preferences,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a participant, enforcing the institutional email rule for
    /// IIIT members.
    pub fn participant(
        email: EmailAddress,
        password: PasswordHash,
        profile: ParticipantProfile,
    ) -> Result<Self, UserValidationError> {
        if profile.first_name.trim().is_empty() {
            return Err(UserValidationError::EmptyField {
                field: "firstName",
            });
        }
        if profile.last_name.trim().is_empty() {
            return Err(UserValidationError::EmptyField { field: "lastName" });
        }
        if profile.participant_type == ParticipantType::Iiit && !email.is_institutional() {
            return Err(UserValidationError::NonInstitutionalEmail);
        }
        Ok(Self {
            id: UserId::random(),
            email,
            password,
            role: Role::Participant,
            participant: Some(profile),
            organizer: None,
            preferences: Preferences::default(),
            created_at: Utc::now(),
        })
    }

    /// Create an organizer account (admin provisioning).
    pub fn organizer(
        email: EmailAddress,
        password: PasswordHash,
        profile: OrganizerProfile,
    ) -> Result<Self, UserValidationError> {
        if profile.organizer_name.trim().is_empty() {
            return Err(UserValidationError::EmptyField {
                field: "organizerName",
            });
        }
        Ok(Self {
            id: UserId::random(),
            email,
            password,
            role: Role::Organizer,
            participant: None,
            organizer: Some(profile),
            preferences: Preferences::default(),
            created_at: Utc::now(),
        })
    }

    /// Create an admin account. Admins are seeded at startup, never
    /// registered through the public surface.
    pub fn admin(email: EmailAddress, password: PasswordHash) -> Self {
        Self {
            id: UserId::random(),
            email,
            password,
            role: Role::Admin,
            participant: None,
            organizer: None,
            preferences: Preferences::default(),
            created_at: Utc::now(),
        }
    }

    /// Follow an organizer. Re-following is a no-op success.
    pub fn follow(&mut self, organizer: UserId) {
        self.preferences.followed_organizers.insert(organizer);
    }

    /// Unfollow an organizer. Unfollowing a stranger is a no-op success.
    pub fn unfollow(&mut self, organizer: &UserId) {
        self.preferences.followed_organizers.remove(organizer);
    }

    /// Whether this user follows the given organizer.
    pub fn follows(&self, organizer: &UserId) -> bool {
        self.preferences.followed_organizers.contains(organizer)
    }
}

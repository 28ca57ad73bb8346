//! Registration ledger records: enrollments, merchandise receipts, and the
//! participant-facing ticket identifiers minted for them.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::event::{EventId, EventKind, MerchItem};
use super::user::UserId;

const TICKET_PREFIX: &str = "TKT-";
const TICKET_RANDOM_BYTES: usize = 6;

/// Unique registration identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrationId(Uuid);

impl RegistrationId {
    /// Mint a fresh random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Human-legible receipt key, unique across the ledger.
///
/// Format: `TKT-` followed by twelve uppercase hex characters drawn from the
/// OS random source.
///
/// # Examples
/// ```
/// use fest_backend::domain::TicketId;
///
/// let ticket = TicketId::mint();
/// assert!(ticket.as_str().starts_with("TKT-"));
/// assert_eq!(ticket.as_str().len(), 16);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(String);

impl TicketId {
    /// Mint a fresh ticket identifier.
    pub fn mint() -> Self {
        let mut bytes = [0u8; TICKET_RANDOM_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(format!("{TICKET_PREFIX}{}", hex::encode_upper(bytes)))
    }

    /// Borrow the ticket string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Registration lifecycle status. Only `Registered` counts against event
/// capacity; the later states are driven by collaborators outside this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Registered,
    Cancelled,
    Rejected,
    Completed,
}

/// Denormalized snapshot of the purchased merchandise item, so later catalog
/// edits never rewrite historical receipts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MerchSelection {
    pub name: String,
    pub size: Option<String>,
    pub color: Option<String>,
    pub variant: Option<String>,
    pub quantity: u32,
}

impl MerchSelection {
    /// Snapshot `quantity` units of a catalog item.
    pub fn of(item: &MerchItem, quantity: u32) -> Self {
        Self {
            name: item.name.clone(),
            size: item.size.clone(),
            color: item.color.clone(),
            variant: item.variant.clone(),
            quantity,
        }
    }
}

/// Type-specific payload of a registration record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", untagged)]
pub enum RegistrationPayload {
    /// Answers to the event's registration form, keyed by field label.
    Form { answers: BTreeMap<String, String> },
    /// Merchandise purchase snapshot.
    Merch { item: MerchSelection },
}

/// A ledger record linking a user to an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub id: RegistrationId,
    pub event: EventId,
    pub user: UserId,
    pub kind: EventKind,
    pub status: RegistrationStatus,
    pub ticket: TicketId,
    pub payload: RegistrationPayload,
    pub fee_paid: u32,
    pub created_at: DateTime<Utc>,
}

impl Registration {
    /// Build a normal-event registration with a fresh ticket.
    pub fn normal(
        event: EventId,
        user: UserId,
        answers: BTreeMap<String, String>,
        fee_paid: u32,
    ) -> Self {
        Self {
            id: RegistrationId::random(),
            event,
            user,
            kind: EventKind::Normal,
            status: RegistrationStatus::Registered,
            ticket: TicketId::mint(),
            payload: RegistrationPayload::Form { answers },
            fee_paid,
            created_at: Utc::now(),
        }
    }

    /// Build a merchandise receipt with a fresh ticket.
    pub fn merchandise(event: EventId, user: UserId, item: MerchSelection, fee_paid: u32) -> Self {
        Self {
            id: RegistrationId::random(),
            event,
            user,
            kind: EventKind::Merchandise,
            status: RegistrationStatus::Registered,
            ticket: TicketId::mint(),
            payload: RegistrationPayload::Merch { item },
            fee_paid,
            created_at: Utc::now(),
        }
    }

    /// Whether this record counts against the event's registration limit.
    pub fn counts_against_capacity(&self) -> bool {
        self.kind == EventKind::Normal && self.status == RegistrationStatus::Registered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn tickets_are_prefixed_upper_hex() {
        let ticket = TicketId::mint();
        let suffix = ticket.as_str().strip_prefix("TKT-").expect("prefix");
        assert_eq!(suffix.len(), 12);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
    }

    #[rstest]
    fn tickets_are_unlikely_to_collide() {
        let a = TicketId::mint();
        let b = TicketId::mint();
        assert_ne!(a, b);
    }

    #[rstest]
    fn merch_selection_snapshots_item_attributes() {
        let item = MerchItem {
            name: "Fest Tee".into(),
            size: Some("L".into()),
            color: Some("black".into()),
            variant: None,
            stock: 40,
            purchase_limit_per_participant: 2,
        };
        let selection = MerchSelection::of(&item, 2);
        assert_eq!(selection.name, "Fest Tee");
        assert_eq!(selection.quantity, 2);
        assert_eq!(selection.size.as_deref(), Some("L"));
    }

    #[rstest]
    fn only_registered_normal_records_count_against_capacity() {
        let mut reg = Registration::normal(
            EventId::random(),
            UserId::random(),
            BTreeMap::new(),
            0,
        );
        assert!(reg.counts_against_capacity());
        reg.status = RegistrationStatus::Cancelled;
        assert!(!reg.counts_against_capacity());

        let merch = Registration::merchandise(
            EventId::random(),
            UserId::random(),
            MerchSelection {
                name: "Cap".into(),
                size: None,
                color: None,
                variant: None,
                quantity: 1,
            },
            100,
        );
        assert!(!merch.counts_against_capacity());
    }
}

//! The shared in-memory store backing every persistence adapter.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::{Event, EventId, Registration, RegistrationId, User, UserId};

/// Mutable store state. Guarded by the one mutex in [`MemoryStore`].
#[derive(Debug, Default)]
pub(super) struct Inner {
    pub(super) users: HashMap<UserId, User>,
    pub(super) events: HashMap<EventId, Event>,
    pub(super) registrations: HashMap<RegistrationId, Registration>,
    /// Ticket identifiers already issued, for ledger-wide uniqueness.
    pub(super) tickets: HashSet<String>,
}

/// Handle to the shared store. Cheap to clone; every adapter built from the
/// same store sees the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

/// The store mutex was poisoned by a panicking writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct StorePoisoned;

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) fn guard(&self) -> Result<MutexGuard<'_, Inner>, StorePoisoned> {
        self.inner.lock().map_err(|_| StorePoisoned)
    }
}

//! Event repository over the shared in-memory store.

use async_trait::async_trait;

use crate::domain::ports::{EventListFilter, EventPersistenceError, EventRepository};
use crate::domain::{Event, EventId};

use super::store::{MemoryStore, StorePoisoned};

/// [`EventRepository`] adapter over a [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct MemoryEventRepository {
    store: MemoryStore,
}

impl MemoryEventRepository {
    /// Create an adapter view over the store.
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

impl From<StorePoisoned> for EventPersistenceError {
    fn from(_: StorePoisoned) -> Self {
        EventPersistenceError::connection("store lock poisoned")
    }
}

fn matches(event: &Event, filter: &EventListFilter) -> bool {
    if let Some(kind) = filter.kind {
        if event.kind != kind {
            return false;
        }
    }
    if let Some(eligibility) = &filter.eligibility {
        if !event.eligibility.eq_ignore_ascii_case(eligibility) {
            return false;
        }
    }
    if let Some(organizer) = &filter.organizer {
        if &event.organizer != organizer {
            return false;
        }
    }
    if let Some(query) = &filter.name_contains {
        if !event.name.to_lowercase().contains(&query.to_lowercase()) {
            return false;
        }
    }
    if let Some(after) = filter.starts_after {
        if event.schedule.start_date < after {
            return false;
        }
    }
    if let Some(before) = filter.starts_before {
        if event.schedule.start_date > before {
            return false;
        }
    }
    if filter.active_only && !event.status.accepts_registrations() {
        return false;
    }
    if let Some(organizers) = &filter.organizers_in {
        if !organizers.contains(&event.organizer) {
            return false;
        }
    }
    true
}

#[async_trait]
impl EventRepository for MemoryEventRepository {
    async fn insert(&self, event: &Event) -> Result<(), EventPersistenceError> {
        let mut inner = self.store.guard()?;
        inner.events.insert(event.id.clone(), event.clone());
        Ok(())
    }

    async fn update(&self, event: &Event) -> Result<(), EventPersistenceError> {
        let mut inner = self.store.guard()?;
        if !inner.events.contains_key(&event.id) {
            return Err(EventPersistenceError::query(format!(
                "no event with id {}",
                event.id
            )));
        }
        inner.events.insert(event.id.clone(), event.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &EventId) -> Result<Option<Event>, EventPersistenceError> {
        let inner = self.store.guard()?;
        Ok(inner.events.get(id).cloned())
    }

    async fn list(&self, filter: &EventListFilter) -> Result<Vec<Event>, EventPersistenceError> {
        let inner = self.store.guard()?;
        Ok(inner
            .events
            .values()
            .filter(|event| matches(event, filter))
            .cloned()
            .collect())
    }

    async fn lock_form(&self, id: &EventId) -> Result<(), EventPersistenceError> {
        let mut inner = self.store.guard()?;
        let Some(event) = inner.events.get_mut(id) else {
            return Err(EventPersistenceError::query(format!(
                "no event with id {id}"
            )));
        };
        event.lock_form();
        Ok(())
    }
}

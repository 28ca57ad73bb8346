//! Registration ledger over the shared in-memory store.
//!
//! The insert operations take the store lock once and perform their check
//! and their write under it, which is what makes the capacity and stock
//! bounds hold under concurrent requests.

use async_trait::async_trait;

use crate::domain::ports::{LedgerError, MerchPurchase, RegistrationLedger};
use crate::domain::{EventId, MerchSelection, Registration, UserId};

use super::store::{MemoryStore, StorePoisoned};

/// [`RegistrationLedger`] adapter over a [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct MemoryRegistrationLedger {
    store: MemoryStore,
}

impl MemoryRegistrationLedger {
    /// Create an adapter view over the store.
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

impl From<StorePoisoned> for LedgerError {
    fn from(_: StorePoisoned) -> Self {
        LedgerError::connection("store lock poisoned")
    }
}

#[async_trait]
impl RegistrationLedger for MemoryRegistrationLedger {
    async fn insert_normal(
        &self,
        registration: Registration,
        limit: u32,
    ) -> Result<Registration, LedgerError> {
        let mut inner = self.store.guard()?;

        let active = inner
            .registrations
            .values()
            .filter(|r| r.event == registration.event && r.counts_against_capacity())
            .count();
        if active >= limit as usize {
            return Err(LedgerError::CapacityExhausted { limit });
        }
        if !inner.tickets.insert(registration.ticket.as_str().to_owned()) {
            return Err(LedgerError::DuplicateTicket {
                ticket: registration.ticket.as_str().to_owned(),
            });
        }
        inner
            .registrations
            .insert(registration.id.clone(), registration.clone());
        Ok(registration)
    }

    async fn insert_merch(&self, purchase: MerchPurchase) -> Result<Registration, LedgerError> {
        let mut inner = self.store.guard()?;

        let Some(event) = inner.events.get(&purchase.event) else {
            return Err(LedgerError::query(format!(
                "no event with id {}",
                purchase.event
            )));
        };
        let Some(item) = event.merch_items.get(purchase.item_index) else {
            return Err(LedgerError::InvalidItem {
                index: purchase.item_index,
            });
        };
        if item.stock < purchase.quantity {
            return Err(LedgerError::StockExhausted {
                available: item.stock,
            });
        }
        let selection = MerchSelection::of(item, purchase.quantity);

        let registration = Registration::merchandise(
            purchase.event.clone(),
            purchase.user,
            selection,
            purchase.fee_paid,
        );
        // All checks, the ticket included, run before any mutation so a
        // failed insert leaves the stock untouched.
        if !inner.tickets.insert(registration.ticket.as_str().to_owned()) {
            return Err(LedgerError::DuplicateTicket {
                ticket: registration.ticket.as_str().to_owned(),
            });
        }
        if let Some(item) = inner
            .events
            .get_mut(&purchase.event)
            .and_then(|event| event.merch_items.get_mut(purchase.item_index))
        {
            item.stock -= purchase.quantity;
        }
        inner
            .registrations
            .insert(registration.id.clone(), registration.clone());
        Ok(registration)
    }

    async fn count_active(&self, event: &EventId) -> Result<u32, LedgerError> {
        let inner = self.store.guard()?;
        let count = inner
            .registrations
            .values()
            .filter(|r| &r.event == event && r.counts_against_capacity())
            .count();
        u32::try_from(count).map_err(|_| LedgerError::query("active count overflowed u32"))
    }

    async fn find_by_user(&self, user: &UserId) -> Result<Vec<Registration>, LedgerError> {
        let inner = self.store.guard()?;
        let mut registrations: Vec<Registration> = inner
            .registrations
            .values()
            .filter(|r| &r.user == user)
            .cloned()
            .collect();
        registrations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(registrations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::EventRepository;
    use crate::domain::{Event, EventKind, EventStatus, MerchItem, NewEvent, Schedule};
    use crate::outbound::persistence::MemoryEventRepository;
    use chrono::{Duration, Utc};
    use rstest::rstest;
    use std::collections::BTreeMap;

    fn merch_event(stock: u32) -> Event {
        let now = Utc::now();
        let schedule = Schedule::new(
            now + Duration::days(1),
            now + Duration::days(2),
            now + Duration::days(3),
        )
        .expect("schedule");
        let mut event = Event::create(
            UserId::random(),
            NewEvent {
                name: "Fest Tee Drop".into(),
                description: None,
                kind: EventKind::Merchandise,
                eligibility: None,
                schedule,
                registration_limit: 100,
                registration_fee: 250,
                tags: Vec::new(),
                form_fields: Vec::new(),
                merch_items: vec![MerchItem {
                    name: "Fest Tee".into(),
                    size: Some("L".into()),
                    color: None,
                    variant: None,
                    stock,
                    purchase_limit_per_participant: 2,
                }],
            },
        )
        .expect("event");
        event.status = EventStatus::Published;
        event
    }

    #[rstest]
    #[actix_rt::test]
    async fn insert_normal_enforces_the_limit() {
        let store = MemoryStore::new();
        let ledger = MemoryRegistrationLedger::new(store);
        let event = EventId::random();

        for _ in 0..2 {
            let reg =
                Registration::normal(event.clone(), UserId::random(), BTreeMap::new(), 0);
            ledger.insert_normal(reg, 2).await.expect("under limit");
        }
        let reg = Registration::normal(event.clone(), UserId::random(), BTreeMap::new(), 0);
        let err = ledger.insert_normal(reg, 2).await.expect_err("full");
        assert_eq!(err, LedgerError::CapacityExhausted { limit: 2 });
        assert_eq!(ledger.count_active(&event).await.expect("count"), 2);
    }

    #[rstest]
    #[actix_rt::test]
    async fn insert_merch_decrements_stock_and_snapshots_the_item() {
        let store = MemoryStore::new();
        let events = MemoryEventRepository::new(store.clone());
        let ledger = MemoryRegistrationLedger::new(store);

        let event = merch_event(3);
        events.insert(&event).await.expect("insert event");

        let purchase = MerchPurchase {
            event: event.id.clone(),
            user: UserId::random(),
            item_index: 0,
            quantity: 2,
            fee_paid: 500,
        };
        let receipt = ledger.insert_merch(purchase).await.expect("purchase");
        assert_eq!(receipt.fee_paid, 500);

        let stored = events
            .find_by_id(&event.id)
            .await
            .expect("query")
            .expect("found");
        assert_eq!(stored.merch_items[0].stock, 1);

        let err = ledger
            .insert_merch(MerchPurchase {
                event: event.id.clone(),
                user: UserId::random(),
                item_index: 0,
                quantity: 2,
                fee_paid: 500,
            })
            .await
            .expect_err("insufficient stock");
        assert_eq!(err, LedgerError::StockExhausted { available: 1 });
    }

    #[rstest]
    #[actix_rt::test]
    async fn failed_purchases_leave_stock_untouched() {
        let store = MemoryStore::new();
        let events = MemoryEventRepository::new(store.clone());
        let ledger = MemoryRegistrationLedger::new(store);

        let event = merch_event(1);
        events.insert(&event).await.expect("insert event");

        ledger
            .insert_merch(MerchPurchase {
                event: event.id.clone(),
                user: UserId::random(),
                item_index: 0,
                quantity: 2,
                fee_paid: 250,
            })
            .await
            .expect_err("insufficient stock");

        let stored = events
            .find_by_id(&event.id)
            .await
            .expect("query")
            .expect("found");
        assert_eq!(stored.merch_items[0].stock, 1);
    }

    #[rstest]
    #[actix_rt::test]
    async fn insert_merch_rejects_unknown_items() {
        let store = MemoryStore::new();
        let events = MemoryEventRepository::new(store.clone());
        let ledger = MemoryRegistrationLedger::new(store);

        let event = merch_event(3);
        events.insert(&event).await.expect("insert event");

        let err = ledger
            .insert_merch(MerchPurchase {
                event: event.id.clone(),
                user: UserId::random(),
                item_index: 7,
                quantity: 1,
                fee_paid: 250,
            })
            .await
            .expect_err("no such item");
        assert_eq!(err, LedgerError::InvalidItem { index: 7 });
    }

    #[rstest]
    #[actix_rt::test]
    async fn history_is_newest_first() {
        let store = MemoryStore::new();
        let ledger = MemoryRegistrationLedger::new(store);
        let user = UserId::random();

        let first = Registration::normal(EventId::random(), user.clone(), BTreeMap::new(), 0);
        let mut second = Registration::normal(EventId::random(), user.clone(), BTreeMap::new(), 0);
        second.created_at = first.created_at + Duration::seconds(5);
        ledger.insert_normal(first, 10).await.expect("first");
        let second = ledger.insert_normal(second, 10).await.expect("second");

        let history = ledger.find_by_user(&user).await.expect("history");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, second.id);
    }
}

//! In-memory persistence adapters over one shared store.
//!
//! All three repositories are views of a single [`MemoryStore`], so
//! cross-aggregate conditional writes (the capacity-checked registration
//! insert, the stock-decrementing purchase) happen inside one critical
//! section and concurrent requests can never overshoot a limit.

mod event_repository;
mod registration_ledger;
mod store;
mod user_repository;

pub use event_repository::MemoryEventRepository;
pub use registration_ledger::MemoryRegistrationLedger;
pub use store::MemoryStore;
pub use user_repository::MemoryUserRepository;

//! Outbound adapters implementing domain ports for infrastructure.
//!
//! Adapters are thin translators between domain types and storage
//! representations. They contain no business logic; conditional writes
//! (capacity, stock) run their check and mutation inside one critical
//! section but the rules themselves live in the domain.

pub mod persistence;

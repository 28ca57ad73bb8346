//! Campus-fest event management backend.
//!
//! Hexagonal layout: `domain` holds entities, lifecycle rules, and services
//! behind ports; `inbound` adapts HTTP; `outbound` adapts persistence;
//! `server` wires everything into an Actix application.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;

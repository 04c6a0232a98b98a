//! Repository layer
//!
//! Repositories are stateless HTTP clients that abstract communication
//! with the ingestion backend. They carry no tracking logic.
//!
//! All repositories are trait-based to enable testing and mocking.

mod sources;

pub use sources::{HttpSourceRepository, SourceRepository};

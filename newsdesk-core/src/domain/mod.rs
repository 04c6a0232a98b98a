//! Core domain types
//!
//! These types mirror the records served by the ingestion backend and are
//! shared between the HTTP client (which fetches them) and the tracker
//! (which snapshots them while fetch jobs run).

pub mod source;

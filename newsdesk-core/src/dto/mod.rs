//! Data Transfer Objects for the ingestion backend API
//!
//! Request and response bodies that are not domain entities in their own
//! right: creation/update payloads and job acknowledgements.

pub mod source;

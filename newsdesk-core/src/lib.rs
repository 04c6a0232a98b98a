//! Newsdesk Core
//!
//! Core types shared by the Newsdesk client, tracker and CLI.
//!
//! This crate contains:
//! - Domain types: the data sources managed by the ingestion backend
//! - DTOs: request and response bodies for the backend REST API

pub mod domain;
pub mod dto;

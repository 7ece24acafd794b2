//! Wishlist Core - Shared types library.
//!
//! This crate provides common types used across all wishlist components:
//! - `server` - HTTP API, store adapters and the wishlist service
//! - `cli` - Command-line tools for migrations and reporting
//! - `integration-tests` - End-to-end tests against in-memory collaborators
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, wishlist entities, catalog summaries and events

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

//! Wishlist server library.
//!
//! Customers save catalog variants into one wishlist per (customer, sales
//! channel). This crate holds the store, the write operations with their
//! compensations, the read model, event notification and the HTTP surface,
//! so they can be tested and reused outside the binary.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

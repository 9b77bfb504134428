//! HTTP surface of the Care Companion service.
//!
//! The binary in `main.rs` wires configuration, storage and the router
//! together; everything else lives here so the router can also be driven
//! in-process by the API tests.

pub mod auth;
pub mod config;
pub mod error;
pub mod input;
pub mod routes;

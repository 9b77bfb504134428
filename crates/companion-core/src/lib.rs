//! # Companion Core Library
//!
//! Storage and domain logic for the Care Companion service: care tasks with
//! one-off and daily recurrence, an idempotent per-day completion log, and
//! expected-vs-completed progress reporting, with role-based access rules
//! evaluated against task owners.
//!
//! ## Core Modules
//!
//! - [`db`]: Database connection and migration management
//! - [`models`]: Core data structures and transfer objects
//! - [`repository`]: Data access layer with Repository pattern
//! - [`access`]: Role-based access rules (caregiver vs. user)
//! - [`calendar`]: Service-timezone "today", date/time parsing, month math
//! - [`error`]: Error types shared across the crate
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use companion_core::{
//!     db,
//!     models::NewTaskData,
//!     repository::{SqliteRepository, TaskRepository},
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pool = db::establish_connection("companion.db", 10).await?;
//!     let repo = SqliteRepository::new(pool);
//!
//!     let task = repo
//!         .create_task(NewTaskData {
//!             user_id: 1,
//!             title: "Take morning medication".to_string(),
//!             is_daily: true,
//!             ..Default::default()
//!         })
//!         .await?;
//!     println!("created task {}", task.id);
//!
//!     Ok(())
//! }
//! ```

pub mod access;
pub mod calendar;
pub mod db;
pub mod error;
pub mod models;
pub mod repository;

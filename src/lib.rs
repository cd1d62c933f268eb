//! Event RSVP service: one record per guest, a public list, and a
//! password-gated wipe, stored in SQLite or Postgres.
//!
//! # Examples
//!
//! Repository usage with [`persist::memory::MemoryRsvpStore`]:
//! ```
//! use std::sync::Arc;
//!
//! use potluck::{persist::memory::MemoryRsvpStore, repo::{RsvpRepository, UpsertOutcome}};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let repo = RsvpRepository::new(Arc::new(MemoryRsvpStore::new()));
//! let first = repo.upsert("Priya", true, Some("Samosas")).await.expect("upsert");
//! let again = repo.upsert(" priya ", false, None).await.expect("upsert");
//! assert_eq!(first, UpsertOutcome::Created(1));
//! assert_eq!(again, UpsertOutcome::Updated(1));
//!
//! let guests = repo.list_all().await.expect("list");
//! assert_eq!(guests.len(), 1);
//! assert_eq!(guests[0].dish, None);
//! # }
//! ```
//!
//! Serving the HTTP API over a SQLite file:
//! ```no_run
//! use potluck::{config::Config, server::start_server};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let config = Config::load().expect("config");
//! start_server(config).await.expect("server");
//! # }
//! ```
#![deny(missing_docs)]

/// HTTP routes, handlers, and error mapping.
pub mod api;
/// Environment-driven startup configuration.
pub mod config;
/// Storage adapter trait and its backends.
pub mod persist;
/// One-record-per-guest repository.
pub mod repo;
/// RSVP domain records and normalization.
pub mod rsvp;
/// Server bootstrap and shutdown.
pub mod server;
/// Shared primitive types.
pub mod types;

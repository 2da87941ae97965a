//! core
//!
//! The transactional store and its supporting types.
//!
//! # Modules
//!
//! - [`paths`] - Centralized path routing for a store directory
//! - [`lock`] - Exclusive directory lock with bounded retry
//! - [`envelope`] - Provenance wrapper around persisted payloads
//! - [`store`] - Transactions: open, commit, read, init
//! - [`types`] - Shared value types
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - The store knows nothing about the shape of the payload
//! - The live document changes only by atomic rename of a synced file
//! - Every acquired lock is released on every exit path

pub mod config;
pub mod envelope;
pub mod lock;
pub mod paths;
pub mod store;
pub mod types;

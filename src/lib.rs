//! Coffer - a single-writer transactional document store
//!
//! A store is a directory holding one JSON document. Processes read the
//! document, mutate an in-memory copy, and atomically persist the new
//! version. An advisory file lock serializes writers across processes and a
//! synced-temp-file-then-rename commit keeps the on-disk state intact across
//! crashes.
//!
//! # Architecture
//!
//! - [`core`] - Store, lock, envelope, paths and configuration
//! - [`cli`] - Command-line interface over a JSON payload
//! - [`ui`] - User-facing output
//! - [`logging`] - Development tracing
//!
//! # Correctness Invariants
//!
//! 1. At most one transaction is in flight per directory
//! 2. Readers never observe a partially written document
//! 3. Every acquired lock is released exactly once
//! 4. A commit capability finishes at most once

pub mod cli;
pub mod core;
pub mod logging;
pub mod ui;

pub use crate::core::store::{init, open, read, Committer, ErrorCategory, Store, StoreError};

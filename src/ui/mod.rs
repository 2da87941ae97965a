//! ui
//!
//! User interaction utilities.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display
//!
//! # Design
//!
//! All user-facing output goes through this module so that `--quiet` is
//! honored consistently. Diagnostics use `tracing` instead.

pub mod output;

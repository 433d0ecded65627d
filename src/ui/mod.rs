//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`output`] - Progress, warning and error lines
//!
//! # Design
//!
//! Diagnostics for developers go through `tracing`; lines meant for the
//! person running the tool go through this module.

pub mod output;

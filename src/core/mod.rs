//! core
//!
//! Domain logic for producing a variable file and backend configuration.
//!
//! # Modules
//!
//! - [`document`] - Variable document tree, parsing and canonical formatting
//! - [`schema`] - Declared-variable scan of module files
//! - [`store`] - Loading and writing variable files
//! - [`identity`] - Role ARN and session name derivation
//! - [`merge`] - Precedence-aware merge of identity and remote values
//! - [`backend`] - Backend descriptor and its emission forms
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Everything here is synchronous except identity resolution, which
//!   awaits an account lookup
//! - Derived names are pure functions of their inputs
//! - Serialization is deterministic

pub mod backend;
pub mod config;
pub mod document;
pub mod identity;
pub mod merge;
pub mod schema;
pub mod store;

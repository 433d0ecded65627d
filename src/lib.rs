//! tfi - Terraform variable and backend generator
//!
//! tfi prepares a Terraform module directory for a given environment: it
//! works out which variables the module declares, fills a variable file from
//! local values, derived deployment identity and GitLab CI/CD variables,
//! describes the S3 state backend, and runs `terraform init`.
//!
//! # Architecture
//!
//! The codebase follows a layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Run context, stage pipeline, error taxonomy, init process
//! - [`core`] - Variable documents, schema scan, merge, identity, backend, config
//! - [`accounts`] - Environment to account-ID lookup
//! - [`forge`] - Hosting API abstraction (GitLab)
//! - [`git`] - Single interface to the local repository
//! - [`ui`] - User-facing output
//!
//! # Correctness Invariants
//!
//! 1. Only variables the module declares are taken from remote sources
//! 2. Values already present in the local variable file are never replaced
//!    by remote values
//! 3. Serialization is deterministic
//! 4. The session name is computed once and used verbatim everywhere

pub mod accounts;
pub mod cli;
pub mod core;
pub mod engine;
pub mod forge;
pub mod git;
pub mod ui;

//! forge
//!
//! Abstraction for the code-hosting service that owns the module's project.
//!
//! # Architecture
//!
//! The `Forge` trait defines the read-only interface the run needs: project
//! lookup and CI/CD variable listing. Production uses [`gitlab::GitLabForge`];
//! tests use [`mock::MockForge`].
//!
//! # Modules
//!
//! - `traits`: Core `Forge` trait and response types
//! - [`gitlab`]: GitLab REST implementation
//! - [`mock`]: Mock implementation for deterministic testing
//! - `vars`: Turning variables into ranked merge sources

pub mod gitlab;
pub mod mock;
mod traits;
mod vars;

pub use traits::*;
pub use vars::{collect_var_sources, TF_VAR_PREFIX};

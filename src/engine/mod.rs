//! engine
//!
//! Orchestrates a run: scan, load, resolve, merge, write, emit, init.
//!
//! # Architecture
//!
//! The engine is the coordinator between the pure domain logic in
//! [`crate::core`] and the external collaborators (account lookup, hosting
//! API, local repository, Terraform process).
//!
//! - [`context`]: Run settings, collaborators, and request-scoped caches
//! - [`runner`]: The stage pipeline and the [`RunError`] taxonomy
//! - [`init`]: Build-cache reset and `terraform init`
//!
//! # Invariants
//!
//! - Every expensive lookup runs at most once per [`RunContext`]
//! - The session name in the variable file and in the backend settings is
//!   the same string
//! - No file is written before the identity is resolved
//!
//! # Example
//!
//! ```ignore
//! use tfi::engine::{run, RunContext, RunOptions, Services};
//!
//! let services = Services::from_env(&options);
//! let ctx = RunContext::new(options, services);
//! let report = tokio::runtime::Runtime::new()?.block_on(run(&ctx))?;
//! ```

pub mod context;
pub mod init;
pub mod runner;

pub use context::{ProjectRef, RunContext, RunOptions, Services};
pub use init::{reset_build_cache, InitError, TerraformInit, BUILD_CACHE_DIR};
pub use runner::{run, RunError, RunReport, Stage, GENERATED_VAR_FILE};

use std::path::PathBuf;

/// Execution context for the invocation.
///
/// Contains global settings derived from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Working directory override.
    pub cwd: Option<PathBuf>,
    /// Debug logging enabled.
    pub debug: bool,
    /// Quiet mode (errors only).
    pub quiet: bool,
}

impl Context {
    /// Directory the run operates in.
    pub fn workdir(&self) -> Result<PathBuf, RunError> {
        match &self.cwd {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir()
                .map_err(|e| RunError::Io(format!("cannot read current directory: {}", e))),
        }
    }
}

//! engine::runner
//!
//! The whole-run pipeline and its error taxonomy.
//!
//! # Stages
//!
//! ```text
//! Start -> SchemaScanned -> DocumentLoaded -> IdentityResolved -> Merged
//!       -> Serialized -> BackendEmitted -> [Initialized] -> Done
//! ```
//!
//! Any failure halts the run at the stage it happened in. `Initialized` is
//! skipped, not failed, when init is disabled.
//!
//! # Partial Output
//!
//! The generated variable file is written in `Serialized`. A failure in a
//! later stage leaves it in place.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info};

use super::context::RunContext;
use super::init::{InitError, TerraformInit};
use crate::accounts::AccountError;
use crate::core::backend::{ensure_s3_backend, BackendDescriptor, BackendError, BackendMode};
use crate::core::config::ConfigError;
use crate::core::document::DocumentError;
use crate::core::merge::{merge, MergeReport};
use crate::core::schema::SchemaError;
use crate::core::store::{self, StoreError};
use crate::forge::ForgeError;
use crate::git::GitError;
use crate::ui::output;

/// Name of the generated variable file.
pub const GENERATED_VAR_FILE: &str = "tfi.auto.tfvars";

/// Errors that halt a run.
///
/// Each variant is one failure kind; module errors are folded into them by
/// the `From` impls below.
#[derive(Debug, Error)]
pub enum RunError {
    /// A required mapping or remote resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// A module or variable file is malformed.
    #[error("{0}")]
    Parse(String),

    /// A filesystem operation failed.
    #[error("{0}")]
    Io(String),

    /// A hosting API or parameter-store call failed.
    #[error("{0}")]
    RemoteApi(String),

    /// The account lookup exceeded its deadline.
    #[error("{0}")]
    Timeout(String),

    /// The external tool failed.
    #[error("{message}")]
    Process {
        /// What went wrong
        message: String,
        /// The tool's exit code, when it ran and exited normally
        code: Option<i32>,
    },

    /// Configuration or environment is unusable.
    #[error("{0}")]
    Config(String),

    /// Invalid invocation.
    #[error("{0}")]
    Usage(String),
}

impl RunError {
    /// Process exit code for this failure.
    ///
    /// The external tool's own non-zero code is passed through; every other
    /// failure exits with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Process {
                code: Some(code), ..
            } if *code != 0 => *code,
            _ => 1,
        }
    }
}

impl From<DocumentError> for RunError {
    fn from(err: DocumentError) -> Self {
        RunError::Parse(err.to_string())
    }
}

impl From<SchemaError> for RunError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::Read { .. } => RunError::Io(err.to_string()),
            SchemaError::Parse(e) => e.into(),
        }
    }
}

impl From<StoreError> for RunError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Parse(e) => e.into(),
            other => RunError::Io(other.to_string()),
        }
    }
}

impl From<BackendError> for RunError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Scan(e) => e.into(),
            other => RunError::Io(other.to_string()),
        }
    }
}

impl From<AccountError> for RunError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::NotFound { .. } => RunError::NotFound(err.to_string()),
            AccountError::Timeout(_) => RunError::Timeout(err.to_string()),
            AccountError::Remote(_) | AccountError::InvalidMap(_) => {
                RunError::RemoteApi(err.to_string())
            }
        }
    }
}

impl From<ForgeError> for RunError {
    fn from(err: ForgeError) -> Self {
        match err {
            ForgeError::AuthRequired => RunError::Config(err.to_string()),
            other => RunError::RemoteApi(format!("GitLab: {}", other)),
        }
    }
}

impl From<GitError> for RunError {
    fn from(err: GitError) -> Self {
        match err {
            GitError::Internal { .. } => RunError::Io(err.to_string()),
            other => RunError::Config(other.to_string()),
        }
    }
}

impl From<ConfigError> for RunError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ReadError { .. } => RunError::Io(err.to_string()),
            other => RunError::Config(other.to_string()),
        }
    }
}

impl From<InitError> for RunError {
    fn from(err: InitError) -> Self {
        match err {
            InitError::CacheReset { .. } => RunError::Io(err.to_string()),
            InitError::Spawn { .. } => RunError::Process {
                message: err.to_string(),
                code: None,
            },
            InitError::Failed { code, .. } => RunError::Process {
                message: err.to_string(),
                code,
            },
        }
    }
}

/// Run stages, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    /// Nothing has run yet.
    Start,
    /// Module variable declarations have been collected.
    SchemaScanned,
    /// The tfvars file has been parsed or created empty.
    DocumentLoaded,
    /// Environment, account and session name are known.
    IdentityResolved,
    /// Forge variables have been merged into the document.
    Merged,
    /// The merged document has been written to disk.
    Serialized,
    /// Backend file written, or module files given an empty s3 block.
    BackendEmitted,
    /// `terraform init` has finished.
    Initialized,
    /// The run completed.
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::SchemaScanned => "schema-scanned",
            Stage::DocumentLoaded => "document-loaded",
            Stage::IdentityResolved => "identity-resolved",
            Stage::Merged => "merged",
            Stage::Serialized => "serialized",
            Stage::BackendEmitted => "backend-emitted",
            Stage::Initialized => "initialized",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// What a successful run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Stages reached, in order
    pub stages: Vec<Stage>,
    /// Environment name
    pub environment: String,
    /// Whether the local variable file existed
    pub var_file_existed: bool,
    /// Path of the generated variable file
    pub generated: PathBuf,
    /// Merge summary
    pub merge: MergeReport,
    /// Backend coordinates
    pub backend: BackendDescriptor,
    /// Backend file written (file mode)
    pub backend_file: Option<PathBuf>,
    /// Module files given an empty s3 backend block (args mode)
    pub backend_blocks_added: Vec<PathBuf>,
}

struct Progress {
    stages: Vec<Stage>,
}

impl Progress {
    fn new() -> Self {
        Self {
            stages: vec![Stage::Start],
        }
    }

    fn reach(&mut self, stage: Stage) {
        debug!(%stage, "stage reached");
        self.stages.push(stage);
    }
}

/// Execute one run.
///
/// # Errors
///
/// The first failing stage's error, folded into a [`RunError`] kind.
pub async fn run(ctx: &RunContext) -> Result<RunReport, RunError> {
    let options = ctx.options();
    let mut progress = Progress::new();

    let schema = ctx.schema().await?;
    progress.reach(Stage::SchemaScanned);

    output::progress(
        format!("Loading tfvars: {}", options.var_file.display()),
        ctx.verbosity(),
    );
    let loaded = store::load(&options.var_file)?;
    if !loaded.existed {
        output::warn(
            format!(
                "{} not found, starting from an empty file",
                options.var_file.display()
            ),
            ctx.verbosity(),
        );
    }
    let mut document = loaded.document;
    progress.reach(Stage::DocumentLoaded);

    let identity = ctx.identity().await?;
    progress.reach(Stage::IdentityResolved);

    let sources = ctx.sources().await?;
    let report = merge(&mut document, schema, identity, sources);
    if !report.undeclared.is_empty() {
        output::detail(
            format!(
                "ignored undeclared: {}",
                output::format_list(&report.undeclared, ", ")
            ),
            ctx.verbosity(),
        );
    }
    progress.reach(Stage::Merged);

    let generated = ctx.workdir().join(GENERATED_VAR_FILE);
    store::write(&generated, &document)?;
    info!(path = %generated.display(), written = report.written.len(), "wrote variable file");
    progress.reach(Stage::Serialized);

    let backend = BackendDescriptor::from_identity(identity);
    let (backend_file, backend_blocks_added) = match options.backend_mode {
        BackendMode::Args => (None, ensure_s3_backend(ctx.workdir())?),
        BackendMode::File => (Some(backend.write_file(ctx.workdir())?), Vec::new()),
    };
    progress.reach(Stage::BackendEmitted);

    if options.no_init {
        debug!("init disabled");
    } else {
        let mut init = TerraformInit::new(options.terraform_bin.clone(), ctx.workdir());
        if options.backend_mode == BackendMode::Args {
            init = init.args(backend.cli_args());
        }
        init.run()?;
        progress.reach(Stage::Initialized);
    }

    progress.reach(Stage::Done);

    Ok(RunReport {
        stages: progress.stages,
        environment: identity.environment.clone(),
        var_file_existed: loaded.existed,
        generated,
        merge: report,
        backend,
        backend_file,
        backend_blocks_added,
    })
}

//! engine::init
//!
//! Running `terraform init` against the generated configuration.
//!
//! # Build Cache
//!
//! `.terraform` is removed before the tool starts. If removal fails the
//! tool is not started.
//!
//! # Streams
//!
//! The child inherits stdin, stdout and stderr. Its exit code becomes the
//! run's exit code.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::{debug, info};

/// Terraform's local build-cache directory.
pub const BUILD_CACHE_DIR: &str = ".terraform";

/// Errors from the init step.
#[derive(Debug, Error)]
pub enum InitError {
    /// The build cache could not be removed.
    #[error("failed to remove '{path}': {source}")]
    CacheReset {
        /// The cache directory
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The tool could not be started.
    #[error("failed to run '{program}': {source}")]
    Spawn {
        /// Executable name or path
        program: String,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The tool exited unsuccessfully.
    #[error("'{program} init' exited with {}", describe_exit(.code))]
    Failed {
        /// Executable name or path
        program: String,
        /// Exit code, if the process was not killed by a signal
        code: Option<i32>,
    },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "a signal".to_string(),
    }
}

/// Remove `dir/.terraform` recursively. A missing directory is fine.
pub fn reset_build_cache(dir: &Path) -> Result<bool, InitError> {
    let path = dir.join(BUILD_CACHE_DIR);
    match fs::remove_dir_all(&path) {
        Ok(()) => {
            debug!(path = %path.display(), "removed build cache");
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(source) => Err(InitError::CacheReset { path, source }),
    }
}

/// One `terraform init` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerraformInit {
    /// Executable to run
    pub program: String,
    /// Working directory
    pub workdir: PathBuf,
    /// Arguments after `init`
    pub args: Vec<String>,
}

impl TerraformInit {
    /// Create an invocation with no extra arguments.
    pub fn new(program: impl Into<String>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            workdir: workdir.into(),
            args: Vec::new(),
        }
    }

    /// Append arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Reset the build cache, then run the tool to completion.
    pub fn run(&self) -> Result<(), InitError> {
        reset_build_cache(&self.workdir)?;

        info!(program = %self.program, args = self.args.len(), "running init");
        let status = Command::new(&self.program)
            .arg("init")
            .args(&self.args)
            .current_dir(&self.workdir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| InitError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(InitError::Failed {
                program: self.program.clone(),
                code: status.code(),
            })
        }
    }
}

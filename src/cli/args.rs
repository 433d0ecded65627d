//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Errors only

use clap::Parser;
use std::path::{Path, PathBuf};

use crate::core::backend::BackendMode;
use crate::core::config::Config;
use crate::core::store::resolve_var_file;
use crate::engine::{RunError, RunOptions};
use crate::ui::output::Verbosity;

/// tfi - Generate Terraform variables and backend settings, then run init
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "tfi")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Name of a .tfvars file in --tfvars-dir (the .tfvars suffix may be omitted)
    #[arg(value_name = "NAME")]
    pub name: Option<String>,

    /// AWS region [default: eu-west-1]
    #[arg(short, long)]
    pub region: Option<String>,

    /// Directory containing tfvars files [default: tfvars]
    #[arg(long, value_name = "DIR")]
    pub tfvars_dir: Option<String>,

    /// Generate tfvars but don't run terraform init
    #[arg(short = 'n', long)]
    pub no_init: bool,

    /// Don't merge GitLab CI/CD variables
    #[arg(long)]
    pub no_remote_vars: bool,

    /// Explicit variable file path (instead of NAME)
    #[arg(long, value_name = "PATH", conflicts_with = "name")]
    pub var_file: Option<PathBuf>,

    /// How backend settings reach terraform init [default: args]
    #[arg(long, value_enum)]
    pub backend_mode: Option<BackendMode>,

    /// Project path for the session name and state key
    #[arg(long, value_name = "PATH")]
    pub project_path: Option<String>,

    /// Run as if tfi was started in this directory
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Errors only
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    /// Output verbosity.
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.debug)
    }

    /// Apply flags over configuration to produce run settings.
    ///
    /// Relative paths are resolved against `workdir`.
    pub fn to_options(&self, config: &Config, workdir: &Path) -> Result<RunOptions, RunError> {
        let var_file = match (&self.var_file, &self.name) {
            (Some(path), _) => workdir.join(path),
            (None, Some(name)) if !name.trim().is_empty() => {
                let dir = self.tfvars_dir.clone().unwrap_or_else(|| config.tfvars_dir());
                resolve_var_file(&workdir.join(dir), name.trim())
            }
            _ => return Err(RunError::Usage("missing required arg: NAME".into())),
        };

        let region = self.region.clone().unwrap_or_else(|| config.region());
        crate::core::config::schema::validate_region(&region)?;

        Ok(RunOptions {
            workdir: workdir.to_path_buf(),
            var_file,
            region,
            no_init: self.no_init || config.no_init(),
            remote_vars: !self.no_remote_vars && config.remote_vars(),
            backend_mode: self.backend_mode.unwrap_or_else(|| config.backend_mode()),
            gitlab_api: config.gitlab_api(),
            project_path: self.project_path.clone().or_else(|| config.project_path()),
            terraform_bin: config.terraform_bin(),
            ssm_endpoint: config.ssm_endpoint(),
            verbosity: self.verbosity(),
        })
    }
}

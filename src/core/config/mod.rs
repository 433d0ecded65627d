//! core::config
//!
//! Configuration loading.
//!
//! # Overview
//!
//! tfi has two configuration scopes:
//! - **Global**: User-level settings
//! - **Repo**: Settings for one Terraform module directory
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Repo config file
//! 4. CLI flags (applied by the caller)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$TFI_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/tfi/config.toml`
//! 3. `~/.tfi/config.toml`
//!
//! # Repo Config Location
//!
//! `.tfi.toml` in the module directory.
//!
//! # Example
//!
//! ```no_run
//! use tfi::core::config::Config;
//! use std::path::Path;
//!
//! let config = Config::load(Some(Path::new("/path/to/module"))).unwrap();
//! println!("Region: {}", config.region());
//! println!("Var files in: {}", config.tfvars_dir());
//! ```

pub mod schema;

pub use schema::FileConfig;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::core::backend::BackendMode;

/// Default cloud region.
pub const DEFAULT_REGION: &str = "eu-west-1";

/// Default directory holding `.tfvars` files.
pub const DEFAULT_TFVARS_DIR: &str = "tfvars";

/// Default hosting API base URL.
pub const DEFAULT_GITLAB_API: &str = "https://gitlab.com/api/v4";

/// Default Terraform executable.
pub const DEFAULT_TERRAFORM_BIN: &str = "terraform";

/// Repo config file name.
pub const REPO_CONFIG_FILE: &str = ".tfi.toml";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Merged configuration from all files.
///
/// Accessors apply precedence and defaults. Repo config overrides global
/// config.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: FileConfig,
    /// Repository configuration (if present)
    pub repo: Option<FileConfig>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// If `module_dir` is provided, also loads its `.tfi.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed or
    /// holds an invalid value. Missing files are not an error.
    pub fn load(module_dir: Option<&Path>) -> Result<Self, ConfigError> {
        let (global, global_path) = match Self::global_candidates()
            .into_iter()
            .find(|p| p.is_file())
        {
            Some(path) => (Self::read_file(&path)?, Some(path)),
            None => (FileConfig::default(), None),
        };

        let (repo, repo_path) = match module_dir.map(|d| d.join(REPO_CONFIG_FILE)) {
            Some(path) if path.is_file() => (Some(Self::read_file(&path)?), Some(path)),
            _ => (None, None),
        };

        global.validate()?;
        if let Some(ref r) = repo {
            r.validate()?;
        }

        debug!(
            global = ?global_path,
            repo = ?repo_path,
            "loaded configuration"
        );

        Ok(Config { global, repo })
    }

    /// Global config locations in search order.
    fn global_candidates() -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if let Ok(path) = std::env::var("TFI_CONFIG") {
            candidates.push(PathBuf::from(path));
        }
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            candidates.push(PathBuf::from(xdg_home).join("tfi/config.toml"));
        }
        if let Some(home) = dirs::home_dir() {
            candidates.push(home.join(".tfi/config.toml"));
        }
        candidates
    }

    fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// First value set by repo, then global.
    fn pick<T: Clone>(&self, f: impl Fn(&FileConfig) -> Option<T>) -> Option<T> {
        self.repo.as_ref().and_then(&f).or_else(|| f(&self.global))
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Cloud region. Defaults to [`DEFAULT_REGION`].
    pub fn region(&self) -> String {
        self.pick(|c| c.region.clone())
            .unwrap_or_else(|| DEFAULT_REGION.to_string())
    }

    /// Directory of `.tfvars` files. Defaults to [`DEFAULT_TFVARS_DIR`].
    pub fn tfvars_dir(&self) -> String {
        self.pick(|c| c.tfvars_dir.clone())
            .unwrap_or_else(|| DEFAULT_TFVARS_DIR.to_string())
    }

    /// Whether to skip `terraform init`. Defaults to `false`.
    pub fn no_init(&self) -> bool {
        self.pick(|c| c.no_init).unwrap_or(false)
    }

    /// Whether to fetch hosting-project variables. Defaults to `true`.
    pub fn remote_vars(&self) -> bool {
        self.pick(|c| c.remote_vars).unwrap_or(true)
    }

    /// Backend delivery mode. Defaults to [`BackendMode::Args`].
    pub fn backend_mode(&self) -> BackendMode {
        self.pick(|c| c.backend_mode).unwrap_or_default()
    }

    /// Hosting API base URL. Defaults to [`DEFAULT_GITLAB_API`].
    pub fn gitlab_api(&self) -> String {
        self.pick(|c| c.gitlab_api.clone())
            .unwrap_or_else(|| DEFAULT_GITLAB_API.to_string())
    }

    /// Project path override, if configured.
    pub fn project_path(&self) -> Option<String> {
        self.pick(|c| c.project_path.clone())
    }

    /// Terraform executable. Defaults to [`DEFAULT_TERRAFORM_BIN`].
    pub fn terraform_bin(&self) -> String {
        self.pick(|c| c.terraform_bin.clone())
            .unwrap_or_else(|| DEFAULT_TERRAFORM_BIN.to_string())
    }

    /// Parameter-store endpoint override, if configured.
    pub fn ssm_endpoint(&self) -> Option<String> {
        self.pick(|c| c.ssm_endpoint.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_without_files() {
        let config = Config::default();

        assert_eq!(config.region(), "eu-west-1");
        assert_eq!(config.tfvars_dir(), "tfvars");
        assert!(!config.no_init());
        assert!(config.remote_vars());
        assert_eq!(config.backend_mode(), BackendMode::Args);
        assert_eq!(config.gitlab_api(), "https://gitlab.com/api/v4");
        assert!(config.project_path().is_none());
        assert_eq!(config.terraform_bin(), "terraform");
        assert!(config.ssm_endpoint().is_none());
    }

    #[test]
    fn load_repo_config() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(REPO_CONFIG_FILE),
            r#"
            region = "us-east-1"
            backend_mode = "file"
            "#,
        )
        .unwrap();

        let config = Config::load(Some(temp.path())).unwrap();

        assert_eq!(config.region(), "us-east-1");
        assert_eq!(config.backend_mode(), BackendMode::File);
        assert!(config.repo.is_some());
    }

    #[test]
    fn unknown_fields_rejected() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(REPO_CONFIG_FILE),
            "region = \"us-east-1\"\nunknown_field = true\n",
        )
        .unwrap();

        assert!(matches!(
            Config::load(Some(temp.path())),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn invalid_value_rejected() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(REPO_CONFIG_FILE), "region = \"Not A Region\"\n").unwrap();

        assert!(matches!(
            Config::load(Some(temp.path())),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn repo_overrides_global() {
        let config = Config {
            global: FileConfig {
                region: Some("us-east-1".into()),
                tfvars_dir: Some("envs".into()),
                ..Default::default()
            },
            repo: Some(FileConfig {
                region: Some("eu-central-1".into()),
                ..Default::default()
            }),
        };

        assert_eq!(config.region(), "eu-central-1");
        assert_eq!(config.tfvars_dir(), "envs");
    }
}

//! core::config::schema
//!
//! Configuration file schema.
//!
//! Global and repository files share one schema. Every key is optional;
//! an absent key falls through to the next layer down.
//!
//! # Validation
//!
//! Values are validated after parsing (e.g. `region` must look like a
//! region name, `gitlab_api` and `ssm_endpoint` must be http(s) URLs).

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::backend::BackendMode;

/// One configuration file.
///
/// # Example
///
/// ```toml
/// region = "eu-west-2"
/// tfvars_dir = "environments"
/// no_init = false
/// remote_vars = true
/// backend_mode = "file"
/// gitlab_api = "https://gitlab.example.com/api/v4"
/// project_path = "platform/network"
/// terraform_bin = "/usr/local/bin/terraform"
/// ssm_endpoint = "http://localhost:4566"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Cloud region
    pub region: Option<String>,

    /// Directory holding `.tfvars` files
    pub tfvars_dir: Option<String>,

    /// Skip `terraform init`
    pub no_init: Option<bool>,

    /// Fetch hosting-project variables
    pub remote_vars: Option<bool>,

    /// How backend configuration is delivered
    pub backend_mode: Option<BackendMode>,

    /// Hosting API base URL
    pub gitlab_api: Option<String>,

    /// Override of the hosting-project path
    pub project_path: Option<String>,

    /// Terraform executable
    pub terraform_bin: Option<String>,

    /// Parameter-store endpoint, for local AWS emulators
    pub ssm_endpoint: Option<String>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(region) = &self.region {
            validate_region(region)?;
        }

        for (key, value) in [
            ("tfvars_dir", &self.tfvars_dir),
            ("project_path", &self.project_path),
            ("terraform_bin", &self.terraform_bin),
        ] {
            if matches!(value, Some(v) if v.trim().is_empty()) {
                return Err(ConfigError::InvalidValue(format!("{} cannot be empty", key)));
            }
        }

        for (key, value) in [
            ("gitlab_api", &self.gitlab_api),
            ("ssm_endpoint", &self.ssm_endpoint),
        ] {
            if let Some(url) = value {
                validate_http_url(key, url)?;
            }
        }

        Ok(())
    }
}

fn validate_http_url(key: &str, value: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(value).map_err(|e| {
        ConfigError::InvalidValue(format!("invalid {} '{}': {}", key, value, e))
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidValue(format!(
            "{} must be an http(s) URL, got '{}'",
            key, value
        )));
    }
    Ok(())
}

/// Check that `region` looks like `xx-name-N`.
pub fn validate_region(region: &str) -> Result<(), ConfigError> {
    let valid = !region.is_empty()
        && region.contains('-')
        && region
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue(format!(
            "invalid region '{}'",
            region
        )))
    }
}

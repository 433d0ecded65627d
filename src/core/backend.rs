//! core::backend
//!
//! Remote-state backend coordinates and their two emission forms.
//!
//! # Derivation
//!
//! - bucket: `{env}-{region}-remote-state`
//! - key: `{project}/terraform.tfstate`
//! - lock table: `{env}-{region}-remote-state-lock`
//! - encrypt: always `true`
//!
//! # Emission
//!
//! A [`BackendDescriptor`] is rendered either as `-backend-config=` CLI
//! arguments ([`BackendDescriptor::cli_args`]) or as a standalone module
//! file ([`BackendDescriptor::to_document`]). Both walk the same field list
//! ([`BackendDescriptor::fields`]) so they cannot drift apart.
//!
//! # Backend Block Guarantee
//!
//! In argument mode Terraform only honours `-backend-config` when the module
//! declares an `s3` backend. [`ensure_s3_backend`] appends an empty
//! `backend "s3" {}` to the first `terraform` block of each first-level
//! module file that lacks one. The edit goes through the format-preserving
//! `hcl::edit` tree, so comments and layout elsewhere in the file survive,
//! and the result is re-parsed before it replaces the original.

use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use hcl::edit::parser::parse_body;
use hcl::edit::structure::{Block as EditBlock, BlockLabel as EditLabel};
use hcl::edit::{Decor, Decorate, Ident};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::document::{Block, Document, Value};
use super::identity::Identity;
use super::schema::{for_each_module_file, SchemaError};

/// File written in [`BackendMode::File`].
pub const BACKEND_FILE_NAME: &str = "tfi_backend.tf";

/// Backend type label.
pub const BACKEND_TYPE: &str = "s3";

/// Errors from backend emission.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Module files could not be scanned.
    #[error(transparent)]
    Scan(#[from] SchemaError),

    /// A module file could not be edited safely.
    #[error("cannot add backend block to '{path}': {message}")]
    Edit {
        /// The module file
        path: PathBuf,
        /// Parser diagnostic
        message: String,
    },

    /// A file could not be written.
    #[error("failed to write '{path}': {source}")]
    Write {
        /// The path being written
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

/// How backend configuration reaches `terraform init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    /// Pass `-backend-config=` arguments
    #[default]
    Args,
    /// Write a standalone backend file
    File,
}

impl std::fmt::Display for BackendMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendMode::Args => write!(f, "args"),
            BackendMode::File => write!(f, "file"),
        }
    }
}

/// A single backend setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Boolean setting
    Bool(bool),
    /// String setting
    Text(String),
}

impl FieldValue {
    fn to_value(&self) -> Value {
        match self {
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Text(s) => Value::string(s.clone()),
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

/// S3 backend coordinates for one environment and project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendDescriptor {
    /// Server-side encryption (always on)
    pub encrypt: bool,
    /// Bucket region
    pub region: String,
    /// State bucket
    pub bucket: String,
    /// State object key
    pub key: String,
    /// Role assumed to reach the bucket
    pub role_arn: String,
    /// Session name for the assumed role
    pub session_name: String,
    /// DynamoDB lock table
    pub dynamodb_table: String,
}

/// Derive the backend descriptor.
///
/// # Example
///
/// ```
/// use tfi::core::backend::build_backend;
///
/// let backend = build_backend("prod", "eu-west-1", "team/infra", "arn", "session");
/// assert_eq!(backend.bucket, "prod-eu-west-1-remote-state");
/// assert_eq!(backend.key, "team/infra/terraform.tfstate");
/// assert_eq!(backend.dynamodb_table, "prod-eu-west-1-remote-state-lock");
/// ```
pub fn build_backend(
    env: &str,
    region: &str,
    project_path: &str,
    role_arn: &str,
    session_name: &str,
) -> BackendDescriptor {
    BackendDescriptor {
        encrypt: true,
        region: region.to_string(),
        bucket: format!("{}-{}-remote-state", env, region),
        key: format!("{}/terraform.tfstate", project_path),
        role_arn: role_arn.to_string(),
        session_name: session_name.to_string(),
        dynamodb_table: format!("{}-{}-remote-state-lock", env, region),
    }
}

impl BackendDescriptor {
    /// Derive from a resolved identity.
    pub fn from_identity(identity: &Identity) -> Self {
        build_backend(
            &identity.environment,
            &identity.region,
            &identity.project_path,
            &identity.role_arn,
            &identity.session_name,
        )
    }

    /// The seven settings in emission order.
    pub fn fields(&self) -> [(&'static str, FieldValue); 7] {
        [
            ("encrypt", FieldValue::Bool(self.encrypt)),
            ("region", FieldValue::Text(self.region.clone())),
            ("bucket", FieldValue::Text(self.bucket.clone())),
            ("key", FieldValue::Text(self.key.clone())),
            ("role_arn", FieldValue::Text(self.role_arn.clone())),
            ("session_name", FieldValue::Text(self.session_name.clone())),
            ("dynamodb_table", FieldValue::Text(self.dynamodb_table.clone())),
        ]
    }

    /// `-backend-config=name=value` arguments for `terraform init`.
    pub fn cli_args(&self) -> Vec<String> {
        self.fields()
            .iter()
            .map(|(name, value)| format!("-backend-config={}={}", name, value))
            .collect()
    }

    /// Standalone `terraform { backend "s3" { ... } }` document.
    pub fn to_document(&self) -> Document {
        let mut backend = Block::new("backend", [BACKEND_TYPE]);
        for (name, value) in self.fields() {
            backend.body.set_attribute(name, value.to_value());
        }
        let mut terraform = Block::new("terraform", Vec::<String>::new());
        terraform.body.append_block(backend);

        let mut doc = Document::new();
        doc.body_mut().append_block(terraform);
        doc
    }

    /// Write the standalone document to `dir/`[`BACKEND_FILE_NAME`].
    pub fn write_file(&self, dir: &Path) -> Result<PathBuf, BackendError> {
        let path = dir.join(BACKEND_FILE_NAME);
        fs::write(&path, self.to_document().to_bytes()).map_err(|source| {
            BackendError::Write {
                path: path.clone(),
                source,
            }
        })?;
        info!(path = %path.display(), "wrote backend file");
        Ok(path)
    }
}

/// Insert `backend "s3" {}` into module files whose `terraform` block lacks it.
///
/// Returns the files that were rewritten.
pub fn ensure_s3_backend(root: &Path) -> Result<Vec<PathBuf>, BackendError> {
    let mut pending = Vec::new();
    for_each_module_file(root, |path, doc| {
        if let Some(terraform) = doc.body().first_block("terraform") {
            if terraform
                .body
                .first_matching_block("backend", &[BACKEND_TYPE])
                .is_none()
            {
                pending.push(path.to_path_buf());
            }
        }
        Ok(())
    })?;

    let mut rewritten = Vec::new();
    for path in pending {
        let source = fs::read_to_string(&path).map_err(|source| {
            BackendError::Scan(SchemaError::Read {
                path: path.clone(),
                source,
            })
        })?;
        let updated = insert_backend_block(&source).map_err(|message| BackendError::Edit {
            path: path.clone(),
            message,
        })?;
        if let Some(updated) = updated {
            fs::write(&path, updated).map_err(|source| BackendError::Write {
                path: path.clone(),
                source,
            })?;
            debug!(path = %path.display(), "added empty s3 backend block");
            rewritten.push(path);
        }
    }
    Ok(rewritten)
}

/// Append an empty s3 backend block to the first top-level `terraform`
/// block. Returns `Ok(None)` if the source has no such block.
fn insert_backend_block(source: &str) -> Result<Option<String>, String> {
    let mut body = parse_body(source).map_err(|e| e.to_string())?;
    let Some(terraform) = body.get_blocks_mut("terraform").next() else {
        return Ok(None);
    };

    let inner = &mut terraform.body;
    if inner.prefer_oneline() {
        // `terraform { ... }` on one line is reflowed onto separate lines.
        inner.set_prefer_oneline(false);
        inner.decor_mut().clear();
        for mut structure in inner.iter_mut() {
            *structure.decor_mut() = Decor::new("  ", "");
        }
    }

    let mut backend = EditBlock::new(Ident::new("backend"));
    backend.labels.push(EditLabel::from(BACKEND_TYPE));
    backend.body.set_prefer_oneline(true);
    backend.decor_mut().set_prefix("  ");
    inner.push(backend);

    let updated = body.to_string();
    hcl::parse(&updated).map_err(|e| e.to_string())?;
    Ok(Some(updated))
}

//! core::store
//!
//! Loading and writing variable files.
//!
//! # Design
//!
//! A named variable file is the environment's source of local values. A
//! missing file is not an error: [`load`] returns an empty document so the
//! run can still produce a complete generated file from remote values.
//! Every other read failure is propagated.
//!
//! # Example
//!
//! ```no_run
//! use tfi::core::store::{environment_name, load, resolve_var_file};
//! use std::path::Path;
//!
//! let path = resolve_var_file(Path::new("tfvars"), "prod");
//! assert_eq!(environment_name(&path), "prod");
//!
//! let loaded = load(&path).unwrap();
//! println!("existing file: {}", loaded.existed);
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use super::document::{Document, DocumentError};

/// Suffix appended to variable file names that lack it.
pub const VAR_FILE_SUFFIX: &str = ".tfvars";

/// Environment name used when none can be derived from the file name.
pub const DEFAULT_ENVIRONMENT: &str = "default";

/// Errors from variable file operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The file exists but could not be read.
    #[error("failed to read '{path}': {source}")]
    Read {
        /// The path being read
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The file could not be written.
    #[error("failed to write '{path}': {source}")]
    Write {
        /// The path being written
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The file is not valid HCL.
    #[error(transparent)]
    Parse(#[from] DocumentError),
}

/// Result of [`load`].
#[derive(Debug, Clone)]
pub struct LoadedFile {
    /// The parsed document (empty if the file was absent)
    pub document: Document,
    /// Whether the file existed
    pub existed: bool,
}

/// Resolve a variable file name under `dir`, appending `.tfvars` if missing.
///
/// # Example
///
/// ```
/// use tfi::core::store::resolve_var_file;
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(
///     resolve_var_file(Path::new("tfvars"), "prod"),
///     PathBuf::from("tfvars/prod.tfvars")
/// );
/// assert_eq!(
///     resolve_var_file(Path::new("tfvars"), "prod.tfvars"),
///     PathBuf::from("tfvars/prod.tfvars")
/// );
/// ```
pub fn resolve_var_file(dir: &Path, name: &str) -> PathBuf {
    if name.ends_with(VAR_FILE_SUFFIX) {
        dir.join(name)
    } else {
        dir.join(format!("{}{}", name, VAR_FILE_SUFFIX))
    }
}

/// Environment name for a variable file: its base name without extension.
///
/// # Example
///
/// ```
/// use tfi::core::store::environment_name;
/// use std::path::Path;
///
/// assert_eq!(environment_name(Path::new("tfvars/staging.tfvars")), "staging");
/// assert_eq!(environment_name(Path::new("")), "default");
/// ```
pub fn environment_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_ENVIRONMENT)
        .to_string()
}

/// Load a variable file, or an empty document if it does not exist.
///
/// A trailing newline is added before parsing when the file lacks one.
///
/// # Errors
///
/// - [`StoreError::Read`] for any I/O failure other than "not found"
/// - [`StoreError::Parse`] if the file is malformed
pub fn load(path: &Path) -> Result<LoadedFile, StoreError> {
    let mut source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "variable file absent, starting empty");
            return Ok(LoadedFile {
                document: Document::new(),
                existed: false,
            });
        }
        Err(source) => {
            return Err(StoreError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    if !source.ends_with('\n') {
        source.push('\n');
    }

    let document = Document::parse(&source, &path.display().to_string())?;
    Ok(LoadedFile {
        document,
        existed: true,
    })
}

/// Serialize a document canonically.
pub fn serialize(document: &Document) -> Vec<u8> {
    document.to_bytes()
}

/// Serialize and write a document to `path`.
pub fn write(path: &Path, document: &Document) -> Result<(), StoreError> {
    fs::write(path, serialize(document)).map_err(|source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    })
}

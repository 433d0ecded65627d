//! core::schema
//!
//! Discovery of the variables a Terraform module declares.
//!
//! # Scan Rules
//!
//! - Only the immediate contents of the root directory are read. Nested
//!   directories (child modules, `.terraform/`) are skipped entirely.
//! - Only files with the `.tf` extension are parsed.
//! - The first label of every top-level `variable` block is recorded.
//! - Duplicate declarations collapse into one name.
//! - A directory with no module files yields an empty schema.
//!
//! # Example
//!
//! ```no_run
//! use tfi::core::schema::scan_schema;
//! use std::path::Path;
//!
//! let schema = scan_schema(Path::new(".")).unwrap();
//! if schema.has("db_password") {
//!     println!("module declares db_password");
//! }
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use super::document::{Document, DocumentError};

/// Extension of declarative module files.
pub const MODULE_FILE_EXTENSION: &str = "tf";

/// Block type that declares an input variable.
const VARIABLE_BLOCK: &str = "variable";

/// Errors from scanning module files.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A directory or file could not be read.
    #[error("failed to read '{path}': {source}")]
    Read {
        /// The path being read
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// A module file is not valid HCL.
    #[error(transparent)]
    Parse(#[from] DocumentError),
}

/// The set of variable names a module declares.
///
/// Built once per run and never modified afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableSchema {
    names: BTreeSet<String>,
}

impl VariableSchema {
    /// Whether the module declares `name`.
    pub fn has(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Number of declared variables.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True when no variables are declared.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Declared names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for VariableSchema {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Scan the first level of `root` for variable declarations.
///
/// # Errors
///
/// - [`SchemaError::Read`] if the directory or a module file is unreadable
/// - [`SchemaError::Parse`] if a module file is malformed
pub fn scan_schema(root: &Path) -> Result<VariableSchema, SchemaError> {
    let mut names = BTreeSet::new();

    for_each_module_file(root, |path, doc| {
        for block in doc.body().blocks() {
            if block.ident == VARIABLE_BLOCK {
                if let Some(name) = block.first_label() {
                    names.insert(name.to_string());
                }
            }
        }
        debug!(path = %path.display(), declared = names.len(), "scanned module file");
        Ok(())
    })?;

    Ok(VariableSchema { names })
}

/// List first-level module files under `root`, sorted by path.
pub fn module_files(root: &Path) -> Result<Vec<PathBuf>, SchemaError> {
    let entries = fs::read_dir(root).map_err(|source| SchemaError::Read {
        path: root.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| SchemaError::Read {
            path: root.to_path_buf(),
            source,
        })?;
        let file_type = entry.file_type().map_err(|source| SchemaError::Read {
            path: entry.path(),
            source,
        })?;
        if file_type.is_dir() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some(MODULE_FILE_EXTENSION) {
            files.push(path);
        }
    }

    // read_dir order is platform-dependent
    files.sort();
    Ok(files)
}

/// Parse every first-level module file under `root` and hand it to `f`.
pub fn for_each_module_file<F>(root: &Path, mut f: F) -> Result<(), SchemaError>
where
    F: FnMut(&Path, &Document) -> Result<(), SchemaError>,
{
    for path in module_files(root)? {
        let source = fs::read_to_string(&path).map_err(|source| SchemaError::Read {
            path: path.clone(),
            source,
        })?;
        let doc = Document::parse(&source, &path.display().to_string())?;
        f(&path, &doc)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn empty_directory_yields_empty_schema() {
        let dir = TempDir::new().unwrap();
        let schema = scan_schema(dir.path()).unwrap();
        assert!(schema.is_empty());
    }

    #[test]
    fn collects_variable_names() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "variables.tf",
            "variable \"env\" {}\nvariable \"db_password\" {\n  sensitive = true\n}\n",
        );
        write(
            dir.path(),
            "main.tf",
            "resource \"null_resource\" \"x\" {}\nvariable \"region\" {}\n",
        );

        let schema = scan_schema(dir.path()).unwrap();
        let names: Vec<_> = schema.names().collect();
        assert_eq!(names, vec!["db_password", "env", "region"]);
    }

    #[test]
    fn duplicates_collapse() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.tf", "variable \"env\" {}\n");
        write(dir.path(), "b.tf", "variable \"env\" {}\n");

        let schema = scan_schema(dir.path()).unwrap();
        assert_eq!(schema.len(), 1);
    }

    #[test]
    fn does_not_recurse_into_subdirectories() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "main.tf", "variable \"top\" {}\n");
        let nested = dir.path().join("modules").join("child");
        fs::create_dir_all(&nested).unwrap();
        write(&nested, "main.tf", "variable \"nested\" {}\n");

        let schema = scan_schema(dir.path()).unwrap();
        assert!(schema.has("top"));
        assert!(!schema.has("nested"));
    }

    #[test]
    fn ignores_other_extensions() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "notes.txt", "variable \"ignored\" {}\n");
        write(dir.path(), "prod.tfvars", "env = \"prod\"\n");
        write(dir.path(), "main.tf", "variable \"kept\" {}\n");

        let schema = scan_schema(dir.path()).unwrap();
        assert_eq!(schema.names().collect::<Vec<_>>(), vec!["kept"]);
    }

    #[test]
    fn malformed_module_file_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "broken.tf", "variable \"x\" {\n");

        let err = scan_schema(dir.path()).unwrap_err();
        assert!(matches!(err, SchemaError::Parse(_)));
        assert!(err.to_string().contains("broken.tf"));
    }

    #[test]
    fn missing_root_is_a_read_error() {
        let dir = TempDir::new().unwrap();
        let err = scan_schema(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, SchemaError::Read { .. }));
    }
}

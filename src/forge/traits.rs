//! forge::traits
//!
//! Forge trait definition for reading project metadata and CI/CD variables.
//!
//! # Design
//!
//! The `Forge` trait is async because every operation is network I/O.
//! Listing operations return the complete result set; implementations are
//! responsible for walking every page.
//!
//! # Example
//!
//! ```ignore
//! use tfi::forge::{Forge, ForgeError};
//!
//! async fn show(forge: &dyn Forge) -> Result<(), ForgeError> {
//!     let project = forge.get_project("team/infra").await?;
//!     for var in forge.list_project_variables(project.id).await? {
//!         println!("{}", var.key);
//!     }
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Errors from forge operations.
///
/// These error types map to common failure modes when talking to a
/// hosting service API.
#[derive(Debug, Clone, Error)]
pub enum ForgeError {
    /// Authentication is required but no token is available.
    #[error("authentication required: set GITLAB_TOKEN")]
    AuthRequired,

    /// Authentication failed (invalid token, expired, insufficient permissions).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),
}

/// A hosted project.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Project {
    /// Numeric project ID
    pub id: u64,
    /// Short path (last segment)
    pub path: String,
    /// Full path including every parent group
    pub path_with_namespace: String,
}

impl Project {
    /// Paths of every ancestor group, outermost first.
    ///
    /// # Example
    ///
    /// ```
    /// use tfi::forge::Project;
    ///
    /// let project = Project {
    ///     id: 1,
    ///     path: "network".into(),
    ///     path_with_namespace: "acme/platform/network".into(),
    /// };
    /// assert_eq!(project.ancestor_groups(), vec!["acme", "acme/platform"]);
    /// ```
    pub fn ancestor_groups(&self) -> Vec<String> {
        let segments: Vec<&str> = self
            .path_with_namespace
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        let parents = segments.len().saturating_sub(1);
        (1..=parents).map(|n| segments[..n].join("/")).collect()
    }
}

/// A CI/CD variable.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Variable {
    /// Variable name
    pub key: String,
    /// Variable value
    pub value: String,
}

// Values may be secrets
impl std::fmt::Debug for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Variable")
            .field("key", &self.key)
            .field("value", &"<redacted>")
            .finish()
    }
}

impl Variable {
    /// Create a variable.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A hosting service that stores projects and their variables.
#[async_trait]
pub trait Forge: Send + Sync {
    /// Get the forge name (e.g., "gitlab").
    fn name(&self) -> &'static str;

    /// Look up a project by its full path.
    async fn get_project(&self, path: &str) -> Result<Project, ForgeError>;

    /// List every variable of a group, across all pages.
    async fn list_group_variables(&self, group_path: &str) -> Result<Vec<Variable>, ForgeError>;

    /// List every variable of a project, across all pages.
    async fn list_project_variables(&self, project_id: u64) -> Result<Vec<Variable>, ForgeError>;
}

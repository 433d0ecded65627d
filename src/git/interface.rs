//! git::interface
//!
//! Git interface implementation using git2.
//!
//! # Architecture
//!
//! The `Git` struct is the only way to interact with a Git repository.
//! No other module should import `git2` directly.
//!
//! # Error Handling
//!
//! Git errors are categorized into typed variants:
//! - [`GitError::NotARepo`]: Not inside a Git repository
//! - [`GitError::NoRemote`]: The repository has no remotes
//! - [`GitError::UnrecognizedRemote`]: A remote URL has no project path
//!
//! # Example
//!
//! ```ignore
//! use tfi::git::Git;
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! let path = git.project_path()?;
//! println!("hosted at {}", path);
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::forge::gitlab::parse_gitlab_url;

/// Remote preferred when several exist.
pub const PREFERRED_REMOTE: &str = "origin";

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported")]
    BareRepo,

    /// The repository has no remotes.
    #[error("repository has no remotes")]
    NoRemote,

    /// A remote URL does not contain a `group/project` path.
    #[error("cannot determine project path from remote '{remote}' ({url})")]
    UnrecognizedRemote {
        /// Remote name
        remote: String,
        /// Remote URL
        url: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        GitError::Internal {
            message: err.message().to_string(),
        }
    }
}

/// Handle to a non-bare repository.
pub struct Git {
    /// The underlying git2 repository
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl Git {
    // =========================================================================
    // Repository Opening
    // =========================================================================

    /// Open a repository at the given path.
    ///
    /// Uses `git2::Repository::discover` to find the repository root,
    /// so `path` can be any directory within the repository.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found
    /// - [`GitError::BareRepo`] if the repository has no working directory
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;

        if repo.is_bare() {
            return Err(GitError::BareRepo);
        }

        Ok(Self { repo })
    }

    // =========================================================================
    // Remote Operations
    // =========================================================================

    /// Get the URL for a remote.
    ///
    /// Returns `None` if the remote doesn't exist.
    pub fn remote_url(&self, name: &str) -> Result<Option<String>, GitError> {
        match self.repo.find_remote(name) {
            Ok(remote) => Ok(remote.url().map(String::from)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get the default remote name.
    ///
    /// Prefers [`PREFERRED_REMOTE`], otherwise the first remote found, or
    /// `None` if no remotes exist.
    pub fn default_remote(&self) -> Result<Option<String>, GitError> {
        let remotes = self.repo.remotes()?;

        if remotes.iter().flatten().any(|name| name == PREFERRED_REMOTE) {
            return Ok(Some(PREFERRED_REMOTE.to_string()));
        }

        Ok(remotes.iter().flatten().next().map(String::from))
    }

    /// Hosting-project path (`group/.../project`) of the default remote.
    pub fn project_path(&self) -> Result<String, GitError> {
        let remote = self.default_remote()?.ok_or(GitError::NoRemote)?;
        let url = self.remote_url(&remote)?.ok_or(GitError::NoRemote)?;
        debug!(%remote, %url, "deriving project path");

        parse_gitlab_url(&url).ok_or(GitError::UnrecognizedRemote { remote, url })
    }
}

//! git
//!
//! Single interface for Git repository access.
//!
//! # Architecture
//!
//! This module is the **only doorway** to Git. No other module should
//! import `git2`. The run only reads from the repository: it discovers the
//! repository enclosing the module directory and derives the hosting
//! project path from a remote URL.
//!
//! # Example
//!
//! ```ignore
//! use tfi::git::Git;
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! assert_eq!(git.project_path()?, "team/infra");
//! ```

mod interface;

pub use interface::{Git, GitError, PREFERRED_REMOTE};

//! forge::mock
//!
//! Mock forge implementation for deterministic testing.
//!
//! # Design
//!
//! The mock forge stores projects and variables in memory, records every
//! call, and can be configured to fail a specific operation.
//!
//! # Example
//!
//! ```
//! use tfi::forge::mock::MockForge;
//! use tfi::forge::Forge;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let forge = MockForge::new()
//!     .with_project(3, "team/infra")
//!     .with_project_variable(3, "db_password", "secret");
//!
//! let project = forge.get_project("team/infra").await.unwrap();
//! let vars = forge.list_project_variables(project.id).await.unwrap();
//! assert_eq!(vars[0].key, "db_password");
//! # });
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::traits::{Forge, ForgeError, Project, Variable};

/// Mock forge for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone, Default)]
pub struct MockForge {
    /// Internal state shared across clones.
    inner: Arc<Mutex<MockForgeInner>>,
}

/// Internal mutable state.
#[derive(Debug, Default)]
struct MockForgeInner {
    /// Projects by full path.
    projects: HashMap<String, Project>,
    /// Group variables by group path.
    group_vars: HashMap<String, Vec<Variable>>,
    /// Project variables by project ID.
    project_vars: HashMap<u64, Vec<Variable>>,
    /// Operation to fail on (for testing error paths).
    fail_on: Option<FailOn>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail get_project with the given error.
    GetProject(ForgeError),
    /// Fail list_group_variables with the given error.
    ListGroupVariables(ForgeError),
    /// Fail list_project_variables with the given error.
    ListProjectVariables(ForgeError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    /// Project lookup by namespaced path.
    GetProject { path: String },
    /// Variable listing for one ancestor group.
    ListGroupVariables { group_path: String },
    /// Variable listing for the project itself.
    ListProjectVariables { project_id: u64 },
}

impl MockForge {
    /// Create an empty mock forge.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockForgeInner> {
        // a panicking test thread must not hide the recorded state
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a project.
    pub fn with_project(self, id: u64, path_with_namespace: &str) -> Self {
        let path = path_with_namespace
            .rsplit('/')
            .next()
            .unwrap_or(path_with_namespace)
            .to_string();
        self.lock().projects.insert(
            path_with_namespace.to_string(),
            Project {
                id,
                path,
                path_with_namespace: path_with_namespace.to_string(),
            },
        );
        self
    }

    /// Add a group variable.
    pub fn with_group_variable(self, group_path: &str, key: &str, value: &str) -> Self {
        self.lock()
            .group_vars
            .entry(group_path.to_string())
            .or_default()
            .push(Variable::new(key, value));
        self
    }

    /// Add a project variable.
    pub fn with_project_variable(self, project_id: u64, key: &str, value: &str) -> Self {
        self.lock()
            .project_vars
            .entry(project_id)
            .or_default()
            .push(Variable::new(key, value));
        self
    }

    /// Configure an operation to fail.
    pub fn fail_on(self, fail: FailOn) -> Self {
        self.lock().fail_on = Some(fail);
        self
    }

    /// Recorded operations, in call order.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.lock().operations.clone()
    }
}

#[async_trait]
impl Forge for MockForge {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn get_project(&self, path: &str) -> Result<Project, ForgeError> {
        let mut inner = self.lock();
        inner.operations.push(MockOperation::GetProject {
            path: path.to_string(),
        });
        if let Some(FailOn::GetProject(e)) = &inner.fail_on {
            return Err(e.clone());
        }
        inner
            .projects
            .get(path)
            .cloned()
            .ok_or_else(|| ForgeError::NotFound(format!("project '{}'", path)))
    }

    async fn list_group_variables(&self, group_path: &str) -> Result<Vec<Variable>, ForgeError> {
        let mut inner = self.lock();
        inner.operations.push(MockOperation::ListGroupVariables {
            group_path: group_path.to_string(),
        });
        if let Some(FailOn::ListGroupVariables(e)) = &inner.fail_on {
            return Err(e.clone());
        }
        Ok(inner.group_vars.get(group_path).cloned().unwrap_or_default())
    }

    async fn list_project_variables(&self, project_id: u64) -> Result<Vec<Variable>, ForgeError> {
        let mut inner = self.lock();
        inner
            .operations
            .push(MockOperation::ListProjectVariables { project_id });
        if let Some(FailOn::ListProjectVariables(e)) = &inner.fail_on {
            return Err(e.clone());
        }
        Ok(inner
            .project_vars
            .get(&project_id)
            .cloned()
            .unwrap_or_default())
    }
}

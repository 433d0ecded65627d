//! engine::context
//!
//! Request-scoped state for one run.
//!
//! # Caching
//!
//! The schema, the hosting project, the identity and the remote variable
//! sources are each computed at most once per [`RunContext`] and reused by
//! every later stage. Nothing is shared between contexts.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::debug;

use super::runner::RunError;
use crate::accounts::{AccountLookup, SsmAccountLookup};
use crate::core::backend::BackendMode;
use crate::core::identity::{resolve_identity, Identity};
use crate::core::merge::ExternalVarSource;
use crate::core::schema::{scan_schema, VariableSchema};
use crate::core::store::environment_name;
use crate::forge::gitlab::{GitLabForge, GitLabToken};
use crate::forge::{collect_var_sources, Forge, ForgeError, Project};
use crate::git::Git;
use crate::ui::output::{self, Verbosity};

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Module directory (scan root and output location)
    pub workdir: PathBuf,
    /// Variable file holding local values
    pub var_file: PathBuf,
    /// Cloud region
    pub region: String,
    /// Skip `terraform init`
    pub no_init: bool,
    /// Fetch hosting-project variables
    pub remote_vars: bool,
    /// How backend configuration is delivered
    pub backend_mode: BackendMode,
    /// Hosting API base URL
    pub gitlab_api: String,
    /// Project path used for naming, overriding the remote-derived one
    pub project_path: Option<String>,
    /// Terraform executable
    pub terraform_bin: String,
    /// Parameter-store endpoint override
    pub ssm_endpoint: Option<String>,
    /// Output verbosity
    pub verbosity: Verbosity,
}

impl RunOptions {
    /// Environment name, from the variable file name.
    pub fn environment(&self) -> String {
        environment_name(&self.var_file)
    }
}

/// External collaborators for a run.
#[derive(Clone)]
pub struct Services {
    /// Account-ID lookup
    pub accounts: Arc<dyn AccountLookup>,
    /// Hosting API client; `None` when no token is available
    pub forge: Option<Arc<dyn Forge>>,
    /// Local user name
    pub user: String,
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("forge", &self.forge.as_ref().map(|f| f.name()))
            .field("user", &self.user)
            .finish()
    }
}

impl Services {
    /// Production collaborators: SSM, GitLab (token from the environment,
    /// read once here) and the OS user name.
    pub fn from_env(options: &RunOptions) -> Self {
        let forge = GitLabToken::from_env().map(|token| {
            Arc::new(GitLabForge::with_api_base(token, options.gitlab_api.clone()))
                as Arc<dyn Forge>
        });
        let mut accounts = SsmAccountLookup::new(options.region.clone());
        if let Some(endpoint) = &options.ssm_endpoint {
            accounts = accounts.with_endpoint_url(endpoint.clone());
        }
        Self {
            accounts: Arc::new(accounts),
            forge,
            user: whoami::username(),
        }
    }
}

/// The hosting project as far as the run needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRef {
    /// Path used in the session name and state key
    pub naming_path: String,
    /// API record, when it was fetched
    pub remote: Option<Project>,
}

/// One run's settings, collaborators and caches.
#[derive(Debug)]
pub struct RunContext {
    options: RunOptions,
    services: Services,
    schema: OnceCell<VariableSchema>,
    project: OnceCell<ProjectRef>,
    identity: OnceCell<Identity>,
    sources: OnceCell<Vec<ExternalVarSource>>,
}

impl RunContext {
    /// Create a context.
    pub fn new(options: RunOptions, services: Services) -> Self {
        Self {
            options,
            services,
            schema: OnceCell::new(),
            project: OnceCell::new(),
            identity: OnceCell::new(),
            sources: OnceCell::new(),
        }
    }

    /// Run settings.
    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Module directory.
    pub fn workdir(&self) -> &Path {
        &self.options.workdir
    }

    /// Output verbosity.
    pub fn verbosity(&self) -> Verbosity {
        self.options.verbosity
    }

    fn forge(&self) -> Result<&dyn Forge, RunError> {
        self.services
            .forge
            .as_deref()
            .ok_or_else(|| ForgeError::AuthRequired.into())
    }

    /// Declared variables of the module.
    pub async fn schema(&self) -> Result<&VariableSchema, RunError> {
        self.schema
            .get_or_try_init(|| async {
                let schema = scan_schema(&self.options.workdir)?;
                debug!(count = schema.len(), "scanned variable declarations");
                Ok::<_, RunError>(schema)
            })
            .await
    }

    /// Hosting project.
    ///
    /// With remote variables enabled the project is looked up through the
    /// API using the path of the repository remote. Otherwise no API call is
    /// made and the last remote path segment is used for naming. A
    /// configured project path always wins for naming.
    pub async fn project(&self) -> Result<&ProjectRef, RunError> {
        self.project
            .get_or_try_init(|| async {
                let override_path = self.options.project_path.clone();

                if !self.options.remote_vars {
                    let naming_path = match override_path {
                        Some(path) => path,
                        None => last_segment(&self.remote_path()?),
                    };
                    return Ok(ProjectRef {
                        naming_path,
                        remote: None,
                    });
                }

                let lookup_path = match self.remote_path() {
                    Ok(path) => path,
                    Err(e) => override_path.clone().ok_or(e)?,
                };
                output::progress("Fetching GitLab project info", self.verbosity());
                let project = self.forge()?.get_project(&lookup_path).await?;
                debug!(id = project.id, path = %project.path_with_namespace, "found project");

                Ok::<_, RunError>(ProjectRef {
                    naming_path: override_path.unwrap_or_else(|| project.path.clone()),
                    remote: Some(project),
                })
            })
            .await
    }

    fn remote_path(&self) -> Result<String, RunError> {
        Ok(Git::open(&self.options.workdir)?.project_path()?)
    }

    /// Deployment identity.
    pub async fn identity(&self) -> Result<&Identity, RunError> {
        self.identity
            .get_or_try_init(|| async {
                let project = self.project().await?;
                let identity = resolve_identity(
                    self.services.accounts.as_ref(),
                    &self.options.region,
                    &self.options.environment(),
                    &project.naming_path,
                    &self.services.user,
                )
                .await?;
                Ok::<_, RunError>(identity)
            })
            .await
    }

    /// Remote variable sources (empty when remote variables are disabled).
    pub async fn sources(&self) -> Result<&[ExternalVarSource], RunError> {
        let sources = self
            .sources
            .get_or_try_init(|| async {
                let project = match &self.project().await?.remote {
                    Some(project) if self.options.remote_vars => project,
                    _ => return Ok(Vec::new()),
                };
                output::progress("Getting GitLab variables", self.verbosity());
                Ok::<_, RunError>(collect_var_sources(self.forge()?, project).await?)
            })
            .await?;
        Ok(sources.as_slice())
    }
}

fn last_segment(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}

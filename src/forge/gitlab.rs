//! forge::gitlab
//!
//! GitLab REST client for project lookup and CI/CD variables.
//!
//! # Endpoints
//!
//! - `GET /projects/:path` (path URL-encoded, `/` becomes `%2F`)
//! - `GET /groups/:path/variables?page=N&per_page=100`
//! - `GET /projects/:id/variables?page=N&per_page=100`
//!
//! # Pagination
//!
//! Listings follow the `X-Next-Page` response header until it is empty.
//!
//! # Authentication
//!
//! A personal or project token is sent as `PRIVATE-TOKEN`; a CI job token
//! is sent as `JOB-TOKEN`. See [`GitLabToken::from_env`].
//!
//! # Example
//!
//! ```no_run
//! use tfi::forge::gitlab::{GitLabForge, GitLabToken};
//! use tfi::forge::Forge;
//!
//! # async fn demo() -> Result<(), tfi::forge::ForgeError> {
//! let token = GitLabToken::from_env().ok_or(tfi::forge::ForgeError::AuthRequired)?;
//! let forge = GitLabForge::new(token);
//! let project = forge.get_project("team/infra").await?;
//! let vars = forge.list_project_variables(project.id).await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::traits::{Forge, ForgeError, Project, Variable};

/// Default GitLab API base URL.
pub const DEFAULT_API_BASE: &str = "https://gitlab.com/api/v4";

/// Page size requested for listings (GitLab's maximum).
pub const PER_PAGE: u32 = 100;

const USER_AGENT_VALUE: &str = concat!("tfi/", env!("CARGO_PKG_VERSION"));

/// Credential for the GitLab API.
#[derive(Clone, PartialEq, Eq)]
pub enum GitLabToken {
    /// Personal, group or project access token
    Private(String),
    /// CI job token
    Job(String),
}

impl std::fmt::Debug for GitLabToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GitLabToken::Private(_) => f.write_str("GitLabToken::Private(<redacted>)"),
            GitLabToken::Job(_) => f.write_str("GitLabToken::Job(<redacted>)"),
        }
    }
}

impl GitLabToken {
    /// Read `GITLAB_TOKEN`, falling back to `CI_JOB_TOKEN`.
    ///
    /// Empty values count as unset.
    pub fn from_env() -> Option<Self> {
        Self::from_values(
            std::env::var("GITLAB_TOKEN").ok(),
            std::env::var("CI_JOB_TOKEN").ok(),
        )
    }

    fn from_values(private: Option<String>, job: Option<String>) -> Option<Self> {
        match (private, job) {
            (Some(t), _) if !t.is_empty() => Some(GitLabToken::Private(t)),
            (_, Some(t)) if !t.is_empty() => Some(GitLabToken::Job(t)),
            _ => None,
        }
    }

    fn header(&self) -> (&'static str, &str) {
        match self {
            GitLabToken::Private(t) => ("private-token", t),
            GitLabToken::Job(t) => ("job-token", t),
        }
    }
}

/// GitLab API client.
#[derive(Clone)]
pub struct GitLabForge {
    client: Client,
    token: GitLabToken,
    api_base: String,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for GitLabForge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitLabForge")
            .field("token", &self.token)
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Error body returned by GitLab.
#[derive(Debug, Deserialize)]
struct GitLabErrorResponse {
    #[serde(default)]
    message: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

impl GitLabForge {
    /// Create a client for gitlab.com.
    pub fn new(token: GitLabToken) -> Self {
        Self::with_api_base(token, DEFAULT_API_BASE)
    }

    /// Create a client for a self-hosted instance.
    ///
    /// # Example
    ///
    /// ```
    /// use tfi::forge::gitlab::{GitLabForge, GitLabToken};
    ///
    /// let forge = GitLabForge::with_api_base(
    ///     GitLabToken::Private("glpat-xxx".into()),
    ///     "https://gitlab.example.com/api/v4/",
    /// );
    /// assert_eq!(forge.api_base(), "https://gitlab.example.com/api/v4");
    /// ```
    pub fn with_api_base(token: GitLabToken, api_base: impl Into<String>) -> Self {
        let api_base: String = api_base.into();
        Self {
            client: Client::new(),
            token,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Get the API base URL.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn headers(&self) -> Result<HeaderMap, ForgeError> {
        let (name, token) = self.token.header();
        let mut headers = HeaderMap::new();
        headers.insert(
            name,
            HeaderValue::from_str(token)
                .map_err(|_| ForgeError::AuthFailed("token contains invalid characters".into()))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        Ok(headers)
    }

    async fn get(&self, url: &str) -> Result<Response, ForgeError> {
        self.client
            .get(url)
            .headers(self.headers()?)
            .send()
            .await
            .map_err(|e| ForgeError::NetworkError(e.to_string()))
    }

    /// Handle API response, mapping errors appropriately.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: Response,
    ) -> Result<T, ForgeError> {
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| ForgeError::ApiError {
                status: status.as_u16(),
                message: format!("Failed to parse response: {}", e),
            })
        } else {
            self.handle_error_response(response, status).await
        }
    }

    /// Handle an error response from the API.
    async fn handle_error_response<T>(
        &self,
        response: Response,
        status: StatusCode,
    ) -> Result<T, ForgeError> {
        let message = match response.json::<GitLabErrorResponse>().await {
            Ok(GitLabErrorResponse {
                message: Some(serde_json::Value::String(s)),
                ..
            }) => s,
            Ok(GitLabErrorResponse {
                message: Some(other),
                ..
            }) => other.to_string(),
            Ok(GitLabErrorResponse {
                error: Some(e), ..
            }) => e,
            _ => "Unknown error".to_string(),
        };

        Err(match status {
            StatusCode::UNAUTHORIZED => ForgeError::AuthFailed("Invalid or expired token".into()),
            StatusCode::FORBIDDEN => ForgeError::AuthFailed(format!("Permission denied: {}", message)),
            StatusCode::NOT_FOUND => ForgeError::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => ForgeError::RateLimited,
            _ => ForgeError::ApiError {
                status: status.as_u16(),
                message,
            },
        })
    }

    /// Fetch every page of a variable listing.
    async fn list_all(&self, endpoint: &str) -> Result<Vec<Variable>, ForgeError> {
        let mut all = Vec::new();
        let mut page: u32 = 1;

        loop {
            let url = format!("{}?page={}&per_page={}", endpoint, page, PER_PAGE);
            let response = self.get(&url).await?;
            let next = next_page(&response);
            let vars: Vec<Variable> = self.handle_response(response).await?;
            debug!(%endpoint, page, count = vars.len(), "fetched variables page");
            all.extend(vars);

            match next {
                Some(n) if n > page => page = n,
                _ => break,
            }
        }

        Ok(all)
    }
}

/// Value of the `X-Next-Page` header; empty or absent means last page.
fn next_page(response: &Response) -> Option<u32> {
    response
        .headers()
        .get("X-Next-Page")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
}

/// URL-encode a namespaced path as a single path segment.
fn encode_path(path: &str) -> String {
    url::form_urlencoded::byte_serialize(path.as_bytes()).collect()
}

#[async_trait]
impl Forge for GitLabForge {
    fn name(&self) -> &'static str {
        "gitlab"
    }

    async fn get_project(&self, path: &str) -> Result<Project, ForgeError> {
        let url = format!("{}/projects/{}", self.api_base, encode_path(path));
        debug!(%path, "fetching project");
        let response = self.get(&url).await?;
        self.handle_response(response).await.map_err(|e| match e {
            ForgeError::NotFound(_) => ForgeError::NotFound(format!("project '{}'", path)),
            other => other,
        })
    }

    async fn list_group_variables(&self, group_path: &str) -> Result<Vec<Variable>, ForgeError> {
        let endpoint = format!(
            "{}/groups/{}/variables",
            self.api_base,
            encode_path(group_path)
        );
        self.list_all(&endpoint).await
    }

    async fn list_project_variables(&self, project_id: u64) -> Result<Vec<Variable>, ForgeError> {
        let endpoint = format!("{}/projects/{}/variables", self.api_base, project_id);
        self.list_all(&endpoint).await
    }
}

/// Extract the project path from a git remote URL.
///
/// Accepts scp-like SSH (`git@host:group/project.git`), `ssh://` and
/// `http(s)://` forms on any host. Nested groups are preserved.
///
/// # Example
///
/// ```
/// use tfi::forge::gitlab::parse_gitlab_url;
///
/// assert_eq!(
///     parse_gitlab_url("git@gitlab.com:acme/platform/network.git"),
///     Some("acme/platform/network".to_string())
/// );
/// assert_eq!(
///     parse_gitlab_url("https://gitlab.com/acme/infra"),
///     Some("acme/infra".to_string())
/// );
/// assert_eq!(parse_gitlab_url("not a url"), None);
/// ```
pub fn parse_gitlab_url(url: &str) -> Option<String> {
    let url = url.trim();

    if url.contains("://") {
        let parsed = url::Url::parse(url).ok()?;
        if !matches!(parsed.scheme(), "ssh" | "https" | "http" | "git") {
            return None;
        }
        return parse_gitlab_path(parsed.path());
    }

    // scp-like: [user@]host:path
    let (host, path) = url.split_once(':')?;
    if host.is_empty() || host.contains('/') || host.contains(' ') {
        return None;
    }
    parse_gitlab_path(path)
}

/// Normalize the path portion of a remote URL.
///
/// Requires at least `group/project`.
fn parse_gitlab_path(path: &str) -> Option<String> {
    let path = path.trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);

    let parts: Vec<&str> = path.split('/').collect();
    if parts.len() < 2 || parts.iter().any(|p| p.is_empty()) {
        return None;
    }

    Some(parts.join("/"))
}

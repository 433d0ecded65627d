//! core::identity
//!
//! Derivation of the deployment identity for a run.
//!
//! # Derived Values
//!
//! - Role ARN: `arn:aws:iam::{account}:role/{RUNNER_ROLE_NAME}-{region}`
//! - Session name: lowercase `{SESSION_TOOL}-{project}-{env}-{user}`
//!
//! The session name is computed once here and reused verbatim by both the
//! variable file and the backend descriptor.

use tracing::debug;

use crate::accounts::{AccountError, AccountLookup};

/// Role assumed by the Terraform runner in every account.
pub const RUNNER_ROLE_NAME: &str = "gitlab-terraform-runner-assume-role";

/// Tool identifier leading every session name.
pub const SESSION_TOOL: &str = "terraform";

/// Everything a run knows about who is deploying where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Environment name (from the variable file name)
    pub environment: String,
    /// Cloud region
    pub region: String,
    /// Account ID for the environment
    pub account_id: String,
    /// Role to assume
    pub role_arn: String,
    /// Session name for the assumed role
    pub session_name: String,
    /// Hosting-project path
    pub project_path: String,
}

/// Build the runner role ARN.
///
/// # Example
///
/// ```
/// use tfi::core::identity::role_arn;
///
/// assert_eq!(
///     role_arn("123456789012", "eu-west-1"),
///     "arn:aws:iam::123456789012:role/gitlab-terraform-runner-assume-role-eu-west-1"
/// );
/// ```
pub fn role_arn(account_id: &str, region: &str) -> String {
    format!(
        "arn:aws:iam::{}:role/{}-{}",
        account_id, RUNNER_ROLE_NAME, region
    )
}

/// Build the session name.
///
/// # Example
///
/// ```
/// use tfi::core::identity::session_name;
///
/// assert_eq!(
///     session_name("Infra", "prod", "Alice"),
///     "terraform-infra-prod-alice"
/// );
/// ```
pub fn session_name(project_path: &str, environment: &str, user: &str) -> String {
    [SESSION_TOOL, project_path, environment, user]
        .join("-")
        .to_lowercase()
}

/// Resolve the identity for an environment.
///
/// # Errors
///
/// Propagates [`AccountError`] from the lookup, including
/// [`AccountError::NotFound`] when the environment has no account.
pub async fn resolve_identity(
    lookup: &dyn AccountLookup,
    region: &str,
    environment: &str,
    project_path: &str,
    user: &str,
) -> Result<Identity, AccountError> {
    let account_id = lookup.account_id(environment).await?;
    debug!(%environment, %region, "resolved account");

    Ok(Identity {
        environment: environment.to_string(),
        region: region.to_string(),
        role_arn: role_arn(&account_id, region),
        session_name: session_name(project_path, environment, user),
        account_id,
        project_path: project_path.to_string(),
    })
}

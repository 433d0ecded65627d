//! accounts
//!
//! Account-ID lookup for deployment environments.
//!
//! # Architecture
//!
//! The [`AccountLookup`] trait maps an environment name to a cloud account
//! ID. Production uses [`SsmAccountLookup`], which reads a JSON object from
//! an SSM parameter in the target region. Tests use [`StaticAccountLookup`].
//!
//! # Deadline
//!
//! The SSM call is bounded by [`LOOKUP_TIMEOUT`]. Exceeding it yields
//! [`AccountError::Timeout`], never an empty result.

mod ssm;

pub use ssm::{SsmAccountLookup, ACCOUNT_MAP_PARAMETER, LOOKUP_TIMEOUT};

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from account lookups.
#[derive(Debug, Clone, Error)]
pub enum AccountError {
    /// No account is mapped for the environment.
    #[error("no account mapped for environment '{environment}'")]
    NotFound {
        /// The environment that was looked up
        environment: String,
    },

    /// The lookup did not complete before its deadline.
    #[error("account lookup timed out after {0:?}")]
    Timeout(Duration),

    /// The parameter store call failed.
    #[error("parameter store error: {0}")]
    Remote(String),

    /// The stored account map is not a JSON object of strings.
    #[error("invalid account map: {0}")]
    InvalidMap(String),
}

/// Maps environment names to account IDs.
#[async_trait]
pub trait AccountLookup: Send + Sync {
    /// Account ID for `environment`.
    ///
    /// # Errors
    ///
    /// [`AccountError::NotFound`] when the map has no entry for the
    /// environment; other variants for transport failures.
    async fn account_id(&self, environment: &str) -> Result<String, AccountError>;
}

/// Fixed in-memory account map.
#[derive(Debug, Clone, Default)]
pub struct StaticAccountLookup {
    accounts: HashMap<String, String>,
}

impl StaticAccountLookup {
    /// Create from `(environment, account_id)` pairs.
    pub fn new<I, K, V>(accounts: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            accounts: accounts
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[async_trait]
impl AccountLookup for StaticAccountLookup {
    async fn account_id(&self, environment: &str) -> Result<String, AccountError> {
        lookup_in(&self.accounts, environment)
    }
}

/// Decode the JSON account map stored in the parameter.
pub fn parse_account_map(json: &str) -> Result<HashMap<String, String>, AccountError> {
    serde_json::from_str(json).map_err(|e| AccountError::InvalidMap(e.to_string()))
}

/// Find an environment in a decoded map; empty IDs count as missing.
pub(crate) fn lookup_in(
    accounts: &HashMap<String, String>,
    environment: &str,
) -> Result<String, AccountError> {
    accounts
        .get(environment)
        .filter(|id| !id.is_empty())
        .cloned()
        .ok_or_else(|| AccountError::NotFound {
            environment: environment.to_string(),
        })
}

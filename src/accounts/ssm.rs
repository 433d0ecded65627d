//! accounts::ssm
//!
//! Account lookup backed by an AWS SSM parameter.
//!
//! The parameter holds a JSON object such as
//! `{"dev": "111111111111", "prod": "222222222222"}`.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_ssm::error::DisplayErrorContext;
use tracing::debug;

use super::{lookup_in, parse_account_map, AccountError, AccountLookup};

/// Name of the parameter holding the account map.
pub const ACCOUNT_MAP_PARAMETER: &str = "account_map_json";

/// Deadline for the parameter fetch.
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Reads the account map from SSM in a given region.
#[derive(Debug, Clone)]
pub struct SsmAccountLookup {
    region: String,
    parameter: String,
    timeout: Duration,
    endpoint_url: Option<String>,
}

impl SsmAccountLookup {
    /// Create a lookup for `region` using the default parameter and deadline.
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            parameter: ACCOUNT_MAP_PARAMETER.to_string(),
            timeout: LOOKUP_TIMEOUT,
            endpoint_url: None,
        }
    }

    /// Override the fetch deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send requests to `url` instead of the regional AWS endpoint.
    pub fn with_endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = Some(url.into());
        self
    }

    /// Region the parameter is read from.
    pub fn region(&self) -> &str {
        &self.region
    }

    async fn fetch_map_json(&self) -> Result<String, AccountError> {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(self.region.clone()));
        if let Some(url) = &self.endpoint_url {
            loader = loader.endpoint_url(url);
        }
        let config = loader.load().await;
        let client = aws_sdk_ssm::Client::new(&config);

        let request = client.get_parameter().name(&self.parameter).send();
        let output = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| AccountError::Timeout(self.timeout))?
            .map_err(|e| AccountError::Remote(DisplayErrorContext(&e).to_string()))?;

        output
            .parameter()
            .and_then(|p| p.value())
            .map(String::from)
            .ok_or_else(|| {
                AccountError::Remote(format!("parameter '{}' has no value", self.parameter))
            })
    }
}

#[async_trait]
impl AccountLookup for SsmAccountLookup {
    async fn account_id(&self, environment: &str) -> Result<String, AccountError> {
        debug!(region = %self.region, parameter = %self.parameter, "fetching account map");
        let json = self.fetch_map_json().await?;
        let accounts = parse_account_map(&json)?;
        lookup_in(&accounts, environment)
    }
}

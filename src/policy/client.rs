//! HTTP client for the policy decision point

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::{PolicyOracle, PolicyUser};
use crate::auth::{PolicyAction, UserRole};
use crate::config::Args;
use crate::types::CareShareError;

/// Configuration for the HTTP policy oracle
#[derive(Debug, Clone)]
pub struct HttpPolicyOracleConfig {
    pub check_url: String,
    pub sync_url: String,
    pub api_key: Option<String>,
    /// Timeout for each HTTP request
    pub request_timeout: Duration,
}

impl HttpPolicyOracleConfig {
    pub fn from_args(args: &Args) -> Self {
        Self {
            check_url: args.policy_check_url.clone(),
            sync_url: args.policy_sync_url.clone(),
            api_key: args.policy_api_key.clone(),
            request_timeout: args.policy_timeout(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckRequest<'a> {
    user_id: &'a str,
    action: &'a str,
    resource: &'a str,
}

#[derive(Debug, Deserialize)]
struct CheckResponse {
    permitted: bool,
}

#[derive(Debug, Serialize)]
struct SyncRequest<'a> {
    user: &'a PolicyUser,
    role: UserRole,
}

#[derive(Debug, Deserialize)]
struct SyncResponse {
    success: bool,
}

/// Policy oracle reached over HTTP
pub struct HttpPolicyOracle {
    config: HttpPolicyOracleConfig,
    http_client: reqwest::Client,
}

impl HttpPolicyOracle {
    /// Build the client. Fails rather than fall back to a client without
    /// the configured request timeout.
    pub fn new(config: HttpPolicyOracleConfig) -> Result<Self, CareShareError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent("careshare/1.0")
            .build()
            .map_err(|e| CareShareError::Config(format!("Failed to build policy client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn post(&self, url: &str) -> reqwest::RequestBuilder {
        let builder = self.http_client.post(url);
        match &self.config.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }
}

#[async_trait::async_trait]
impl PolicyOracle for HttpPolicyOracle {
    async fn check(
        &self,
        user_id: &str,
        action: PolicyAction,
        resource: &str,
    ) -> Result<bool, CareShareError> {
        let response = self
            .post(&self.config.check_url)
            .json(&CheckRequest {
                user_id,
                action: action.as_str(),
                resource,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CareShareError::OracleUnavailable(format!(
                "HTTP {} from {}",
                response.status(),
                self.config.check_url
            )));
        }

        let body: CheckResponse = response.json().await.map_err(|e| {
            CareShareError::OracleUnavailable(format!("Malformed check response: {}", e))
        })?;

        debug!(user_id = %user_id, action = %action, permitted = body.permitted, "Policy check");
        Ok(body.permitted)
    }

    async fn sync_user(&self, user: &PolicyUser, role: UserRole) -> Result<bool, CareShareError> {
        let response = self
            .post(&self.config.sync_url)
            .json(&SyncRequest { user, role })
            .send()
            .await?;

        let status = response.status();
        // The sync endpoint reports failures as {success: false} with a 5xx
        let body: SyncResponse = response.json().await.map_err(|e| {
            CareShareError::OracleUnavailable(format!("Malformed sync response ({}): {}", status, e))
        })?;

        if !body.success {
            warn!(user_id = %user.id, role = %role, status = %status, "Policy user sync rejected");
        }
        Ok(body.success)
    }
}

//! Capability resolver

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use super::CapabilitySet;
use crate::auth::{PolicyAction, HEALTH_RECORDS_RESOURCE};
use crate::logging::{AuditEvent, AuditEventType, AuditLogger};
use crate::policy::PolicyOracle;
use crate::types::CareShareError;

/// Resolver configuration
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Upper bound for each individual oracle check
    pub check_timeout: Duration,
    pub resource: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            check_timeout: Duration::from_secs(3),
            resource: HEALTH_RECORDS_RESOURCE.to_string(),
        }
    }
}

/// Aggregates oracle checks into a capability set
pub struct PermissionResolver {
    oracle: Arc<dyn PolicyOracle>,
    audit: AuditLogger,
    config: ResolverConfig,
}

impl PermissionResolver {
    pub fn new(oracle: Arc<dyn PolicyOracle>, audit: AuditLogger, config: ResolverConfig) -> Self {
        Self {
            oracle,
            audit,
            config,
        }
    }

    /// Resolve the capability set for `user_id`. Never fails.
    ///
    /// All tracked checks run concurrently and are joined before the set is
    /// built. Checks are read-only, so abandoning the future mid-flight
    /// leaves nothing behind.
    pub async fn resolve_capabilities(&self, user_id: &str) -> CapabilitySet {
        let request_id = Uuid::new_v4();

        let (full, limited, update) = tokio::join!(
            self.check_one(user_id, PolicyAction::ViewRecordsFull),
            self.check_one(user_id, PolicyAction::ViewRecordsLimited),
            self.check_one(user_id, PolicyAction::Update),
        );
        let outcomes = [
            (PolicyAction::ViewRecordsFull, full),
            (PolicyAction::ViewRecordsLimited, limited),
            (PolicyAction::Update, update),
        ];

        let mut caps = CapabilitySet::restricted();
        let mut failures = Vec::new();
        for (action, outcome) in outcomes {
            match outcome {
                Ok(permitted) => caps.set(action, permitted),
                Err(e) => {
                    warn!(
                        request_id = %request_id,
                        user_id = %user_id,
                        action = %action,
                        error = %e,
                        "Policy check failed, denying"
                    );
                    failures.push(action.as_str());
                }
            }
        }

        debug!(request_id = %request_id, user_id = %user_id, ?caps, "Capabilities resolved");

        self.audit
            .log(
                AuditEvent::new(AuditEventType::CapabilityResolution, request_id, user_id)
                    .with_input(serde_json::json!({
                        "userId": user_id,
                        "resource": self.config.resource,
                    }))
                    .with_result(serde_json::json!({
                        "capabilities": caps,
                        "failedChecks": failures,
                    })),
            )
            .await;

        caps
    }

    async fn check_one(&self, user_id: &str, action: PolicyAction) -> Result<bool, CareShareError> {
        if user_id.is_empty() {
            return Err(CareShareError::BadRequest("empty user id".into()));
        }

        match tokio::time::timeout(
            self.config.check_timeout,
            self.oracle.check(user_id, action, &self.config.resource),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(CareShareError::OracleUnavailable(format!(
                "check timed out after {:?}",
                self.config.check_timeout
            ))),
        }
    }
}

//! Role onboarding
//!
//! A new user picks a role once. The choice is synced to the policy store
//! (identity plus role assignment) and recorded in the user directory.
//! The role is onboarding metadata only: nothing branches on it, access is
//! decided by the oracle and by shares.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use uuid::Uuid;

use crate::auth::{UserRole, Viewer};
use crate::logging::{AuditEvent, AuditEventType, AuditLogger};
use crate::policy::{PolicyOracle, PolicyUser};
use crate::store::{UserDirectory, UserProfile};
use crate::types::{CareShareError, Result};

#[derive(Clone)]
pub struct RoleService {
    oracle: Arc<dyn PolicyOracle>,
    directory: Arc<dyn UserDirectory>,
    audit: AuditLogger,
    /// Upper bound on one role sync round trip
    sync_timeout: Duration,
}

impl RoleService {
    pub fn new(
        oracle: Arc<dyn PolicyOracle>,
        directory: Arc<dyn UserDirectory>,
        audit: AuditLogger,
        sync_timeout: Duration,
    ) -> Self {
        Self {
            oracle,
            directory,
            audit,
            sync_timeout,
        }
    }

    /// Sync the caller's identity and role, then record the role locally.
    ///
    /// A failed or refused sync is an error; the directory is left as is
    /// so the caller can retry.
    pub async fn select_role(&self, viewer: &Viewer, role: UserRole) -> Result<UserProfile> {
        let user = PolicyUser {
            id: viewer.id.clone(),
            email: viewer.email.clone(),
        };
        let request_id = Uuid::new_v4();

        let synced = tokio::time::timeout(self.sync_timeout, self.oracle.sync_user(&user, role))
            .await
            .unwrap_or_else(|_| {
                Err(CareShareError::OracleUnavailable(format!(
                    "Role sync timed out after {}ms",
                    self.sync_timeout.as_millis()
                )))
            });

        self.audit
            .log(
                AuditEvent::new(AuditEventType::RoleSynced, request_id, &viewer.id)
                    .with_input(serde_json::json!({ "email": viewer.email, "role": role }))
                    .with_result(match &synced {
                        Ok(success) => serde_json::json!({ "success": success }),
                        Err(e) => serde_json::json!({ "success": false, "error": e.code() }),
                    }),
            )
            .await;

        match synced {
            Ok(true) => {}
            Ok(false) => {
                error!(user_id = %viewer.id, role = %role, "Policy store refused role sync");
                return Err(CareShareError::OracleUnavailable(
                    "Role assignment was not accepted, please retry".into(),
                ));
            }
            Err(e) => {
                error!(user_id = %viewer.id, role = %role, error = %e, "Role sync failed");
                return Err(e);
            }
        }

        let profile = UserProfile {
            id: viewer.id.clone(),
            email: viewer.email.clone(),
            role: Some(role),
            updated_at: Utc::now(),
        };
        self.directory.upsert_user(profile.clone()).await?;

        info!(user_id = %viewer.id, role = %role, "Role selected");
        Ok(profile)
    }

    /// Make sure the caller is known to the directory so owners can share
    /// with them by email. Keeps any role already recorded.
    pub async fn ensure_registered(&self, viewer: &Viewer) -> Result<UserProfile> {
        let existing = self.directory.find_user_by_id(&viewer.id).await?;
        if let Some(profile) = existing.as_ref().filter(|p| p.email == viewer.email) {
            return Ok(profile.clone());
        }

        let profile = UserProfile {
            id: viewer.id.clone(),
            email: viewer.email.clone(),
            role: existing.and_then(|p| p.role),
            updated_at: Utc::now(),
        };
        self.directory.upsert_user(profile.clone()).await?;
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::PolicyAction;
    use crate::store::MemoryStore;
    use std::sync::Mutex;

    struct SyncOracle {
        answer: std::result::Result<bool, ()>,
        synced: Mutex<Vec<(PolicyUser, UserRole)>>,
    }

    #[async_trait::async_trait]
    impl PolicyOracle for SyncOracle {
        async fn check(
            &self,
            _user_id: &str,
            _action: PolicyAction,
            _resource: &str,
        ) -> std::result::Result<bool, CareShareError> {
            Ok(false)
        }

        async fn sync_user(
            &self,
            user: &PolicyUser,
            role: UserRole,
        ) -> std::result::Result<bool, CareShareError> {
            self.synced.lock().unwrap().push((user.clone(), role));
            self.answer
                .map_err(|_| CareShareError::OracleUnavailable("unreachable".into()))
        }
    }

    fn service(answer: std::result::Result<bool, ()>) -> (RoleService, Arc<SyncOracle>, Arc<MemoryStore>) {
        let oracle = Arc::new(SyncOracle {
            answer,
            synced: Mutex::new(Vec::new()),
        });
        let store = Arc::new(MemoryStore::new());
        (
            RoleService::new(
                oracle.clone(),
                store.clone(),
                AuditLogger::new(),
                Duration::from_secs(1),
            ),
            oracle,
            store,
        )
    }

    #[tokio::test]
    async fn test_select_role_syncs_and_records() {
        let (service, oracle, store) = service(Ok(true));
        let viewer = Viewer::new("u1", "Doc@Clinic.org");

        let profile = service.select_role(&viewer, UserRole::Doctor).await.unwrap();
        assert_eq!(profile.role, Some(UserRole::Doctor));

        let synced = oracle.synced.lock().unwrap().clone();
        assert_eq!(synced.len(), 1);
        assert_eq!(synced[0].0.email, "doc@clinic.org");
        assert_eq!(synced[0].1, UserRole::Doctor);

        let stored = store.find_user_by_email("doc@clinic.org").await.unwrap().unwrap();
        assert_eq!(stored.role, Some(UserRole::Doctor));
    }

    #[tokio::test]
    async fn test_refused_sync_is_error() {
        let (service, _, store) = service(Ok(false));
        let viewer = Viewer::new("u1", "u1@x.io");
        let err = service.select_role(&viewer, UserRole::Parent).await.unwrap_err();
        assert!(matches!(err, CareShareError::OracleUnavailable(_)));
        assert!(store.find_user_by_id("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unreachable_oracle_is_error() {
        let (service, _, _) = service(Err(()));
        let viewer = Viewer::new("u1", "u1@x.io");
        assert!(service.select_role(&viewer, UserRole::Partner).await.is_err());
    }

    struct StalledOracle;

    #[async_trait::async_trait]
    impl PolicyOracle for StalledOracle {
        async fn check(
            &self,
            _user_id: &str,
            _action: PolicyAction,
            _resource: &str,
        ) -> std::result::Result<bool, CareShareError> {
            std::future::pending().await
        }

        async fn sync_user(
            &self,
            _user: &PolicyUser,
            _role: UserRole,
        ) -> std::result::Result<bool, CareShareError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_stalled_sync_times_out() {
        let store = Arc::new(MemoryStore::new());
        let service = RoleService::new(
            Arc::new(StalledOracle),
            store.clone(),
            AuditLogger::new(),
            Duration::from_millis(50),
        );
        let viewer = Viewer::new("u1", "u1@x.io");

        let started = std::time::Instant::now();
        let err = service.select_role(&viewer, UserRole::Doctor).await.unwrap_err();
        assert!(matches!(err, CareShareError::OracleUnavailable(_)));
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(store.find_user_by_id("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ensure_registered_keeps_role() {
        let (service, _, store) = service(Ok(true));
        let viewer = Viewer::new("u1", "u1@x.io");
        service.select_role(&viewer, UserRole::Partner).await.unwrap();

        let moved = Viewer::new("u1", "new@x.io");
        let profile = service.ensure_registered(&moved).await.unwrap();
        assert_eq!(profile.role, Some(UserRole::Partner));
        assert!(store.find_user_by_email("new@x.io").await.unwrap().is_some());
    }
}

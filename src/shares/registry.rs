//! Share registry service

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::{normalize_email, Share};
use crate::logging::{AuditEvent, AuditEventType, AuditLogger};
use crate::store::{InsertOutcome, ShareStore, UserDirectory};
use crate::types::{CareShareError, Result};

/// Maintains owner-to-viewer grants
#[derive(Clone)]
pub struct ShareRegistry {
    store: Arc<dyn ShareStore>,
    directory: Arc<dyn UserDirectory>,
    audit: AuditLogger,
}

impl ShareRegistry {
    pub fn new(
        store: Arc<dyn ShareStore>,
        directory: Arc<dyn UserDirectory>,
        audit: AuditLogger,
    ) -> Self {
        Self {
            store,
            directory,
            audit,
        }
    }

    /// Who can see my data
    pub async fn list_active_shares_by_owner(&self, owner_id: &str) -> Result<Vec<Share>> {
        let mut shares = self.store.list_active_by_owner(owner_id).await?;
        shares.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(shares)
    }

    /// Shares naming `email` as the viewer
    pub async fn list_active_shares_by_viewer_email(&self, email: &str) -> Result<Vec<Share>> {
        let mut shares = self
            .store
            .list_active_by_viewer_email(&normalize_email(email))
            .await?;
        shares.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(shares)
    }

    /// Distinct owners who shared with `email`
    pub async fn visible_owner_ids(&self, email: &str) -> Result<Vec<String>> {
        let owners: BTreeSet<String> = self
            .list_active_shares_by_viewer_email(email)
            .await?
            .into_iter()
            .map(|s| s.owner_id)
            .collect();
        Ok(owners.into_iter().collect())
    }

    /// Grant `viewer_email` access to `owner_id`'s records.
    ///
    /// The recipient lookup is best effort: it only tells the owner the
    /// email is not registered yet, it is not an authorization check.
    pub async fn create_share(&self, owner_id: &str, viewer_email: &str) -> Result<Share> {
        let email = normalize_email(viewer_email);
        let request_id = Uuid::new_v4();

        let outcome = self.try_create(owner_id, &email).await;

        match &outcome {
            Ok(share) => {
                info!(owner_id = %owner_id, share_id = %share.id, "Share created");
                self.audit
                    .log(
                        AuditEvent::new(AuditEventType::ShareCreated, request_id, owner_id)
                            .with_input(serde_json::json!({ "sharedWithEmail": email }))
                            .with_result(serde_json::json!({ "shareId": share.id })),
                    )
                    .await;
            }
            Err(e) => {
                warn!(owner_id = %owner_id, error = %e, "Share rejected");
                self.audit
                    .log(
                        AuditEvent::new(AuditEventType::ShareRejected, request_id, owner_id)
                            .with_input(serde_json::json!({ "sharedWithEmail": email }))
                            .with_result(serde_json::json!({ "error": e.code() })),
                    )
                    .await;
            }
        }

        outcome
    }

    async fn try_create(&self, owner_id: &str, email: &str) -> Result<Share> {
        if email.is_empty() || !email.contains('@') {
            return Err(CareShareError::BadRequest(
                "A valid email address is required".into(),
            ));
        }

        let recipient = self
            .directory
            .find_user_by_email(email)
            .await?
            .ok_or_else(|| {
                CareShareError::RecipientNotFound(format!("No user registered with {}", email))
            })?;

        if recipient.id == owner_id {
            return Err(CareShareError::BadRequest(
                "Cannot share records with yourself".into(),
            ));
        }

        match self
            .store
            .insert_share_if_absent(Share::new(owner_id, email))
            .await?
        {
            InsertOutcome::Inserted(share) => Ok(share),
            InsertOutcome::Duplicate => Err(CareShareError::DuplicateShare(format!(
                "Records are already shared with {}",
                email
            ))),
        }
    }

    /// Deactivate a share. Revoking an inactive share is a no-op.
    pub async fn revoke_share(&self, share_id: &str) -> Result<()> {
        let share = self
            .store
            .get_share(share_id)
            .await?
            .ok_or_else(|| CareShareError::NotFound(format!("Share {} not found", share_id)))?;
        self.deactivate(share).await
    }

    /// Revoke on behalf of `owner_id`, who must own the share
    pub async fn revoke_owned_share(&self, owner_id: &str, share_id: &str) -> Result<()> {
        let share = self
            .store
            .get_share(share_id)
            .await?
            .ok_or_else(|| CareShareError::NotFound(format!("Share {} not found", share_id)))?;

        if share.owner_id != owner_id {
            return Err(CareShareError::Forbidden(
                "Only the owner can revoke a share".into(),
            ));
        }
        self.deactivate(share).await
    }

    async fn deactivate(&self, share: Share) -> Result<()> {
        if !share.active {
            return Ok(());
        }

        if !self.store.deactivate_share(&share.id).await? {
            return Err(CareShareError::NotFound(format!(
                "Share {} not found",
                share.id
            )));
        }

        info!(owner_id = %share.owner_id, share_id = %share.id, "Share revoked");
        self.audit
            .log(
                AuditEvent::new(AuditEventType::ShareRevoked, Uuid::new_v4(), &share.owner_id)
                    .with_input(serde_json::json!({ "shareId": share.id }))
                    .with_result(serde_json::json!({ "active": false })),
            )
            .await;
        Ok(())
    }
}

//! In-memory store
//!
//! Used in dev mode when MongoDB is unreachable, and by tests. Each
//! conditional write runs its check and its insert under one write lock.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{InsertOutcome, RecordStore, ShareStore, UserDirectory, UserProfile};
use crate::projection::FieldSet;
use crate::records::HealthRecord;
use crate::shares::Share;
use crate::types::{CareShareError, Result};

#[derive(Default)]
pub struct MemoryStore {
    shares: RwLock<Vec<Share>>,
    records: RwLock<Vec<HealthRecord>>,
    users: RwLock<HashMap<String, UserProfile>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Drop the fields a limited query must not return
fn restrict(mut record: HealthRecord, fields: FieldSet) -> HealthRecord {
    if !fields.includes("mood") {
        record.mood = None;
    }
    record
}

#[async_trait]
impl ShareStore for MemoryStore {
    async fn list_active_by_owner(&self, owner_id: &str) -> Result<Vec<Share>> {
        let shares = self.shares.read().await;
        Ok(shares
            .iter()
            .filter(|s| s.active && s.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn list_active_by_viewer_email(&self, email: &str) -> Result<Vec<Share>> {
        let shares = self.shares.read().await;
        Ok(shares
            .iter()
            .filter(|s| s.active && s.shared_with_email == email)
            .cloned()
            .collect())
    }

    async fn insert_share_if_absent(&self, share: Share) -> Result<InsertOutcome> {
        let mut shares = self.shares.write().await;
        let exists = shares.iter().any(|s| {
            s.active
                && s.owner_id == share.owner_id
                && s.shared_with_email == share.shared_with_email
        });
        if exists {
            return Ok(InsertOutcome::Duplicate);
        }
        shares.push(share.clone());
        Ok(InsertOutcome::Inserted(share))
    }

    async fn get_share(&self, share_id: &str) -> Result<Option<Share>> {
        let shares = self.shares.read().await;
        Ok(shares.iter().find(|s| s.id == share_id).cloned())
    }

    async fn deactivate_share(&self, share_id: &str) -> Result<bool> {
        let mut shares = self.shares.write().await;
        match shares.iter_mut().find(|s| s.id == share_id) {
            Some(share) => {
                share.active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn query_records_by_owners(
        &self,
        owner_ids: &[String],
        fields: FieldSet,
    ) -> Result<Vec<HealthRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| owner_ids.contains(&r.user_id))
            .cloned()
            .map(|r| restrict(r, fields))
            .collect())
    }

    async fn query_records_by_owner(&self, owner_id: &str) -> Result<Vec<HealthRecord>> {
        let records = self.records.read().await;
        let mut owned: Vec<HealthRecord> = records
            .iter()
            .filter(|r| r.user_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.record_date.cmp(&a.record_date));
        Ok(owned)
    }

    async fn insert_record(&self, record: HealthRecord) -> Result<String> {
        let mut records = self.records.write().await;
        if records
            .iter()
            .any(|r| r.user_id == record.user_id && r.record_date == record.record_date)
        {
            return Err(CareShareError::RecordExists(format!(
                "A record for {} already exists",
                record.record_date
            )));
        }
        let id = record.id.clone();
        records.push(record);
        Ok(id)
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserProfile>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, user_id: &str) -> Result<Option<UserProfile>> {
        Ok(self.users.read().await.get(user_id).cloned())
    }

    async fn upsert_user(&self, user: UserProfile) -> Result<()> {
        self.users.write().await.insert(user.id.clone(), user);
        Ok(())
    }
}

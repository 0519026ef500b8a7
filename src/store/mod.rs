//! Record store adapter
//!
//! The traits below are the storage contract the domain services depend
//! on. `MongoStore` backs production, `MemoryStore` backs dev mode and
//! tests. Both honor the same atomicity guarantees.

pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::UserRole;
use crate::projection::FieldSet;
use crate::records::HealthRecord;
use crate::shares::Share;
use crate::types::Result;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Result of a conditional share insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(Share),
    /// An active share for the same (owner, viewer) pair already exists
    Duplicate,
}

/// Persistence for shares
#[async_trait]
pub trait ShareStore: Send + Sync {
    async fn list_active_by_owner(&self, owner_id: &str) -> Result<Vec<Share>>;

    async fn list_active_by_viewer_email(&self, email: &str) -> Result<Vec<Share>>;

    /// Insert `share` unless an active share for the same
    /// (owner_id, shared_with_email) pair exists. Atomic.
    async fn insert_share_if_absent(&self, share: Share) -> Result<InsertOutcome>;

    async fn get_share(&self, share_id: &str) -> Result<Option<Share>>;

    /// Set `active = false`. Returns false when no share has this id.
    async fn deactivate_share(&self, share_id: &str) -> Result<bool>;
}

/// Persistence for health records
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Records of every listed owner. Fields outside `fields` are never
    /// read from storage.
    async fn query_records_by_owners(
        &self,
        owner_ids: &[String],
        fields: FieldSet,
    ) -> Result<Vec<HealthRecord>>;

    /// One owner's records, newest `record_date` first
    async fn query_records_by_owner(&self, owner_id: &str) -> Result<Vec<HealthRecord>>;

    /// Fails with `RecordExists` when the owner already tracked that day
    async fn insert_record(&self, record: HealthRecord) -> Result<String>;
}

/// Known user, as recorded at onboarding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    pub updated_at: DateTime<Utc>,
}

/// Lookup of users by id or email
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserProfile>>;

    async fn find_user_by_id(&self, user_id: &str) -> Result<Option<UserProfile>>;

    /// Insert or replace the profile keyed by `id`
    async fn upsert_user(&self, user: UserProfile) -> Result<()>;
}

/// The three storage roles, usually backed by one store
#[derive(Clone)]
pub struct Stores {
    pub shares: Arc<dyn ShareStore>,
    pub records: Arc<dyn RecordStore>,
    pub users: Arc<dyn UserDirectory>,
    /// Backend name, reported by the health endpoint
    pub backend: &'static str,
}

impl Stores {
    pub fn from_backend<S>(store: Arc<S>, backend: &'static str) -> Self
    where
        S: ShareStore + RecordStore + UserDirectory + 'static,
    {
        Self {
            shares: store.clone(),
            records: store.clone(),
            users: store,
            backend,
        }
    }

    pub fn memory() -> Self {
        Self::from_backend(Arc::new(MemoryStore::new()), "memory")
    }
}

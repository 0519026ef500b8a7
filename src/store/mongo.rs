//! MongoDB-backed store

use async_trait::async_trait;
use bson::{doc, DateTime};
use tracing::debug;

use super::{InsertOutcome, RecordStore, ShareStore, UserDirectory, UserProfile};
use crate::db::schemas::{
    HealthRecordDoc, ShareDoc, UserDoc, HEALTH_RECORD_COLLECTION, SHARE_COLLECTION,
    USER_COLLECTION,
};
use crate::db::{MongoClient, MongoCollection};
use crate::projection::FieldSet;
use crate::records::HealthRecord;
use crate::shares::Share;
use crate::types::{CareShareError, Result};

#[derive(Clone)]
pub struct MongoStore {
    shares: MongoCollection<ShareDoc>,
    records: MongoCollection<HealthRecordDoc>,
    users: MongoCollection<UserDoc>,
}

impl MongoStore {
    /// Open the collections, creating their indexes
    pub async fn connect(client: &MongoClient) -> Result<Self> {
        Ok(Self {
            shares: client.collection(SHARE_COLLECTION).await?,
            records: client.collection(HEALTH_RECORD_COLLECTION).await?,
            users: client.collection(USER_COLLECTION).await?,
        })
    }
}

#[async_trait]
impl ShareStore for MongoStore {
    async fn list_active_by_owner(&self, owner_id: &str) -> Result<Vec<Share>> {
        let docs = self
            .shares
            .find_many(doc! { "owner_id": owner_id, "active": true }, None, None)
            .await?;
        Ok(docs.into_iter().map(Share::from).collect())
    }

    async fn list_active_by_viewer_email(&self, email: &str) -> Result<Vec<Share>> {
        let docs = self
            .shares
            .find_many(doc! { "shared_with_email": email, "active": true }, None, None)
            .await?;
        Ok(docs.into_iter().map(Share::from).collect())
    }

    async fn insert_share_if_absent(&self, share: Share) -> Result<InsertOutcome> {
        // The partial unique index on active shares makes this atomic
        if self.shares.try_insert_one(share.clone().into()).await? {
            Ok(InsertOutcome::Inserted(share))
        } else {
            debug!(owner_id = %share.owner_id, "Active share already exists");
            Ok(InsertOutcome::Duplicate)
        }
    }

    async fn get_share(&self, share_id: &str) -> Result<Option<Share>> {
        Ok(self
            .shares
            .find_one(doc! { "id": share_id })
            .await?
            .map(Share::from))
    }

    async fn deactivate_share(&self, share_id: &str) -> Result<bool> {
        let result = self
            .shares
            .update_one(
                doc! { "id": share_id },
                doc! { "$set": { "active": false, "metadata.updated_at": DateTime::now() } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }
}

#[async_trait]
impl RecordStore for MongoStore {
    async fn query_records_by_owners(
        &self,
        owner_ids: &[String],
        fields: FieldSet,
    ) -> Result<Vec<HealthRecord>> {
        if owner_ids.is_empty() {
            return Ok(Vec::new());
        }
        let docs = self
            .records
            .find_many(
                doc! { "user_id": { "$in": owner_ids.to_vec() } },
                Some(HealthRecordDoc::projection(fields)),
                Some(doc! { "record_date": -1 }),
            )
            .await?;
        Ok(docs.into_iter().map(HealthRecord::from).collect())
    }

    async fn query_records_by_owner(&self, owner_id: &str) -> Result<Vec<HealthRecord>> {
        let docs = self
            .records
            .find_many(
                doc! { "user_id": owner_id },
                Some(HealthRecordDoc::projection(FieldSet::Full)),
                Some(doc! { "record_date": -1 }),
            )
            .await?;
        Ok(docs.into_iter().map(HealthRecord::from).collect())
    }

    async fn insert_record(&self, record: HealthRecord) -> Result<String> {
        let id = record.id.clone();
        let date = record.record_date;
        if self.records.try_insert_one(record.into()).await? {
            Ok(id)
        } else {
            Err(CareShareError::RecordExists(format!(
                "A record for {} already exists",
                date
            )))
        }
    }
}

#[async_trait]
impl UserDirectory for MongoStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserProfile>> {
        Ok(self
            .users
            .find_one(doc! { "email": email })
            .await?
            .map(UserDoc::into_profile))
    }

    async fn find_user_by_id(&self, user_id: &str) -> Result<Option<UserProfile>> {
        Ok(self
            .users
            .find_one(doc! { "id": user_id })
            .await?
            .map(UserDoc::into_profile))
    }

    async fn upsert_user(&self, user: UserProfile) -> Result<()> {
        let now = DateTime::now();
        let mut set = doc! {
            "email": user.email.as_str(),
            "metadata.updated_at": now,
        };
        if let Some(role) = user.role {
            set.insert("role", role.as_str());
        }
        self.users
            .upsert_one(
                doc! { "id": user.id.as_str() },
                doc! {
                    "$set": set,
                    "$setOnInsert": { "metadata.created_at": now },
                },
            )
            .await?;
        Ok(())
    }
}

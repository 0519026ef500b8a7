//! Record service
//!
//! Viewer flow: resolve capabilities, find the owners who shared with the
//! viewer, fetch only the permitted fields, project, group by owner.
//! Owners always see their own records in full; ownership is not a share.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{HealthRecord, NewHealthRecord};
use crate::auth::Viewer;
use crate::permissions::{CapabilitySet, PermissionResolver};
use crate::projection::{project_all, FieldSet, ProjectedRecord};
use crate::shares::ShareRegistry;
use crate::store::{RecordStore, UserDirectory};
use crate::types::Result;

/// One owner's records as seen by a viewer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnerRecords {
    pub owner_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_record: Option<ProjectedRecord>,
    /// Newest `record_date` first
    pub records: Vec<ProjectedRecord>,
}

/// Everything a viewer may see, with the capabilities that shaped it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewableRecords {
    pub capabilities: CapabilitySet,
    pub owners: Vec<OwnerRecords>,
}

#[derive(Clone)]
pub struct RecordService {
    resolver: Arc<PermissionResolver>,
    shares: ShareRegistry,
    records: Arc<dyn RecordStore>,
    directory: Arc<dyn UserDirectory>,
}

impl RecordService {
    pub fn new(
        resolver: Arc<PermissionResolver>,
        shares: ShareRegistry,
        records: Arc<dyn RecordStore>,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            resolver,
            shares,
            records,
            directory,
        }
    }

    /// Records of every owner with an active share naming the viewer
    pub async fn viewable_records(&self, viewer: &Viewer) -> Result<ViewableRecords> {
        let capabilities = self.resolver.resolve_capabilities(&viewer.id).await;

        let Some(fields) = FieldSet::for_capabilities(&capabilities) else {
            debug!(user_id = %viewer.id, "No view capability, skipping record query");
            return Ok(ViewableRecords {
                capabilities,
                owners: Vec::new(),
            });
        };

        let owner_ids = self.shares.visible_owner_ids(&viewer.email).await?;
        if owner_ids.is_empty() {
            return Ok(ViewableRecords {
                capabilities,
                owners: Vec::new(),
            });
        }

        let fetched = self.records.query_records_by_owners(&owner_ids, fields).await?;

        let mut by_owner: BTreeMap<String, Vec<HealthRecord>> = owner_ids
            .iter()
            .map(|id| (id.clone(), Vec::new()))
            .collect();
        for record in fetched {
            // Anything outside the shared owners is dropped
            if let Some(bucket) = by_owner.get_mut(&record.user_id) {
                bucket.push(record);
            }
        }

        let mut owners = Vec::with_capacity(by_owner.len());
        for (owner_id, mut records) in by_owner {
            sort_newest_first(&mut records);
            let records = project_all(records, &capabilities);
            owners.push(OwnerRecords {
                owner_email: self.owner_email(&owner_id).await,
                latest_record: records.first().cloned(),
                owner_id,
                records,
            });
        }

        // Most recently active owners first
        owners.sort_by(|a, b| {
            let a_date = a.latest_record.as_ref().map(ProjectedRecord::record_date);
            let b_date = b.latest_record.as_ref().map(ProjectedRecord::record_date);
            b_date.cmp(&a_date).then_with(|| a.owner_id.cmp(&b.owner_id))
        });

        info!(
            user_id = %viewer.id,
            owners = owners.len(),
            visibility = ?capabilities.visibility(),
            "Served shared records"
        );

        Ok(ViewableRecords {
            capabilities,
            owners,
        })
    }

    /// The caller's own records, newest first
    pub async fn own_records(&self, viewer: &Viewer) -> Result<Vec<HealthRecord>> {
        let mut records = self.records.query_records_by_owner(&viewer.id).await?;
        sort_newest_first(&mut records);
        Ok(records)
    }

    /// Track a day for the caller
    pub async fn track_record(&self, viewer: &Viewer, input: NewHealthRecord) -> Result<HealthRecord> {
        let record = input.into_record(&viewer.id)?;
        self.records.insert_record(record.clone()).await?;
        info!(user_id = %viewer.id, record_date = %record.record_date, "Record tracked");
        Ok(record)
    }

    /// Best effort: a directory failure only loses the email label
    async fn owner_email(&self, owner_id: &str) -> Option<String> {
        match self.directory.find_user_by_id(owner_id).await {
            Ok(user) => user.map(|u| u.email),
            Err(e) => {
                warn!(owner_id = %owner_id, error = %e, "Owner lookup failed");
                None
            }
        }
    }
}

fn sort_newest_first(records: &mut [HealthRecord]) {
    records.sort_by(|a, b| {
        b.record_date
            .cmp(&a.record_date)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

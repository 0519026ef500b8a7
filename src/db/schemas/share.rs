//! Share document schema

use bson::{doc, oid::ObjectId, Document};
use chrono::{DateTime, Utc};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;
use crate::shares::Share;

pub const SHARE_COLLECTION: &str = "record_shares";

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ShareDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub id: String,
    pub owner_id: String,
    pub shared_with_email: String,
    pub active: bool,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl From<Share> for ShareDoc {
    fn from(share: Share) -> Self {
        Self {
            _id: None,
            metadata: Metadata::default(),
            id: share.id,
            owner_id: share.owner_id,
            shared_with_email: share.shared_with_email,
            active: share.active,
            created_at: share.created_at,
        }
    }
}

impl From<ShareDoc> for Share {
    fn from(doc: ShareDoc) -> Self {
        Self {
            id: doc.id,
            owner_id: doc.owner_id,
            shared_with_email: doc.shared_with_email,
            active: doc.active,
            created_at: doc.created_at,
        }
    }
}

impl IntoIndexes for ShareDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("share_id_unique".to_string())
                        .build(),
                ),
            ),
            // At most one active share per (owner, viewer). Inactive shares
            // fall outside the filter, so re-sharing after a revoke works.
            (
                doc! { "owner_id": 1, "shared_with_email": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .partial_filter_expression(doc! { "active": true })
                        .name("active_share_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "shared_with_email": 1, "active": 1 },
                Some(
                    IndexOptions::builder()
                        .name("viewer_email_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for ShareDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

//! Health record document schema

use bson::{doc, oid::ObjectId, Document};
use chrono::{DateTime, NaiveDate, Utc};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;
use crate::projection::FieldSet;
use crate::records::{HealthRecord, Mood, PeriodFlow, Symptom};

pub const HEALTH_RECORD_COLLECTION: &str = "health_records";

/// Stored record. `record_date` is kept as an ISO date string so that
/// lexical and chronological order agree.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthRecordDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub id: String,
    pub user_id: String,
    pub record_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_flow: Option<PeriodFlow>,
    #[serde(default)]
    pub symptoms: BTreeSet<Symptom>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<Mood>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl HealthRecordDoc {
    /// Server-side projection for a field set
    pub fn projection(fields: FieldSet) -> Document {
        let mut projection = Document::new();
        for field in fields.fields() {
            projection.insert(*field, 1);
        }
        projection.insert("_id", 0);
        projection
    }
}

impl From<HealthRecord> for HealthRecordDoc {
    fn from(record: HealthRecord) -> Self {
        Self {
            _id: None,
            metadata: Metadata::default(),
            id: record.id,
            user_id: record.user_id,
            record_date: record.record_date,
            period_flow: record.period_flow,
            symptoms: record.symptoms,
            mood: record.mood,
            notes: record.notes,
            created_at: record.created_at,
        }
    }
}

impl From<HealthRecordDoc> for HealthRecord {
    fn from(doc: HealthRecordDoc) -> Self {
        Self {
            id: doc.id,
            user_id: doc.user_id,
            record_date: doc.record_date,
            period_flow: doc.period_flow,
            symptoms: doc.symptoms,
            mood: doc.mood,
            notes: doc.notes,
            created_at: doc.created_at,
        }
    }
}

impl IntoIndexes for HealthRecordDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("record_id_unique".to_string())
                        .build(),
                ),
            ),
            // One record per owner and day; also serves the descending listing
            (
                doc! { "user_id": 1, "record_date": -1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("owner_day_unique".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for HealthRecordDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

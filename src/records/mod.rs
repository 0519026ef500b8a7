//! Health records
//!
//! Data model plus the service that ties capability resolution, share
//! lookup, storage, and projection together.

pub mod model;
pub mod service;

pub use model::{HealthRecord, Mood, NewHealthRecord, PeriodFlow, Symptom, MAX_NOTES_LEN};
pub use service::{OwnerRecords, RecordService, ViewableRecords};

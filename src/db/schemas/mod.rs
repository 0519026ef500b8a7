//! Database schemas for CareShare
//!
//! Document structures for users, shares, and health records.

mod health_record;
mod metadata;
mod share;
mod user;

pub use health_record::{HealthRecordDoc, HEALTH_RECORD_COLLECTION};
pub use metadata::Metadata;
pub use share::{ShareDoc, SHARE_COLLECTION};
pub use user::{UserDoc, USER_COLLECTION};

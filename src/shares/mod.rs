//! Share registry
//!
//! A share is a revocable grant from a record owner to a viewer, keyed by
//! the viewer's email. Shares are never hard-deleted: revoking flips
//! `active` to false.

pub mod registry;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use registry::ShareRegistry;

/// Owner-to-viewer grant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    pub id: String,
    /// Owner of the health data
    pub owner_id: String,
    /// Normalized viewer email
    pub shared_with_email: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Share {
    /// New active share with a fresh id
    pub fn new(owner_id: &str, viewer_email: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            shared_with_email: normalize_email(viewer_email),
            active: true,
            created_at: Utc::now(),
        }
    }
}

/// Canonical form used whenever an email is stored or compared
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

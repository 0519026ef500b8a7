//! Policy oracle client
//!
//! The oracle is an external authorization service consulted over a
//! request/response boundary. It is injected into the resolver as a
//! `PolicyOracle` trait object so tests can substitute a scripted oracle.

pub mod cache;
pub mod client;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::auth::{PolicyAction, UserRole};
use crate::types::CareShareError;

pub use cache::{CachedPolicyOracle, DecisionCacheConfig};
pub use client::{HttpPolicyOracle, HttpPolicyOracleConfig};

/// Identity as synced to the policy store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyUser {
    pub id: String,
    pub email: String,
}

/// External authorization decision service
#[async_trait]
pub trait PolicyOracle: Send + Sync {
    /// Whether `user_id` may perform `action` on `resource`
    async fn check(
        &self,
        user_id: &str,
        action: PolicyAction,
        resource: &str,
    ) -> Result<bool, CareShareError>;

    /// Idempotently upsert identity and role assignment
    async fn sync_user(&self, user: &PolicyUser, role: UserRole) -> Result<bool, CareShareError>;
}

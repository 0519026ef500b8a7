//! Bounded-freshness cache in front of the policy oracle
//!
//! Decisions are served from memory for up to `ttl` (10 minutes by default),
//! so callers must tolerate a stale decision within that window. Only
//! successful decisions are cached: a failed check is retried on the next
//! resolution instead of pinning a fail-closed answer for the whole window.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use super::{PolicyOracle, PolicyUser};
use crate::auth::{PolicyAction, UserRole};
use crate::types::CareShareError;

/// Configuration for the decision cache
#[derive(Debug, Clone)]
pub struct DecisionCacheConfig {
    pub ttl: Duration,
    pub max_entries: usize,
}

impl Default for DecisionCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(600),
            max_entries: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DecisionKey {
    user_id: String,
    action: PolicyAction,
    resource: String,
}

#[derive(Debug, Clone, Copy)]
struct CachedDecision {
    permitted: bool,
    expires_at: Instant,
}

/// Cache hit/miss counters
#[derive(Debug, Default)]
pub struct DecisionCacheStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
}

/// Caching decorator for any `PolicyOracle`
pub struct CachedPolicyOracle {
    inner: Arc<dyn PolicyOracle>,
    config: DecisionCacheConfig,
    decisions: DashMap<DecisionKey, CachedDecision>,
    stats: DecisionCacheStats,
}

impl CachedPolicyOracle {
    pub fn new(inner: Arc<dyn PolicyOracle>, config: DecisionCacheConfig) -> Self {
        Self {
            inner,
            config,
            decisions: DashMap::new(),
            stats: DecisionCacheStats::default(),
        }
    }

    pub fn stats(&self) -> &DecisionCacheStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    /// Drop every cached decision for a user
    pub fn invalidate_user(&self, user_id: &str) {
        self.decisions.retain(|key, _| key.user_id != user_id);
    }

    fn get_fresh(&self, key: &DecisionKey) -> Option<bool> {
        let entry = self.decisions.get(key)?;
        if entry.expires_at > Instant::now() {
            Some(entry.permitted)
        } else {
            drop(entry);
            self.decisions.remove(key);
            None
        }
    }

    fn store(&self, key: DecisionKey, permitted: bool) {
        if self.decisions.len() >= self.config.max_entries {
            let now = Instant::now();
            self.decisions.retain(|_, v| v.expires_at > now);

            // Still full: drop half
            if self.decisions.len() >= self.config.max_entries {
                let to_remove: Vec<DecisionKey> = self
                    .decisions
                    .iter()
                    .take(self.decisions.len() / 2 + 1)
                    .map(|e| e.key().clone())
                    .collect();
                for key in to_remove {
                    self.decisions.remove(&key);
                }
            }
        }

        self.decisions.insert(
            key,
            CachedDecision {
                permitted,
                expires_at: Instant::now() + self.config.ttl,
            },
        );
    }
}

#[async_trait::async_trait]
impl PolicyOracle for CachedPolicyOracle {
    async fn check(
        &self,
        user_id: &str,
        action: PolicyAction,
        resource: &str,
    ) -> Result<bool, CareShareError> {
        let key = DecisionKey {
            user_id: user_id.to_string(),
            action,
            resource: resource.to_string(),
        };

        if let Some(permitted) = self.get_fresh(&key) {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            debug!(user_id = %user_id, action = %action, "Policy decision served from cache");
            return Ok(permitted);
        }
        self.stats.misses.fetch_add(1, Ordering::Relaxed);

        let permitted = self.inner.check(user_id, action, resource).await?;
        self.store(key, permitted);
        Ok(permitted)
    }

    async fn sync_user(&self, user: &PolicyUser, role: UserRole) -> Result<bool, CareShareError> {
        let result = self.inner.sync_user(user, role).await;
        // A role change can flip any decision for this user
        self.invalidate_user(&user.id);
        result
    }
}

//! Configuration for CareShare
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::types::CareShareError;

/// Minimum accepted length for the identity token secret
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// CareShare - permission-scoped health record sharing
#[derive(Parser, Debug, Clone)]
#[command(name = "careshare")]
#[command(about = "Health record sharing service with role-based visibility")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Enable development mode (in-memory store fallback, insecure JWT secret)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "careshare")]
    pub mongodb_db: String,

    /// Secret the auth provider signs identity tokens with (HS256)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// Policy check endpoint: {userId, action, resource} -> {permitted}
    #[arg(long, env = "POLICY_CHECK_URL", default_value = "http://localhost:7766/check")]
    pub policy_check_url: String,

    /// User/role sync endpoint: {user, role} -> {success}
    #[arg(long, env = "POLICY_SYNC_URL", default_value = "http://localhost:7766/sync-user")]
    pub policy_sync_url: String,

    /// Bearer token for the policy service (optional)
    #[arg(long, env = "POLICY_API_KEY")]
    pub policy_api_key: Option<String>,

    /// Per-check timeout against the policy service in milliseconds
    #[arg(long, env = "POLICY_TIMEOUT_MS", default_value = "3000")]
    pub policy_timeout_ms: u64,

    /// How long a policy decision may be served from cache, in seconds
    #[arg(long, env = "POLICY_CACHE_TTL_SECS", default_value = "600")]
    pub policy_cache_ttl_secs: u64,

    /// Maximum number of cached policy decisions
    #[arg(long, env = "POLICY_CACHE_MAX_ENTRIES", default_value = "10000")]
    pub policy_cache_max_entries: usize,

    /// JSONL file for the authorization audit trail (optional)
    #[arg(long, env = "AUDIT_LOG_PATH")]
    pub audit_log_path: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format (text or json)
    #[arg(long, env = "LOG_FORMAT", default_value = "text")]
    pub log_format: String,
}

impl Args {
    /// Get effective JWT secret (falls back to a fixed value in dev mode)
    pub fn jwt_secret(&self) -> Result<String, CareShareError> {
        match (&self.jwt_secret, self.dev_mode) {
            (Some(secret), _) => Ok(secret.clone()),
            (None, true) => Ok("dev-mode-secret-not-for-production-use-123456".to_string()),
            (None, false) => Err(CareShareError::Config(
                "JWT_SECRET is required in production mode".into(),
            )),
        }
    }

    pub fn policy_timeout(&self) -> Duration {
        Duration::from_millis(self.policy_timeout_ms)
    }

    pub fn policy_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.policy_cache_ttl_secs)
    }

    /// Whether logs should be emitted as JSON
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode {
            match &self.jwt_secret {
                None => return Err("JWT_SECRET is required in production mode".to_string()),
                Some(s) if s.len() < MIN_JWT_SECRET_LEN => {
                    return Err(format!(
                        "JWT_SECRET must be at least {} characters",
                        MIN_JWT_SECRET_LEN
                    ))
                }
                Some(_) => {}
            }
        }

        if self.policy_timeout_ms == 0 {
            return Err("POLICY_TIMEOUT_MS must be greater than zero".to_string());
        }

        if self.policy_cache_max_entries == 0 {
            return Err("POLICY_CACHE_MAX_ENTRIES must be greater than zero".to_string());
        }

        if !matches!(self.log_format.to_ascii_lowercase().as_str(), "text" | "json") {
            return Err(format!("Unknown LOG_FORMAT '{}'", self.log_format));
        }

        Ok(())
    }
}

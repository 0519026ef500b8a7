//! Liveness endpoint

use hyper::StatusCode;
use serde::Serialize;
use std::sync::Arc;

use super::{json_response, FullResponse};
use crate::server::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: &'static str,
    /// Uptime in seconds
    pub uptime: u64,
    /// Storage backend in use
    pub store: &'static str,
    pub dev_mode: bool,
    pub timestamp: String,
}

/// Liveness check: 200 whenever the process is serving
pub fn health_check(state: Arc<AppState>) -> FullResponse {
    json_response(
        StatusCode::OK,
        &HealthResponse {
            healthy: true,
            version: env!("CARGO_PKG_VERSION"),
            uptime: state.started_at.elapsed().as_secs(),
            store: state.store_backend,
            dev_mode: state.args.dev_mode,
            timestamp: chrono::Utc::now().to_rfc3339(),
        },
    )
}

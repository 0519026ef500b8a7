//! Authorization audit trail
//!
//! Every capability resolution and every share/role mutation produces one
//! audit event. Events always go to `tracing` (target `careshare::audit`) and,
//! when a path is configured, are appended to a JSONL file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{error, info};
use uuid::Uuid;

/// Audit event types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    CapabilityResolution,
    ShareCreated,
    ShareRejected,
    ShareRevoked,
    RoleSynced,
}

/// One audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Correlation id of the request that produced the event
    pub request_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub event_type: AuditEventType,
    /// Acting user
    pub user_id: String,
    /// Operation input
    pub input: serde_json::Value,
    /// Operation result
    pub result: serde_json::Value,
}

impl AuditEvent {
    pub fn new(event_type: AuditEventType, request_id: Uuid, user_id: impl Into<String>) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
            event_type,
            user_id: user_id.into(),
            input: serde_json::Value::Null,
            result: serde_json::Value::Null,
        }
    }

    pub fn with_input(mut self, input: serde_json::Value) -> Self {
        self.input = input;
        self
    }

    pub fn with_result(mut self, result: serde_json::Value) -> Self {
        self.result = result;
        self
    }

    /// Convert to JSONL line
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Audit logger, cheap to clone.
///
/// File writes run on the blocking pool so a slow disk never stalls the
/// request path.
#[derive(Clone, Default)]
pub struct AuditLogger {
    writer: Arc<Mutex<Option<BufWriter<File>>>>,
}

impl AuditLogger {
    /// Logger that only mirrors to tracing
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize file logging to the specified path
    pub async fn init_file(&self, path: PathBuf) -> std::io::Result<()> {
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?
            .into_std()
            .await;

        *lock(&self.writer) = Some(BufWriter::new(file));

        info!("Audit logging initialized to {}", path.display());
        Ok(())
    }

    /// Record an audit event
    pub async fn log(&self, event: AuditEvent) {
        let jsonl = match event.to_jsonl() {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to serialize audit event: {}", e);
                return;
            }
        };

        info!(
            target: "careshare::audit",
            request_id = %event.request_id,
            event_type = ?event.event_type,
            user_id = %event.user_id,
            input = %event.input,
            result = %event.result,
            "audit"
        );

        let writer = Arc::clone(&self.writer);
        let written = tokio::task::spawn_blocking(move || {
            let mut guard = lock(&writer);
            let Some(writer) = guard.as_mut() else {
                return;
            };
            if let Err(e) = writeln!(writer, "{}", jsonl) {
                error!("Failed to write audit event: {}", e);
            }
            if let Err(e) = writer.flush() {
                error!("Failed to flush audit log: {}", e);
            }
        })
        .await;

        if let Err(e) = written {
            error!("Audit writer task failed: {}", e);
        }
    }
}

/// A panicked writer leaves the file usable, so recover the guard
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

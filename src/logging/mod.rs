//! Logging infrastructure for CareShare
//!
//! Provides the authorization audit trail.

pub mod audit;

pub use audit::{AuditEvent, AuditEventType, AuditLogger};

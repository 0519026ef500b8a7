//! CareShare - permission-scoped health record sharing
//!
//! Owners track daily health records and share them with partners,
//! doctors, or parents by email. What a viewer sees is decided per request
//! by an external policy oracle and enforced at field level.
//!
//! ## Flow
//!
//! - **Permissions**: oracle checks fan out concurrently and fail closed
//! - **Shares**: active owner-to-viewer grants, at most one per pair
//! - **Projection**: full, limited (no mood), or nothing
//! - **Store**: MongoDB, or an in-memory store in dev mode and tests

pub mod auth;
pub mod config;
pub mod db;
pub mod logging;
pub mod onboarding;
pub mod permissions;
pub mod policy;
pub mod projection;
pub mod records;
pub mod routes;
pub mod server;
pub mod shares;
pub mod store;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{CareShareError, Result};

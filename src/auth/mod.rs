//! Authentication and authorization vocabulary for CareShare
//!
//! Provides:
//! - Identity token validation (tokens are issued by the external auth provider)
//! - Onboarding roles and the policy actions checked against the oracle

pub mod jwt;
pub mod roles;

pub use jwt::{extract_token_from_header, Claims, JwtValidator, Viewer};
pub use roles::{PolicyAction, UserRole, HEALTH_RECORDS_RESOURCE};

//! Shared types for CareShare

pub mod error;

pub use error::{CareShareError, Result};

//! Error types for CareShare
//!
//! Permission-resolution failures never reach this type as hard errors: the
//! resolver swallows them into the restrictive capability set. Everything
//! here degrades a single request, nothing is fatal to the process.

use hyper::StatusCode;

/// Main error type for CareShare operations
#[derive(Debug, thiserror::Error)]
pub enum CareShareError {
    #[error("Authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("Records are already shared with {0}")]
    DuplicateShare(String),

    #[error("Recipient not found: {0}")]
    RecipientNotFound(String),

    #[error("A record already exists for {0}")]
    RecordExists(String),

    #[error("Policy service unavailable: {0}")]
    OracleUnavailable(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CareShareError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::AuthenticationRequired(_) => StatusCode::UNAUTHORIZED,
            Self::DuplicateShare(_) => StatusCode::CONFLICT,
            Self::RecipientNotFound(_) => StatusCode::NOT_FOUND,
            Self::RecordExists(_) => StatusCode::CONFLICT,
            Self::OracleUnavailable(_) => StatusCode::BAD_GATEWAY,
            Self::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code for JSON error bodies
    pub fn code(&self) -> &'static str {
        match self {
            Self::AuthenticationRequired(_) => "AUTH_REQUIRED",
            Self::DuplicateShare(_) => "DUPLICATE_SHARE",
            Self::RecipientNotFound(_) => "RECIPIENT_NOT_FOUND",
            Self::RecordExists(_) => "RECORD_EXISTS",
            Self::OracleUnavailable(_) => "POLICY_UNAVAILABLE",
            Self::Store(_) => "STORE_ERROR",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to show to the client.
    ///
    /// Store and internal failures are logged server-side with full detail
    /// but only a generic message leaves the process.
    pub fn public_message(&self) -> String {
        match self {
            Self::Store(_) => "Database operation failed".to_string(),
            Self::Config(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::OracleUnavailable(_) => "Policy service unavailable, please retry".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<std::io::Error> for CareShareError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for CareShareError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<hyper::Error> for CareShareError {
    fn from(err: hyper::Error) -> Self {
        Self::Internal(format!("HTTP error: {}", err))
    }
}

impl From<mongodb::error::Error> for CareShareError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Store(err.to_string())
    }
}

impl From<bson::ser::Error> for CareShareError {
    fn from(err: bson::ser::Error) -> Self {
        Self::Store(format!("BSON encoding failed: {}", err))
    }
}

impl From<reqwest::Error> for CareShareError {
    fn from(err: reqwest::Error) -> Self {
        Self::OracleUnavailable(err.to_string())
    }
}

/// Result type alias for CareShare operations
pub type Result<T> = std::result::Result<T, CareShareError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            CareShareError::AuthenticationRequired("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            CareShareError::DuplicateShare("a@b.c".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            CareShareError::RecipientNotFound("a@b.c".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            CareShareError::Store("down".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_store_details_not_exposed() {
        let err = CareShareError::Store("connection refused at 10.0.0.4:27017".into());
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(!err.public_message().contains("10.0.0.4"));
    }

    #[test]
    fn test_domain_errors_keep_message() {
        let err = CareShareError::DuplicateShare("doc@clinic.example".into());
        assert!(err.public_message().contains("doc@clinic.example"));
        assert_eq!(err.code(), "DUPLICATE_SHARE");
    }
}

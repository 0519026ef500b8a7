//! Identity token handling
//!
//! Identity is established by the external auth provider, which issues
//! HS256-signed JWTs. CareShare only verifies them and extracts the caller's
//! stable id (`sub`) and email. A request without a verified identity never
//! reaches the record or share logic.

use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::config::MIN_JWT_SECRET_LEN;
use crate::types::CareShareError;

/// Claims carried by an identity token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Stable, opaque user id
    pub sub: String,
    /// Email the user signed up with
    pub email: String,
    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub id: String,
    /// Normalized (trimmed, lowercased) email
    pub email: String,
}

impl Viewer {
    pub fn new(id: impl Into<String>, email: &str) -> Self {
        Self {
            id: id.into(),
            email: crate::shares::normalize_email(email),
        }
    }
}

impl From<Claims> for Viewer {
    fn from(claims: Claims) -> Self {
        Viewer::new(claims.sub, &claims.email)
    }
}

/// JWT validator
#[derive(Clone)]
pub struct JwtValidator {
    secret: String,
}

impl JwtValidator {
    /// Create a new JWT validator
    ///
    /// Returns an error if the secret is empty or too short
    pub fn new(secret: String) -> Result<Self, CareShareError> {
        if secret.is_empty() {
            return Err(CareShareError::Config(
                "JWT_SECRET is required in production mode".into(),
            ));
        }

        if secret.len() < MIN_JWT_SECRET_LEN {
            return Err(CareShareError::Config(format!(
                "JWT_SECRET must be at least {} characters",
                MIN_JWT_SECRET_LEN
            )));
        }

        Ok(Self { secret })
    }

    /// Verify a token and return the caller it identifies
    pub fn verify(&self, token: &str) -> Result<Viewer, CareShareError> {
        let mut validation = Validation::default();
        // Provider tokens carry an audience we do not pin
        validation.validate_aud = false;

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|err| {
            use jsonwebtoken::errors::ErrorKind;
            let msg = match err.kind() {
                ErrorKind::ExpiredSignature => "Token expired",
                ErrorKind::InvalidToken => "Invalid token",
                ErrorKind::InvalidSignature => "Invalid signature",
                _ => "Token validation failed",
            };
            CareShareError::AuthenticationRequired(msg.into())
        })?;

        if data.claims.sub.is_empty() || data.claims.email.trim().is_empty() {
            return Err(CareShareError::AuthenticationRequired(
                "Token is missing subject or email".into(),
            ));
        }

        Ok(data.claims.into())
    }

    /// Verify the Authorization header of a request
    pub fn authenticate(&self, auth_header: Option<&str>) -> Result<Viewer, CareShareError> {
        let token = extract_token_from_header(auth_header)
            .ok_or_else(|| CareShareError::AuthenticationRequired("No token provided".into()))?;
        self.verify(token)
    }
}

/// Extract token from Authorization header.
/// Supports "Bearer <token>" format and raw tokens.
pub fn extract_token_from_header(auth_header: Option<&str>) -> Option<&str> {
    let header = auth_header?;

    if let Some(token) = header.strip_prefix("Bearer ") {
        let token = token.trim();
        if !token.is_empty() {
            return Some(token);
        }
    }

    if !header.contains(' ') {
        let token = header.trim();
        if !token.is_empty() {
            return Some(token);
        }
    }

    None
}

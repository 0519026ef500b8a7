//! HTTP routes for CareShare
//!
//! Every `/api/*` route requires a verified identity token. Handlers return
//! `Result<_, CareShareError>`; the dispatcher turns errors into JSON
//! bodies with a stable `code`.

pub mod capabilities;
pub mod health;
pub mod records;
pub mod shares;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Incoming};
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, warn};

use crate::auth::Viewer;
use crate::server::AppState;
use crate::types::CareShareError;

pub use health::health_check;

/// Largest JSON body accepted
pub const MAX_BODY_BYTES: usize = 16 * 1024;

pub type FullResponse = Response<Full<Bytes>>;

#[derive(Debug, Serialize)]
struct ErrorResponse<'a> {
    error: String,
    code: &'a str,
}

/// Dispatch an authenticated `/api/*` request
pub async fn handle_api_request(req: Request<Incoming>, state: Arc<AppState>) -> FullResponse {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let auth_header = get_auth_header(&req).map(str::to_owned);
    let viewer = match authenticate(auth_header.as_deref(), &state).await {
        Ok(viewer) => viewer,
        Err(e) => return error_response(e),
    };

    let result = match (&method, path.as_str()) {
        (&Method::GET, "/api/capabilities") => {
            capabilities::handle_capabilities(&state, &viewer).await
        }
        (&Method::POST, "/api/roles") => capabilities::handle_select_role(req, &state, &viewer).await,

        (&Method::GET, "/api/records") => records::handle_own_records(&state, &viewer).await,
        (&Method::POST, "/api/records") => records::handle_track_record(req, &state, &viewer).await,
        (&Method::GET, "/api/records/shared") => {
            records::handle_shared_records(&state, &viewer).await
        }

        (&Method::GET, "/api/shares") => shares::handle_outgoing_shares(&state, &viewer).await,
        (&Method::GET, "/api/shares/incoming") => {
            shares::handle_incoming_shares(&state, &viewer).await
        }
        (&Method::POST, "/api/shares") => shares::handle_create_share(req, &state, &viewer).await,
        (&Method::DELETE, p) if p.starts_with("/api/shares/") => {
            let share_id = &p["/api/shares/".len()..];
            shares::handle_revoke_share(&state, &viewer, share_id).await
        }

        _ => return not_found_response(&path),
    };

    result.unwrap_or_else(error_response)
}

/// Verify the caller's token and make sure they are known to the directory
async fn authenticate(auth_header: Option<&str>, state: &AppState) -> Result<Viewer, CareShareError> {
    let viewer = state.jwt.authenticate(auth_header)?;

    // Registration only enables sharing by email; a failure here must not
    // block the caller's own request.
    if let Err(e) = state.roles.ensure_registered(&viewer).await {
        warn!(user_id = %viewer.id, error = %e, "Failed to register user in directory");
    }

    Ok(viewer)
}

fn get_auth_header(req: &Request<Incoming>) -> Option<&str> {
    req.headers()
        .get(hyper::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
}

async fn parse_json_body<T: for<'de> Deserialize<'de>>(
    req: Request<Incoming>,
) -> Result<T, CareShareError> {
    read_json_limited(req.into_body(), MAX_BODY_BYTES).await
}

/// Read at most `limit` bytes of `body` and decode them as JSON.
///
/// The limit is enforced while the body streams in, so an oversized upload
/// is rejected before it is buffered.
async fn read_json_limited<B, T>(body: B, limit: usize) -> Result<T, CareShareError>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    T: for<'de> Deserialize<'de>,
{
    let bytes = Limited::new(body, limit)
        .collect()
        .await
        .map_err(|e| {
            if e.downcast_ref::<LengthLimitError>().is_some() {
                CareShareError::BadRequest("Request body too large".into())
            } else {
                CareShareError::BadRequest(format!("Failed to read body: {}", e))
            }
        })?
        .to_bytes();

    serde_json::from_slice(&bytes)
        .map_err(|e| CareShareError::BadRequest(format!("Invalid JSON: {}", e)))
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> FullResponse {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Cache-Control", "no-store")
        .body(Full::new(Bytes::from(json)))
        .unwrap()
}

pub fn error_response(err: CareShareError) -> FullResponse {
    let status = err.status_code();
    if status.is_server_error() {
        error!(code = err.code(), error = %err, "Request failed");
    }
    json_response(
        status,
        &ErrorResponse {
            error: err.public_message(),
            code: err.code(),
        },
    )
}

/// CORS preflight response
pub fn preflight_response() -> FullResponse {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Headers", "Authorization, Content-Type")
        .header("Access-Control-Allow-Methods", "GET, POST, DELETE, OPTIONS")
        .header("Access-Control-Max-Age", "86400")
        .body(Full::new(Bytes::new()))
        .unwrap()
}

pub fn not_found_response(path: &str) -> FullResponse {
    json_response(
        StatusCode::NOT_FOUND,
        &serde_json::json!({
            "error": "Not Found",
            "code": "NOT_FOUND",
            "path": path,
        }),
    )
}

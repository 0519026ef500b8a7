//! Share management routes

use hyper::body::Incoming;
use hyper::{Request, StatusCode};
use serde::{Deserialize, Serialize};

use super::{json_response, parse_json_body, FullResponse};
use crate::auth::Viewer;
use crate::server::AppState;
use crate::shares::Share;
use crate::types::CareShareError;

#[derive(Deserialize)]
struct CreateShareRequest {
    email: String,
}

#[derive(Serialize)]
struct SharesResponse {
    shares: Vec<Share>,
}

#[derive(Serialize)]
struct ShareResponse {
    share: Share,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RevokeResponse<'a> {
    share_id: &'a str,
    revoked: bool,
}

/// GET /api/shares
pub async fn handle_outgoing_shares(
    state: &AppState,
    viewer: &Viewer,
) -> Result<FullResponse, CareShareError> {
    let shares = state.shares.list_active_shares_by_owner(&viewer.id).await?;
    Ok(json_response(StatusCode::OK, &SharesResponse { shares }))
}

/// GET /api/shares/incoming
pub async fn handle_incoming_shares(
    state: &AppState,
    viewer: &Viewer,
) -> Result<FullResponse, CareShareError> {
    let shares = state
        .shares
        .list_active_shares_by_viewer_email(&viewer.email)
        .await?;
    Ok(json_response(StatusCode::OK, &SharesResponse { shares }))
}

/// POST /api/shares
pub async fn handle_create_share(
    req: Request<Incoming>,
    state: &AppState,
    viewer: &Viewer,
) -> Result<FullResponse, CareShareError> {
    let body: CreateShareRequest = parse_json_body(req).await?;
    let share = state.shares.create_share(&viewer.id, &body.email).await?;
    Ok(json_response(StatusCode::CREATED, &ShareResponse { share }))
}

/// DELETE /api/shares/{id}
pub async fn handle_revoke_share(
    state: &AppState,
    viewer: &Viewer,
    share_id: &str,
) -> Result<FullResponse, CareShareError> {
    if share_id.is_empty() || share_id.contains('/') {
        return Err(CareShareError::BadRequest("Invalid share id".into()));
    }
    state.shares.revoke_owned_share(&viewer.id, share_id).await?;
    Ok(json_response(
        StatusCode::OK,
        &RevokeResponse {
            share_id,
            revoked: true,
        },
    ))
}

//! Capability and role onboarding routes

use hyper::body::Incoming;
use hyper::{Request, StatusCode};
use serde::{Deserialize, Serialize};

use super::{json_response, parse_json_body, FullResponse};
use crate::auth::{UserRole, Viewer};
use crate::permissions::{CapabilitySet, Visibility};
use crate::server::AppState;
use crate::store::UserProfile;
use crate::types::CareShareError;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CapabilitiesResponse<'a> {
    user_id: &'a str,
    capabilities: CapabilitySet,
    visibility: Visibility,
}

#[derive(Deserialize)]
struct SelectRoleRequest {
    role: String,
}

#[derive(Serialize)]
struct SelectRoleResponse {
    user: UserProfile,
}

/// GET /api/capabilities
pub async fn handle_capabilities(
    state: &AppState,
    viewer: &Viewer,
) -> Result<FullResponse, CareShareError> {
    let capabilities = state.resolver.resolve_capabilities(&viewer.id).await;
    Ok(json_response(
        StatusCode::OK,
        &CapabilitiesResponse {
            user_id: &viewer.id,
            capabilities,
            visibility: capabilities.visibility(),
        },
    ))
}

/// POST /api/roles
pub async fn handle_select_role(
    req: Request<Incoming>,
    state: &AppState,
    viewer: &Viewer,
) -> Result<FullResponse, CareShareError> {
    let body: SelectRoleRequest = parse_json_body(req).await?;
    let role: UserRole = body.role.parse()?;
    let user = state.roles.select_role(viewer, role).await?;
    Ok(json_response(StatusCode::OK, &SelectRoleResponse { user }))
}

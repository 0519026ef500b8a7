//! Health record routes

use hyper::body::Incoming;
use hyper::{Request, StatusCode};
use serde::Serialize;

use super::{json_response, parse_json_body, FullResponse};
use crate::auth::Viewer;
use crate::records::{HealthRecord, NewHealthRecord};
use crate::server::AppState;
use crate::types::CareShareError;

#[derive(Serialize)]
struct RecordsResponse {
    records: Vec<HealthRecord>,
}

#[derive(Serialize)]
struct RecordResponse {
    record: HealthRecord,
}

/// GET /api/records
pub async fn handle_own_records(
    state: &AppState,
    viewer: &Viewer,
) -> Result<FullResponse, CareShareError> {
    let records = state.records.own_records(viewer).await?;
    Ok(json_response(StatusCode::OK, &RecordsResponse { records }))
}

/// POST /api/records
pub async fn handle_track_record(
    req: Request<Incoming>,
    state: &AppState,
    viewer: &Viewer,
) -> Result<FullResponse, CareShareError> {
    let input: NewHealthRecord = parse_json_body(req).await?;
    let record = state.records.track_record(viewer, input).await?;
    Ok(json_response(StatusCode::CREATED, &RecordResponse { record }))
}

/// GET /api/records/shared
pub async fn handle_shared_records(
    state: &AppState,
    viewer: &Viewer,
) -> Result<FullResponse, CareShareError> {
    let view = state.records.viewable_records(viewer).await?;
    Ok(json_response(StatusCode::OK, &view))
}

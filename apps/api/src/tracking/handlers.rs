use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::errors::{require_field, AppError};
use crate::extract::{Json, Query};
use crate::models::parse_object_id;
use crate::models::tracking::{ProposalTracking, TrackingStats, TrackingView};
use crate::pagination::{Page, PageParams};
use crate::state::AppState;
use crate::tracking::store;

#[derive(Debug, Deserialize)]
pub struct SaveTrackingRequest {
    pub proposal_id: Option<String>,
    pub user_id: Option<String>,
    pub proposal_link: Option<String>,
    /// Free text; clients also send a bare number of connects.
    pub connected: Option<Value>,
    pub posted_ago: Option<String>,
    #[serde(default)]
    pub is_viewed: bool,
    #[serde(default)]
    pub is_hired: bool,
}

fn value_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

impl SaveTrackingRequest {
    fn into_record(self) -> Result<ProposalTracking, AppError> {
        let proposal_id = require_field(self.proposal_id, "proposal_id")?;
        let user_id = require_field(self.user_id, "user_id")?;
        let now = Utc::now();
        Ok(ProposalTracking {
            id: None,
            proposal_id,
            user_id,
            proposal_link: self.proposal_link,
            connected: value_text(self.connected),
            posted_ago: self.posted_ago,
            is_viewed: self.is_viewed,
            is_hired: self.is_hired,
            created_at: now,
            updated_at: now,
        })
    }
}

/// POST /proposals/api/tracking
pub async fn handle_save_tracking(
    State(state): State<AppState>,
    Json(req): Json<SaveTrackingRequest>,
) -> Result<(StatusCode, Json<TrackingView>), AppError> {
    let mut tracking = req.into_record()?;
    let id = store::save(&state.db, &tracking).await?;
    tracking.id = Some(id);
    Ok((StatusCode::CREATED, Json(TrackingView::from(tracking))))
}

/// GET /proposals/api/tracking/user/:user_id
pub async fn handle_list_tracking(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<TrackingView>>, AppError> {
    let (page, page_size) = params.resolve()?;
    let (records, pagination) = store::list_for_user(&state.db, &user_id, page, page_size).await?;
    Ok(Json(Page::new(records, pagination).map(TrackingView::from)))
}

async fn load_tracking(state: &AppState, tracking_id: &str) -> Result<ProposalTracking, AppError> {
    let id = parse_object_id(tracking_id, "Tracking record")?;
    store::get(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Tracking record not found".to_string()))
}

/// GET /proposals/api/tracking/detail/:tracking_id
pub async fn handle_get_tracking(
    State(state): State<AppState>,
    Path(tracking_id): Path<String>,
) -> Result<Json<TrackingView>, AppError> {
    let tracking = load_tracking(&state, &tracking_id).await?;
    Ok(Json(TrackingView::from(tracking)))
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTrackingRequest {
    pub is_viewed: Option<bool>,
    pub is_hired: Option<bool>,
}

/// PATCH /proposals/api/tracking/detail/:tracking_id
pub async fn handle_update_tracking(
    State(state): State<AppState>,
    Path(tracking_id): Path<String>,
    Json(req): Json<UpdateTrackingRequest>,
) -> Result<Json<TrackingView>, AppError> {
    let id = parse_object_id(&tracking_id, "Tracking record")?;
    if req.is_viewed.is_none() && req.is_hired.is_none() {
        return Err(AppError::Validation(
            "is_viewed or is_hired is required".to_string(),
        ));
    }
    if !store::update_status(&state.db, id, req.is_viewed, req.is_hired).await? {
        return Err(AppError::NotFound("Tracking record not found".to_string()));
    }
    info!(
        "Updated tracking {} (viewed: {:?}, hired: {:?})",
        id, req.is_viewed, req.is_hired
    );
    let tracking = load_tracking(&state, &tracking_id).await?;
    Ok(Json(TrackingView::from(tracking)))
}

/// DELETE /proposals/api/tracking/detail/:tracking_id
pub async fn handle_delete_tracking(
    State(state): State<AppState>,
    Path(tracking_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = parse_object_id(&tracking_id, "Tracking record")?;
    if !store::delete(&state.db, id).await? {
        return Err(AppError::NotFound("Tracking record not found".to_string()));
    }
    Ok(Json(json!({
        "success": true,
        "message": "Tracking record deleted successfully"
    })))
}

/// GET /proposals/api/tracking/proposal/:proposal_id
pub async fn handle_tracking_for_proposal(
    State(state): State<AppState>,
    Path(proposal_id): Path<String>,
) -> Result<Json<TrackingView>, AppError> {
    let tracking = store::get_by_proposal(&state.db, &proposal_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No tracking found for this proposal".to_string()))?;
    Ok(Json(TrackingView::from(tracking)))
}

/// GET /proposals/api/tracking/stats/:user_id
pub async fn handle_tracking_stats(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<TrackingStats>, AppError> {
    Ok(Json(store::stats(&state.db, &user_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(body: Value) -> SaveTrackingRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_save_request_requires_proposal_and_user() {
        let err = request(json!({ "user_id": "u1" })).into_record().unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg == "proposal_id is required"));

        let err = request(json!({ "proposal_id": "p1", "user_id": "  " }))
            .into_record()
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg == "user_id is required"));
    }

    #[test]
    fn test_save_request_defaults_flags_and_accepts_numeric_connects() {
        let record = request(json!({
            "proposal_id": "p1",
            "user_id": "u1",
            "proposal_link": "https://www.upwork.com/jobs/~01",
            "connected": 16,
            "posted_ago": "2 hours ago"
        }))
        .into_record()
        .unwrap();

        assert_eq!(record.connected.as_deref(), Some("16"));
        assert!(!record.is_viewed);
        assert!(!record.is_hired);
        assert_eq!(record.created_at, record.updated_at);
        assert!(record.id.is_none());
    }

    #[test]
    fn test_connected_text_is_kept_verbatim() {
        assert_eq!(value_text(Some(json!("yes"))).as_deref(), Some("yes"));
        assert_eq!(value_text(Some(Value::Null)), None);
        assert_eq!(value_text(None), None);
    }
}

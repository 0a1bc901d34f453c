use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::state::AppState;

/// GET /health
/// Pings MongoDB; a failed ping surfaces as a 500.
pub async fn health_handler(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    state.db.health_check().await?;
    Ok(Json(json!({
        "status": "ok",
        "database": "connected",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "scope-api"
    })))
}

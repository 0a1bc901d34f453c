pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use tower::Layer;
use tower_http::{
    cors::CorsLayer,
    normalize_path::{NormalizePath, NormalizePathLayer},
    trace::TraceLayer,
};

use crate::dashboard;
use crate::documents::handlers as documents;
use crate::portfolio::handlers as portfolio;
use crate::proposals::handlers as proposals;
use crate::state::AppState;
use crate::tracking::handlers as tracking;

/// The served application: the router with tracing and CORS, wrapped so
/// trailing slashes are trimmed before routing (`/generate/` matches
/// `/generate`).
pub fn build_app(state: AppState) -> NormalizePath<Router> {
    let router = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());
    NormalizePathLayer::trim_trailing_slash().layer(router)
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .nest("/documents/api", document_routes())
        .nest("/proposals/api", proposal_routes())
        .with_state(state)
}

fn document_routes() -> Router<AppState> {
    Router::new()
        .route("/documents/create", post(documents::handle_bulk_create))
        .route(
            "/documents/upload",
            post(documents::handle_upload)
                .layer(DefaultBodyLimit::max(documents::MAX_UPLOAD_BYTES)),
        )
        .route("/documents/search", post(documents::handle_search))
        .route(
            "/documents/user/:user_id",
            get(documents::handle_list_documents),
        )
}

fn proposal_routes() -> Router<AppState> {
    Router::new()
        .route("/generate", post(proposals::handle_generate))
        .route("/generate/custom", post(proposals::handle_generate_custom))
        .route("/user/:user_id", get(proposals::handle_list_proposals))
        .route(
            "/detail/:proposal_id",
            get(proposals::handle_get_proposal).patch(proposals::handle_update_proposal),
        )
        .route("/search", post(proposals::handle_search_proposals))
        .route("/stats/:user_id", get(proposals::handle_proposal_stats))
        .route(
            "/delete/:proposal_id",
            delete(proposals::handle_delete_proposal),
        )
        // Portfolio
        .route("/portfolio/create", post(portfolio::handle_create_project))
        .route(
            "/portfolio/user/:user_id",
            get(portfolio::handle_list_projects),
        )
        .route(
            "/portfolio/detail/:project_id",
            get(portfolio::handle_get_project)
                .put(portfolio::handle_update_project)
                .delete(portfolio::handle_delete_project),
        )
        .route("/portfolio/similar", post(portfolio::handle_similar_projects))
        // Tracking
        .route("/tracking", post(tracking::handle_save_tracking))
        .route("/tracking/user/:user_id", get(tracking::handle_list_tracking))
        .route(
            "/tracking/detail/:tracking_id",
            get(tracking::handle_get_tracking)
                .patch(tracking::handle_update_tracking)
                .delete(tracking::handle_delete_tracking),
        )
        .route(
            "/tracking/proposal/:proposal_id",
            get(tracking::handle_tracking_for_proposal),
        )
        .route("/tracking/stats/:user_id", get(tracking::handle_tracking_stats))
        .route(
            "/dashboard/stats/:user_id",
            get(dashboard::handle_dashboard_stats),
        )
}

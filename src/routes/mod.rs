//! Route definitions for the zapscan API.

pub mod health;
pub mod scans;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Build the full router over `state`.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let scan_routes = Router::new()
        .route("/scans", post(scans::create))
        .route("/attack-classes", get(scans::attack_classes));

    Router::new()
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .nest("/api/v1", scan_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

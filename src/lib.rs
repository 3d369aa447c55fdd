pub mod config;
pub mod errors;
pub mod models;
pub mod routes;
pub mod scanner;
pub mod services;

use std::sync::Arc;

use services::orchestrator::ScanOrchestrator;

/// Shared application state passed to all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ScanOrchestrator>,
}

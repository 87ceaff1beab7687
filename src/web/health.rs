use super::AppState;
use crate::models::HealthResponse;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;

pub fn add_route(app: Router<Arc<AppState>>) -> Router<Arc<AppState>> {
    app.route("/health", get(health_check))
}

/// Liveness plus credential presence. Never contacts the provider.
async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Image relay backend is running".to_string(),
        provider_configured: state.generator.is_configured(),
    })
}

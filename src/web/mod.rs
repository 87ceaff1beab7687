//! HTTP surface of the relay
//!
//! Routes requests into the codec, generation and storage components and
//! shapes their results into the JSON contract the frontend expects.

mod health;
mod process;

use crate::ai::GenerationService;
use crate::models::{Config, ErrorResponse};
use crate::storage::{ArtifactStore, STATIC_URL_PREFIX};
use crate::{Error, Result};
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Per-process collaborators shared by every request. Holds no per-request state.
pub struct AppState {
    pub generator: Arc<dyn GenerationService>,
    pub store: Arc<dyn ArtifactStore>,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = if self.is_client_error() {
            tracing::warn!("Rejected request: {}", self);
            let status = match &self {
                Error::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
                _ => StatusCode::BAD_REQUEST,
            };
            (status, self.to_string())
        } else {
            tracing::error!("Error processing image: {:?}", self);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error processing image: {}", self),
            )
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

pub fn router(state: AppState, config: &Config) -> Result<Router> {
    let app = add_routes(Router::new(), &[health::add_route, process::add_route])
        .with_state(Arc::new(state))
        .nest_service(STATIC_URL_PREFIX, ServeDir::new(&config.static_dir))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(cors_layer(&config.cors_origin)?)
        .layer(TraceLayer::new_for_http());
    Ok(app)
}

fn add_routes<T>(app: Router<T>, funcs: &[fn(Router<T>) -> Router<T>]) -> Router<T> {
    let mut app = app;
    for func in funcs {
        app = func(app);
    }
    app
}

/// `*` allows any origin; otherwise a comma-separated list of exact origins.
fn cors_layer(origins: &str) -> Result<CorsLayer> {
    let allow_origin = if origins.trim() == "*" {
        AllowOrigin::any()
    } else {
        let values = origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(|o| {
                HeaderValue::from_str(o)
                    .map_err(|_| Error::Config(format!("CORS_ORIGIN has invalid origin '{}'", o)))
            })
            .collect::<Result<Vec<_>>>()?;
        AllowOrigin::list(values)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any))
}

pub async fn run(config: &Config, state: AppState) -> Result<()> {
    let app = router(state, config)?;

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    tracing::info!(
        "Listening on {} (static files from {})",
        listener.local_addr()?,
        config.static_dir.display()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_layer_accepts_origin_list() {
        assert!(cors_layer("http://localhost:3000").is_ok());
        assert!(cors_layer("http://localhost:3000, https://app.example.com").is_ok());
        assert!(cors_layer("*").is_ok());
    }

    #[test]
    fn test_cors_layer_rejects_invalid_origin() {
        let err = cors_layer("http://bad\norigin").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_client_errors_map_to_bad_request() {
        let response = Error::InvalidImage("truncated".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = Error::ClientInput("missing".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_oversized_body_maps_to_payload_too_large() {
        let response = Error::PayloadTooLarge("limit".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_server_errors_map_to_internal_error() {
        for err in [
            Error::ProviderConfig("no key".to_string()),
            Error::ProviderRequest("timeout".to_string()),
            Error::Storage("disk full".to_string()),
        ] {
            assert_eq!(
                err.into_response().status(),
                StatusCode::INTERNAL_SERVER_ERROR
            );
        }
    }
}

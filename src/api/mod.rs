//! REST API server module
//!
//! Exposes package checks, views and report exports over HTTP for clients
//! that do not link the library directly.

use crate::{Config, PackageChecker, Result};
use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Checks
/// - `POST /check` - Check a package list
/// - `POST /check/cancel` - Abandon a check in flight, by session or batch id
/// - `POST /manifest` - Extract identifiers from a package manifest
///
/// ## Views and Exports
/// - `POST /view` - Filter, sort and page supplied records
/// - `POST /export/csv` - CSV report attachment
/// - `POST /export/document` - Formatted report attachment
///
/// ## System
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive documentation (if enabled)
pub fn create_router(checker: PackageChecker, config: Arc<Config>) -> Router {
    let state = AppState::new(checker, config.clone());

    let router = Router::new()
        // Checks
        .route("/check", post(routes::check_packages))
        .route("/check/cancel", post(routes::cancel_check))
        .route("/manifest", post(routes::parse_manifest))
        // Views and exports
        .route("/view", post(routes::view_packages))
        .route("/export/csv", post(routes::export_csv))
        .route("/export/document", post(routes::export_document))
        // System
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec));

    let router = if config.api.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    let router = router.with_state(state).layer(TraceLayer::new_for_http());

    if config.api.cors_enabled {
        router.layer(build_cors_layer(&config.api.cors_origins))
    } else {
        router
    }
}

/// Build a CORS layer for the configured origins ("*" or an empty list allows any)
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address
///
/// Runs until the listener fails or the task is dropped.
///
/// # Example
///
/// ```no_run
/// use pkgcheck::{Config, PackageChecker};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::default());
/// let checker = PackageChecker::new((*config).clone())?;
///
/// pkgcheck::api::start_api_server(checker, config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(checker: PackageChecker, config: Arc<Config>) -> Result<()> {
    let bind_address = config.api.bind_address;

    tracing::info!(address = %bind_address, "Starting API server");

    let app = create_router(checker, config);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(address = %bind_address, "API server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

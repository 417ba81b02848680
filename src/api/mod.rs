//! API module
//!
//! HTTP API endpoints, middleware and router assembly.

pub mod middleware;
pub mod routes;

pub use routes::create_router;

use axum::extract::FromRef;
use axum::Router;
use sqlx::PgPool;
use tower_http::trace::TraceLayer;

use crate::jobs::RateRefresher;

/// Shared state handed to every route
#[derive(Clone, FromRef)]
pub struct AppState {
    pub pool: PgPool,
    /// Present only when a rate source is configured
    pub rate_refresher: Option<RateRefresher>,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            rate_refresher: None,
        }
    }

    pub fn with_rate_refresher(mut self, refresher: RateRefresher) -> Self {
        self.rate_refresher = Some(refresher);
        self
    }
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    // Axum layers run last-added first: identity -> logging -> role check -> handler
    let api_routes = create_router()
        .layer(axum::middleware::from_fn(middleware::logging_middleware))
        .layer(axum::middleware::from_fn(middleware::identity_middleware));

    Router::new()
        // Health check (no identity)
        .route("/health", axum::routing::get(health_check))
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

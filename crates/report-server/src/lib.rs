//! HTTP surface for the report backend
//!
//! A thin axum application over the report pipeline and the agent
//! endpoints, with bearer-JWT auth, a document-store collaborator for
//! agent configs and run records, and object-store uploads for oversized
//! run outputs.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod storage;
pub mod store;

pub use config::ServerConfig;
pub use error::ApiError;
pub use state::AppState;

use axum::Router;
use axum::routing::get;
use serde_json::json;
use tower_http::trace::TraceLayer;

/// Build the application router
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/stock", routes::stock::router())
        .nest("/agents", routes::agents::router())
        .nest("/firestore", routes::registry::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(json!({"status": "UP"}))
}

//! HTTP surface of the storepress publishing service.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use storepress_store::StorePublisher;

pub mod handlers;

pub use handlers::{BuildResponse, ErrorBody, HealthResponse};

/// Build the API router around a configured publisher.
pub fn build_router(publisher: Arc<StorePublisher>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/v1/pages/publish", post(handlers::publish_store_from_page))
        .with_state(publisher)
}

//! Request handlers for the publishing API.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

use storepress_store::{StoreError, StorePublisher, UploadFile};

/// Inbound page-edit payload.
#[derive(Debug, Deserialize)]
pub struct PublishPageRequest {
    #[serde(default)]
    pub blocks: Value,
    #[serde(default)]
    pub meta: PageMeta,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub page: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BuildResponse {
    #[serde(rename = "buildId")]
    pub build_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub service: String,
    pub version: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn publish_store_from_page(
    State(publisher): State<Arc<StorePublisher>>,
    Json(request): Json<PublishPageRequest>,
) -> Response {
    let upload = UploadFile {
        // A missing block tree serializes to nothing and fails validation
        // downstream, together with the other required fields.
        file: if request.blocks.is_null() {
            String::new()
        } else {
            request.blocks.to_string()
        },
        page: request.meta.page,
        slug: request.meta.slug,
        title: request.meta.title,
    };

    match publisher.publish_from_page(upload).await {
        Ok(app_id) => (
            StatusCode::OK,
            Json(BuildResponse {
                build_id: app_id.to_string(),
            }),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

/// Shape a publishing failure into the API error body. Only upload
/// validation gets a dedicated code; everything else is unexpected.
fn error_response(err: StoreError) -> Response {
    match err {
        StoreError::BuildFailed(message) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                message,
                code: "BUILD_FAILED".to_string(),
            }),
        )
            .into_response(),
        err => {
            error!("Publishing failed unexpectedly: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    message: err.to_string(),
                    code: "UNEXPECTED_ERROR".to_string(),
                }),
            )
                .into_response()
        }
    }
}

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::repository::{RecoveryRepository, ReplanId, RepositoryError};
use super::service::{ReplanPayload, ReplanService, ReplanServiceError};

/// Router builder exposing the replan endpoints.
pub fn replan_router<R>(service: Arc<ReplanService<R>>) -> Router
where
    R: RecoveryRepository + 'static,
{
    Router::new()
        .route("/api/v1/replan", post(replan_handler::<R>))
        .route("/api/v1/replan/:replan_id", get(record_handler::<R>))
        .with_state(service)
}

pub(crate) async fn replan_handler<R>(
    State(service): State<Arc<ReplanService<R>>>,
    axum::Json(payload): axum::Json<ReplanPayload>,
) -> Response
where
    R: RecoveryRepository + 'static,
{
    match service.replan(payload).await {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(ReplanServiceError::Extraction(error)) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        Err(error @ ReplanServiceError::TimedOut { .. }) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::GATEWAY_TIMEOUT, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn record_handler<R>(
    State(service): State<Arc<ReplanService<R>>>,
    Path(replan_id): Path<String>,
) -> Response
where
    R: RecoveryRepository + 'static,
{
    let id = ReplanId(replan_id);
    match service.get(&id) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(ReplanServiceError::Repository(RepositoryError::NotFound)) => {
            let payload = json!({
                "replan_id": id.0,
                "error": "replan not found",
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

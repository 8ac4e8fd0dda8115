use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tracing::{error, info};

use crate::db::{Event, Fight};
use crate::error::Error;
use crate::state::AppState;
use crate::sync::SyncResponse;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/sync", get(sync_handler))
        .route("/events", get(events_handler))
        .route("/events/:id/fights", get(fights_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

async fn sync_handler(State(state): State<AppState>) -> Response {
    match state.orchestrator.run_pass().await {
        Ok(report) => (StatusCode::OK, Json(SyncResponse::completed(report))).into_response(),
        Err(e) => {
            error!("Sync failed: {}", e);
            (failure_status(&e), Json(SyncResponse::failed(e.to_string()))).into_response()
        }
    }
}

async fn events_handler(State(state): State<AppState>) -> Result<Json<Vec<Event>>, ApiError> {
    Ok(Json(state.store.list_events().await?))
}

async fn fights_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Fight>>, ApiError> {
    if state.store.find_event(id).await?.is_none() {
        return Err(Error::EventNotFound(id).into());
    }

    Ok(Json(state.store.fights_for_event(id).await?))
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

fn failure_status(e: &Error) -> StatusCode {
    match e {
        _ if e.is_feed_failure() => StatusCode::BAD_GATEWAY,
        Error::EventNotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = failure_status(&self.0);
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        } else {
            info!("Request rejected: {}", self.0);
        }

        (status, Json(json!({ "success": false, "error": self.0.to_string() }))).into_response()
    }
}

//! Request handlers and the error → response mapping.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use disclosure_common::{ErrorPayload, LookupError};
use disclosure_extract::CandidateRecord;
use disclosure_web::LookupService;
use serde::{Deserialize, Serialize};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<LookupService>,
}

#[derive(Debug, Deserialize)]
pub struct LeaderQuery {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// Names the resolver can answer for, when it knows.
    pub candidates: Option<usize>,
}

/// A lookup failure on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub LookupError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            LookupError::Client(_) => StatusCode::BAD_REQUEST,
            LookupError::NotFound(_) => StatusCode::NOT_FOUND,
            LookupError::Fetch(_) | LookupError::Parse(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<LookupError> for ApiError {
    fn from(e: LookupError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(%status, kind = self.0.kind(), error = %self.0, "api.request_failed");
        } else {
            tracing::debug!(%status, kind = self.0.kind(), error = %self.0, "api.request_rejected");
        }
        (status, Json(ErrorPayload::from(&self.0))).into_response()
    }
}

/// GET /api/leader-details?name=<query>
async fn leader_details(
    State(state): State<AppState>,
    params: Result<Query<LeaderQuery>, QueryRejection>,
) -> Result<Json<CandidateRecord>, ApiError> {
    let Query(params) = params.map_err(|rejection| {
        LookupError::Client(format!("invalid query string: {}", rejection.body_text()))
    })?;
    // A missing parameter and an empty one are the same client error.
    let raw = params.name.unwrap_or_default();
    let record = state.service.lookup(&raw).await?;
    Ok(Json(record))
}

/// GET /health
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        candidates: state.service.resolver().known_candidates(),
    })
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/leader-details", get(leader_details))
        .route("/health", get(health))
        .with_state(state)
}

//! REST API endpoints.
//!
//! Axum-based HTTP API over the league read model: week leaderboards,
//! season standings and jerseys, plus qualifying selection.

pub mod routes;
pub mod state;

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::ingest::IngestError;
use crate::league::LeagueError;
use state::AppState;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<LeagueError> for ApiError {
    fn from(e: LeagueError) -> Self {
        match e {
            LeagueError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            other => {
                error!("League computation failed: {}", other);
                ApiError::Internal(other.to_string())
            }
        }
    }
}

impl From<IngestError> for ApiError {
    fn from(e: IngestError) -> Self {
        match e {
            IngestError::WeekNotFound(_) => ApiError::NotFound(e.to_string()),
            IngestError::Credential(_) | IngestError::Model(_) => {
                ApiError::BadRequest(e.to_string())
            }
            other => {
                error!("Selection failed: {}", other);
                ApiError::Internal(other.to_string())
            }
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Build the API router with request tracing.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(routes::health))
        .route(
            "/api/weeks/:week_id/leaderboard",
            get(routes::weeks::get_leaderboard),
        )
        .route(
            "/api/weeks/:week_id/participants/:participant_id/selection",
            post(routes::weeks::post_selection),
        )
        .route(
            "/api/seasons/:season_id/standings",
            get(routes::seasons::get_standings),
        )
        .route(
            "/api/seasons/:season_id/jerseys",
            get(routes::seasons::get_jerseys),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS policy for a configured origin; `*` allows any.
pub fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match origin {
        "*" => layer.allow_origin(Any),
        exact => match HeaderValue::from_str(exact) {
            Ok(value) => layer.allow_origin(value),
            Err(_) => {
                error!("Invalid CORS origin {:?}, allowing none", exact);
                layer
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ModelError;

    #[test]
    fn test_league_not_found_maps_to_404() {
        let err: ApiError = LeagueError::NotFound {
            kind: "Week",
            id: "w9".to_string(),
        }
        .into();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert_eq!(
            err.into_response().status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_ingest_errors_map_by_kind() {
        let err: ApiError = IngestError::WeekNotFound("w1".into()).into();
        assert!(matches!(err, ApiError::NotFound(_)));

        let err: ApiError = IngestError::Model(ModelError::MissingField("participant.name")).into();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}

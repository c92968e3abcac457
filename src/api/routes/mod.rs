pub mod seasons;
pub mod weeks;

use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shared helpers for route tests.

    use std::path::Path;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::util::ServiceExt;

    use crate::api::state::AppState;
    use crate::cache::StaticDirectory;
    use crate::league::fixtures::league;
    use crate::storage::{EntityType, JsonlWriter, StorageConfig};

    /// App state over a temp dir seeded with the standard league fixture.
    pub fn seeded_state(dir: &Path) -> AppState {
        let storage = StorageConfig::new(dir.to_path_buf());
        let snapshot = league();
        JsonlWriter::for_entity(&storage, EntityType::Participant)
            .write_all(&snapshot.participants)
            .unwrap();
        JsonlWriter::for_entity(&storage, EntityType::Segment)
            .write_all(&snapshot.segments)
            .unwrap();
        JsonlWriter::for_entity(&storage, EntityType::Season)
            .write_all(&snapshot.seasons)
            .unwrap();
        JsonlWriter::for_entity(&storage, EntityType::Week)
            .write_all(&snapshot.weeks)
            .unwrap();
        JsonlWriter::for_entity(&storage, EntityType::Submission)
            .write_all(&snapshot.submissions)
            .unwrap();

        AppState::new(
            storage,
            Arc::new(StaticDirectory::new(snapshot.participants)),
        )
    }

    async fn read_json(resp: axum::response::Response) -> (StatusCode, Value) {
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        read_json(resp).await
    }

    pub async fn post_json(app: axum::Router, uri: &str, body: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        read_json(resp).await
    }
}

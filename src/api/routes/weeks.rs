use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::calculate::{CandidateActivity, CandidateFailure};
use crate::ingest::{select_qualifying_performance, SelectionReport};
use crate::league::{week_leaderboard, LeagueSnapshot, WeekLeaderboard};

pub async fn get_leaderboard(
    State(state): State<AppState>,
    Path(week_id): Path<String>,
) -> Result<Json<WeekLeaderboard>, ApiError> {
    let snapshot =
        LeagueSnapshot::load(&state.storage).map_err(|e| ApiError::Internal(e.to_string()))?;
    let board = week_leaderboard(&snapshot, state.directory.as_ref(), &week_id.into())?;
    Ok(Json(board))
}

/// Candidate activities as posted by a client. Each one is decoded on its
/// own so a malformed entry only removes that candidate.
#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    pub candidates: Vec<Value>,
}

fn decode_candidate(index: usize, raw: Value) -> Result<CandidateActivity, CandidateFailure> {
    let activity_id = raw
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("candidate-{}", index));
    serde_json::from_value(raw).map_err(|e| CandidateFailure {
        activity_id: activity_id.into(),
        reason: format!("malformed activity: {}", e),
    })
}

pub async fn post_selection(
    State(state): State<AppState>,
    Path((week_id, participant_id)): Path<(String, String)>,
    Json(request): Json<SelectionRequest>,
) -> Result<Json<SelectionReport>, ApiError> {
    if participant_id.trim().is_empty() {
        return Err(ApiError::BadRequest("participant id is empty".to_string()));
    }
    info!(
        "Selection for participant {} week {}: {} candidates",
        participant_id,
        week_id,
        request.candidates.len()
    );

    let candidates = request
        .candidates
        .into_iter()
        .enumerate()
        .map(|(i, raw)| decode_candidate(i, raw))
        .collect();

    let _guard = state.write_lock.lock().await;
    let report = select_qualifying_performance(
        &state.storage,
        &participant_id.into(),
        &week_id.into(),
        candidates,
    )?;
    Ok(Json(report))
}

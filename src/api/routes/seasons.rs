use axum::extract::{Path, State};
use axum::Json;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::league::{
    season_jerseys, season_standings, LeagueSnapshot, SeasonJerseysView, SeasonStandingsView,
};

fn load(state: &AppState) -> Result<LeagueSnapshot, ApiError> {
    LeagueSnapshot::load(&state.storage).map_err(|e| ApiError::Internal(e.to_string()))
}

pub async fn get_standings(
    State(state): State<AppState>,
    Path(season_id): Path<String>,
) -> Result<Json<SeasonStandingsView>, ApiError> {
    let snapshot = load(&state)?;
    let view = season_standings(&snapshot, state.directory.as_ref(), &season_id.into())?;
    Ok(Json(view))
}

pub async fn get_jerseys(
    State(state): State<AppState>,
    Path(season_id): Path<String>,
) -> Result<Json<SeasonJerseysView>, ApiError> {
    let snapshot = load(&state)?;
    let view = season_jerseys(&snapshot, state.directory.as_ref(), &season_id.into())?;
    Ok(Json(view))
}

#[cfg(test)]
mod tests {
    use crate::api::build_router;
    use crate::api::routes::testing::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_standings() {
        let tmp = tempfile::TempDir::new().unwrap();
        let app = build_router(seeded_state(tmp.path()));

        let (status, json) = get_json(app, "/api/seasons/s1/standings").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["season_name"], "Spring");

        let rows = json["standings"].as_array().unwrap();
        let summary: Vec<(&str, u64)> = rows
            .iter()
            .map(|r| {
                (
                    r["participant_id"].as_str().unwrap(),
                    r["total_points"].as_u64().unwrap(),
                )
            })
            .collect();
        assert_eq!(summary, vec![("ada", 10), ("bo", 9), ("cy", 4)]);
        assert!(json["skipped_weeks"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_jerseys() {
        let tmp = tempfile::TempDir::new().unwrap();
        let app = build_router(seeded_state(tmp.path()));

        let (status, json) = get_json(app, "/api/seasons/s1/jerseys").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["jerseys"]["climb"]["champion"], "ada");
        assert_eq!(json["flat_champion_name"], "Bo");
    }

    #[tokio::test]
    async fn test_unknown_season() {
        let tmp = tempfile::TempDir::new().unwrap();
        let app = build_router(seeded_state(tmp.path()));

        let (status, json) = get_json(app, "/api/seasons/s9/standings").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }
}

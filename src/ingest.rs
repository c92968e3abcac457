//! Qualifying-performance ingestion.
//!
//! Fetches a participant's candidate activities through injected
//! collaborators, selects the qualifying one for a week and atomically
//! replaces the participant's stored submission.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::calculate::{
    select_qualifying, CandidateActivity, CandidateFailure, SelectionCriteria, SelectionError,
    SelectionOutcome,
};
use crate::models::{ActivityId, ModelError, ParticipantId, Week, WeekId};
use crate::storage::{read_weeks, replace_submission, StorageConfig, StorageError};

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Activity not found: {0}")]
    NotFound(ActivityId),

    #[error("Access token rejected")]
    Unauthorized,

    #[error("Upstream error: {0}")]
    Upstream(String),
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Participant {0} has not connected a telemetry account")]
    NotConnected(ParticipantId),

    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Week not found: {0}")]
    WeekNotFound(WeekId),

    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),

    #[error("Invalid submission: {0}")]
    Model(#[from] ModelError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Source of raw activity data.
#[async_trait]
pub trait TelemetryProvider: Send + Sync {
    async fn fetch_activity(
        &self,
        access_token: &str,
        activity_id: &ActivityId,
    ) -> Result<CandidateActivity, TelemetryError>;
}

/// Source of per-participant access tokens.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn access_token(&self, participant_id: &ParticipantId)
        -> Result<String, CredentialError>;
}

/// What a selection request did.
#[derive(Debug, Clone, Serialize)]
pub struct SelectionReport {
    pub participant_id: ParticipantId,
    pub week_id: WeekId,

    #[serde(flatten)]
    pub outcome: SelectionOutcome,

    /// Whether an earlier submission for the week was replaced
    pub replaced_previous: bool,
}

fn find_week(storage: &StorageConfig, week_id: &WeekId) -> Result<Week, IngestError> {
    read_weeks(storage)?
        .into_iter()
        .find(|w| &w.id == week_id)
        .ok_or_else(|| IngestError::WeekNotFound(week_id.clone()))
}

/// Select from already-fetched candidates and store the result.
///
/// A qualified outcome replaces the participant's submission for the week in
/// one file replacement. When nothing qualifies, stored data is untouched.
pub fn select_qualifying_performance(
    storage: &StorageConfig,
    participant_id: &ParticipantId,
    week_id: &WeekId,
    candidates: Vec<Result<CandidateActivity, CandidateFailure>>,
) -> Result<SelectionReport, IngestError> {
    let week = find_week(storage, week_id)?;
    let outcome = select_qualifying(candidates, &SelectionCriteria::for_week(&week))?;

    let replaced_previous = match outcome.chosen() {
        Some(chosen) => {
            let submission = chosen.clone().into_submission(participant_id.clone(), &week)?;
            replace_submission(storage, submission)?.is_some()
        }
        None => {
            info!(
                "No qualifying activity for participant {} in week {}",
                participant_id, week_id
            );
            false
        }
    };

    Ok(SelectionReport {
        participant_id: participant_id.clone(),
        week_id: week_id.clone(),
        outcome,
        replaced_previous,
    })
}

/// Drives selection through telemetry and credential collaborators.
pub struct Ingestor {
    storage: StorageConfig,
    telemetry: Arc<dyn TelemetryProvider>,
    credentials: Arc<dyn CredentialStore>,
    write_lock: Arc<Mutex<()>>,
}

impl Ingestor {
    pub fn new(
        storage: StorageConfig,
        telemetry: Arc<dyn TelemetryProvider>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            storage,
            telemetry,
            credentials,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Share a writer lock with other components touching the same store.
    pub fn with_write_lock(mut self, lock: Arc<Mutex<()>>) -> Self {
        self.write_lock = lock;
        self
    }

    /// Fetch every candidate, pick the qualifying one and store it.
    ///
    /// A missing credential fails the whole request. A failed fetch only
    /// removes that candidate.
    pub async fn select_qualifying_performance(
        &self,
        participant_id: &ParticipantId,
        week_id: &WeekId,
        candidate_ids: &[ActivityId],
    ) -> Result<SelectionReport, IngestError> {
        let token = self.credentials.access_token(participant_id).await?;

        let mut candidates = Vec::with_capacity(candidate_ids.len());
        for activity_id in candidate_ids {
            let fetched = self
                .telemetry
                .fetch_activity(&token, activity_id)
                .await
                .map_err(|e| {
                    warn!("Failed to fetch activity {}: {}", activity_id, e);
                    CandidateFailure {
                        activity_id: activity_id.clone(),
                        reason: e.to_string(),
                    }
                });
            candidates.push(fetched);
        }

        let _guard = self.write_lock.lock().await;
        select_qualifying_performance(&self.storage, participant_id, week_id, candidates)
    }
}

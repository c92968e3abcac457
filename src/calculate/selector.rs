//! Qualifying-activity selection.
//!
//! Given every candidate activity a participant recorded around a week, pick
//! the one whose fastest contiguous run of required laps is quickest. Each
//! candidate is judged independently: a failed fetch or a bad timestamp
//! only removes that candidate.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::best_window::{select_best_window, BestWindowError};
use super::window::parse_timestamp;
use crate::models::{
    ActivityId, Effort, ModelError, ParticipantId, PerformanceRecord, SegmentId, Submission,
    TimeWindow, Week, WeekResult,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Required lap count must be at least 1")]
    InvalidRequiredLaps,
}

/// A raw activity as delivered by the telemetry provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateActivity {
    pub id: ActivityId,

    /// Start timestamp as reported upstream (RFC 3339)
    pub start_date: String,

    /// All segment efforts in recording order
    #[serde(default)]
    pub efforts: Vec<Effort>,
}

/// A candidate that could not be processed at all.
#[derive(Debug, Clone, Error)]
#[error("activity {activity_id}: {reason}")]
pub struct CandidateFailure {
    pub activity_id: ActivityId,
    pub reason: String,
}

/// What a week requires of a qualifying activity.
#[derive(Debug, Clone)]
pub struct SelectionCriteria {
    pub segment_id: SegmentId,
    pub required_laps: u32,
    pub window: TimeWindow,
}

impl SelectionCriteria {
    pub fn for_week(week: &Week) -> Self {
        Self {
            segment_id: week.segment_id.clone(),
            required_laps: week.required_laps,
            window: week.window,
        }
    }
}

/// Why a candidate did not qualify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Rejection {
    OutsideWindow,
    NoMatchingEfforts,
    InsufficientLaps { found: usize, required: usize },
    InvalidTimestamp { value: String },
    Failed { message: String },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::OutsideWindow => write!(f, "outside week window"),
            Rejection::NoMatchingEfforts => write!(f, "no efforts on the week segment"),
            Rejection::InsufficientLaps { found, required } => {
                write!(f, "{} laps found, {} required", found, required)
            }
            Rejection::InvalidTimestamp { value } => write!(f, "unparseable start {:?}", value),
            Rejection::Failed { message } => write!(f, "failed: {}", message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedCandidate {
    pub activity_id: ActivityId,
    #[serde(flatten)]
    pub reason: Rejection,
}

/// The chosen activity and its accepted laps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualifyingActivity {
    pub activity_id: ActivityId,
    pub start_date: DateTime<Utc>,

    /// Selected efforts in recording order
    pub efforts: Vec<Effort>,

    /// Positions of the selected efforts in the activity's effort list
    pub effort_indices: Vec<usize>,

    pub total_seconds: u32,
}

impl QualifyingActivity {
    /// Build the storable record and result for this selection.
    pub fn into_submission(
        self,
        participant_id: ParticipantId,
        week: &Week,
    ) -> Result<Submission, ModelError> {
        let result = WeekResult {
            participant_id: participant_id.clone(),
            week_id: week.id.clone(),
            activity_id: self.activity_id.clone(),
            total_seconds: self.total_seconds,
        };
        let record = PerformanceRecord {
            id: self.activity_id,
            participant_id,
            week_id: week.id.clone(),
            start_date: self.start_date,
            efforts: self.efforts,
        };
        Submission::new(record, result)
    }
}

/// Result of evaluating all candidates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SelectionOutcome {
    Qualified {
        chosen: QualifyingActivity,
        rejected: Vec<RejectedCandidate>,
    },
    NoneQualified {
        rejected: Vec<RejectedCandidate>,
    },
}

impl SelectionOutcome {
    pub fn chosen(&self) -> Option<&QualifyingActivity> {
        match self {
            SelectionOutcome::Qualified { chosen, .. } => Some(chosen),
            SelectionOutcome::NoneQualified { .. } => None,
        }
    }

    pub fn rejected(&self) -> &[RejectedCandidate] {
        match self {
            SelectionOutcome::Qualified { rejected, .. } => rejected,
            SelectionOutcome::NoneQualified { rejected } => rejected,
        }
    }
}

/// Evaluate a single candidate against the week criteria.
fn evaluate(
    candidate: &CandidateActivity,
    criteria: &SelectionCriteria,
) -> Result<QualifyingActivity, Rejection> {
    let start = parse_timestamp(&candidate.start_date).map_err(|_| Rejection::InvalidTimestamp {
        value: candidate.start_date.clone(),
    })?;
    if !criteria.window.contains(start) {
        return Err(Rejection::OutsideWindow);
    }

    let matching: Vec<(usize, &Effort)> = candidate
        .efforts
        .iter()
        .enumerate()
        .filter(|(_, e)| e.segment_id == criteria.segment_id)
        .collect();
    if matching.is_empty() {
        return Err(Rejection::NoMatchingEfforts);
    }

    let durations: Vec<u32> = matching.iter().map(|(_, e)| e.elapsed_seconds).collect();
    let window = select_best_window(&durations, criteria.required_laps as usize).map_err(|e| {
        match e {
            BestWindowError::InsufficientData {
                available,
                required,
            } => Rejection::InsufficientLaps {
                found: available,
                required,
            },
            BestWindowError::InvalidCount => Rejection::Failed {
                message: "invalid lap count".to_string(),
            },
        }
    })?;

    let total_seconds = u32::try_from(window.total).map_err(|_| Rejection::Failed {
        message: format!("total time {} overflows", window.total),
    })?;

    let (effort_indices, efforts): (Vec<usize>, Vec<Effort>) = window
        .indices
        .iter()
        .map(|&i| (matching[i].0, matching[i].1.clone()))
        .unzip();

    Ok(QualifyingActivity {
        activity_id: candidate.id.clone(),
        start_date: start,
        efforts,
        effort_indices,
        total_seconds,
    })
}

/// Pick the fastest qualifying activity among `candidates`.
///
/// Equal totals keep the earlier candidate in input order. An empty or fully
/// rejected candidate list yields [`SelectionOutcome::NoneQualified`].
pub fn select_qualifying(
    candidates: Vec<Result<CandidateActivity, CandidateFailure>>,
    criteria: &SelectionCriteria,
) -> Result<SelectionOutcome, SelectionError> {
    if criteria.required_laps == 0 {
        return Err(SelectionError::InvalidRequiredLaps);
    }

    let mut best: Option<QualifyingActivity> = None;
    let mut rejected = Vec::new();

    for candidate in candidates {
        let candidate = match candidate {
            Ok(c) => c,
            Err(failure) => {
                warn!(
                    "Skipping candidate {}: {}",
                    failure.activity_id, failure.reason
                );
                rejected.push(RejectedCandidate {
                    activity_id: failure.activity_id,
                    reason: Rejection::Failed {
                        message: failure.reason,
                    },
                });
                continue;
            }
        };

        match evaluate(&candidate, criteria) {
            Ok(q) => {
                debug!(
                    "Candidate {} qualifies with {}s over laps {:?}",
                    q.activity_id, q.total_seconds, q.effort_indices
                );
                let faster = best
                    .as_ref()
                    .map_or(true, |b| q.total_seconds < b.total_seconds);
                if faster {
                    best = Some(q);
                }
            }
            Err(reason) => {
                if matches!(reason, Rejection::InvalidTimestamp { .. }) {
                    warn!("Skipping candidate {}: {}", candidate.id, reason);
                } else {
                    debug!("Candidate {} rejected: {}", candidate.id, reason);
                }
                rejected.push(RejectedCandidate {
                    activity_id: candidate.id,
                    reason,
                });
            }
        }
    }

    Ok(match best {
        Some(chosen) => SelectionOutcome::Qualified { chosen, rejected },
        None => {
            info!(
                "No qualifying activity among {} candidates for segment {}",
                rejected.len(),
                criteria.segment_id
            );
            SelectionOutcome::NoneQualified { rejected }
        }
    })
}

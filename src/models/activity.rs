//! Performance records, efforts and accepted weekly results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ActivityId, EffortId, ModelError, ParticipantId, SegmentId, WeekId};

/// One timed pass over a segment within an activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEffort")]
pub struct Effort {
    pub id: EffortId,
    pub segment_id: SegmentId,

    /// Elapsed time in seconds
    pub elapsed_seconds: u32,

    pub start_date: DateTime<Utc>,

    /// Fastest-ever time for the athlete on this segment
    pub is_pr: bool,

    pub average_watts: Option<f64>,
    pub average_heartrate: Option<f64>,
    pub average_cadence: Option<f64>,
}

#[derive(Deserialize)]
struct RawEffort {
    id: EffortId,
    segment_id: SegmentId,
    elapsed_seconds: u32,
    start_date: DateTime<Utc>,
    #[serde(default)]
    is_pr: bool,
    #[serde(default)]
    average_watts: Option<f64>,
    #[serde(default)]
    average_heartrate: Option<f64>,
    #[serde(default)]
    average_cadence: Option<f64>,
}

impl TryFrom<RawEffort> for Effort {
    type Error = ModelError;

    fn try_from(raw: RawEffort) -> Result<Self, Self::Error> {
        let mut effort = Effort::new(raw.id, raw.segment_id, raw.elapsed_seconds, raw.start_date)?;
        effort.is_pr = raw.is_pr;
        effort.average_watts = raw.average_watts;
        effort.average_heartrate = raw.average_heartrate;
        effort.average_cadence = raw.average_cadence;
        Ok(effort)
    }
}

impl Effort {
    pub fn new(
        id: EffortId,
        segment_id: SegmentId,
        elapsed_seconds: u32,
        start_date: DateTime<Utc>,
    ) -> Result<Self, ModelError> {
        if elapsed_seconds == 0 {
            return Err(ModelError::InvalidValue {
                field: "effort.elapsed_seconds",
                reason: "must be positive".to_string(),
            });
        }
        Ok(Self {
            id,
            segment_id,
            elapsed_seconds,
            start_date,
            is_pr: false,
            average_watts: None,
            average_heartrate: None,
            average_cadence: None,
        })
    }

    /// Builder method to flag a personal record.
    pub fn with_pr(mut self, is_pr: bool) -> Self {
        self.is_pr = is_pr;
        self
    }

    /// Builder method to attach power, heart rate and cadence averages.
    pub fn with_telemetry(
        mut self,
        watts: Option<f64>,
        heartrate: Option<f64>,
        cadence: Option<f64>,
    ) -> Self {
        self.average_watts = watts;
        self.average_heartrate = heartrate;
        self.average_cadence = cadence;
        self
    }
}

/// A participant's stored activity for one week, holding the selected efforts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub id: ActivityId,
    pub participant_id: ParticipantId,
    pub week_id: WeekId,
    pub start_date: DateTime<Utc>,

    /// Efforts in recording order
    pub efforts: Vec<Effort>,
}

impl PerformanceRecord {
    pub fn total_seconds(&self) -> u64 {
        self.efforts.iter().map(|e| u64::from(e.elapsed_seconds)).sum()
    }

    pub fn has_pr(&self) -> bool {
        self.efforts.iter().any(|e| e.is_pr)
    }
}

/// The accepted outcome of a participant for a week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekResult {
    pub participant_id: ParticipantId,
    pub week_id: WeekId,
    pub activity_id: ActivityId,

    /// Sum of the selected effort durations
    pub total_seconds: u32,
}

/// Storage unit: one record and its result per (participant, week).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSubmission")]
pub struct Submission {
    pub record: PerformanceRecord,
    pub result: WeekResult,
}

#[derive(Deserialize)]
struct RawSubmission {
    record: PerformanceRecord,
    result: WeekResult,
}

impl TryFrom<RawSubmission> for Submission {
    type Error = ModelError;

    fn try_from(raw: RawSubmission) -> Result<Self, Self::Error> {
        Submission::new(raw.record, raw.result)
    }
}

impl Submission {
    /// Pair a record with its result, rejecting mismatched keys.
    pub fn new(record: PerformanceRecord, result: WeekResult) -> Result<Self, ModelError> {
        if record.id != result.activity_id
            || record.participant_id != result.participant_id
            || record.week_id != result.week_id
        {
            return Err(ModelError::Mismatch(format!(
                "result ({}, {}, {}) does not belong to record ({}, {}, {})",
                result.participant_id,
                result.week_id,
                result.activity_id,
                record.participant_id,
                record.week_id,
                record.id
            )));
        }
        Ok(Self { record, result })
    }

    /// Storage key: at most one submission per (participant, week).
    pub fn key(&self) -> (&ParticipantId, &WeekId) {
        (&self.result.participant_id, &self.result.week_id)
    }
}

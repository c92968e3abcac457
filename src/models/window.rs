//! Half-open time windows shared by weeks and seasons.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ModelError;

/// A half-open interval `[start, end)` of absolute instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeWindow")]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawTimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<RawTimeWindow> for TimeWindow {
    type Error = ModelError;

    fn try_from(raw: RawTimeWindow) -> Result<Self, Self::Error> {
        TimeWindow::new(raw.start, raw.end)
    }
}

impl TimeWindow {
    /// Create a window, rejecting empty or inverted intervals.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ModelError> {
        if start >= end {
            return Err(ModelError::EmptyWindow {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }
        Ok(Self { start, end })
    }

    /// Check if an instant falls within this window. `end` is exclusive.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// Check if this window lies entirely within `outer`.
    pub fn is_inside(&self, outer: &TimeWindow) -> bool {
        outer.start <= self.start && self.end <= outer.end
    }
}

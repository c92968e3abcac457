//! Course segment model.

use serde::{Deserialize, Serialize};

use super::{ModelError, SegmentId};

/// A fixed course section efforts are timed against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSegment")]
pub struct Segment {
    pub id: SegmentId,
    pub name: String,

    /// Average grade in percent
    pub average_grade: f64,

    /// Length in meters
    pub distance_m: Option<f64>,
}

#[derive(Deserialize)]
struct RawSegment {
    id: SegmentId,
    name: String,
    average_grade: f64,
    #[serde(default)]
    distance_m: Option<f64>,
}

impl TryFrom<RawSegment> for Segment {
    type Error = ModelError;

    fn try_from(raw: RawSegment) -> Result<Self, Self::Error> {
        let segment = Segment::new(raw.id, raw.name, raw.average_grade)?;
        match raw.distance_m {
            Some(d) if !d.is_finite() || d <= 0.0 => Err(ModelError::InvalidValue {
                field: "segment.distance_m",
                reason: format!("must be a positive distance, got {}", d),
            }),
            Some(d) => Ok(segment.with_distance(d)),
            None => Ok(segment),
        }
    }
}

impl Segment {
    pub fn new(id: SegmentId, name: String, average_grade: f64) -> Result<Self, ModelError> {
        if id.is_empty() {
            return Err(ModelError::MissingField("segment.id"));
        }
        if !average_grade.is_finite() {
            return Err(ModelError::InvalidValue {
                field: "segment.average_grade",
                reason: "must be a finite percentage".to_string(),
            });
        }
        Ok(Self {
            id,
            name,
            average_grade,
            distance_m: None,
        })
    }

    /// Builder method to set the segment length.
    pub fn with_distance(mut self, distance_m: f64) -> Self {
        self.distance_m = Some(distance_m);
        self
    }
}

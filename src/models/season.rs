//! Seasons and weekly competition instances.

use serde::{Deserialize, Serialize};

use super::{EntityId, ModelError, SeasonId, SegmentId, TimeWindow, WeekId};

/// Default weekly scoring multiplier.
pub const DEFAULT_MULTIPLIER: u32 = 1;

/// Largest accepted weekly scoring multiplier.
pub const MAX_MULTIPLIER: u32 = 100;

/// A named competition period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSeason")]
pub struct Season {
    pub id: SeasonId,
    pub name: String,
    pub window: TimeWindow,

    /// Closed seasons are historical; jersey champions are only declared for them
    pub is_closed: bool,
}

#[derive(Deserialize)]
struct RawSeason {
    #[serde(default)]
    id: Option<SeasonId>,
    name: String,
    window: TimeWindow,
    #[serde(default)]
    is_closed: bool,
}

impl TryFrom<RawSeason> for Season {
    type Error = ModelError;

    fn try_from(raw: RawSeason) -> Result<Self, Self::Error> {
        let mut season = Season::new(raw.name, raw.window)?;
        if let Some(id) = raw.id {
            season = season.with_id(id)?;
        }
        season.is_closed = raw.is_closed;
        Ok(season)
    }
}

impl Season {
    /// Create a new open Season with an ID derived from name and start.
    pub fn new(name: String, window: TimeWindow) -> Result<Self, ModelError> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(ModelError::MissingField("season.name"));
        }
        let id = EntityId::generate(&["season", &name, &window.start.to_rfc3339()]);
        Ok(Self {
            id,
            name,
            window,
            is_closed: false,
        })
    }

    /// Builder method to use an externally assigned ID.
    pub fn with_id(mut self, id: SeasonId) -> Result<Self, ModelError> {
        if id.is_empty() {
            return Err(ModelError::MissingField("season.id"));
        }
        self.id = id;
        Ok(self)
    }

    /// Builder method to mark the season closed.
    pub fn closed(mut self) -> Self {
        self.is_closed = true;
        self
    }
}

/// One competition instance: a segment, a lap count and a time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawWeek")]
pub struct Week {
    pub id: WeekId,
    pub name: String,
    pub season_id: SeasonId,
    pub segment_id: SegmentId,

    /// Number of segment repetitions required (at least 1)
    pub required_laps: u32,

    pub window: TimeWindow,

    /// Integer weight applied to every point total of the week, 1 to [`MAX_MULTIPLIER`]
    pub multiplier: u32,
}

#[derive(Deserialize)]
struct RawWeek {
    #[serde(default)]
    id: Option<WeekId>,
    name: String,
    season_id: SeasonId,
    segment_id: SegmentId,
    required_laps: u32,
    window: TimeWindow,
    #[serde(default = "default_multiplier")]
    multiplier: u32,
}

fn default_multiplier() -> u32 {
    DEFAULT_MULTIPLIER
}

impl TryFrom<RawWeek> for Week {
    type Error = ModelError;

    fn try_from(raw: RawWeek) -> Result<Self, Self::Error> {
        let mut week = Week::new(
            raw.name,
            raw.season_id,
            raw.segment_id,
            raw.required_laps,
            raw.window,
        )?
        .with_multiplier(raw.multiplier)?;
        if let Some(id) = raw.id {
            if id.is_empty() {
                return Err(ModelError::MissingField("week.id"));
            }
            week.id = id;
        }
        Ok(week)
    }
}

impl Week {
    /// Create a new Week with an ID derived from name and start, multiplier 1.
    pub fn new(
        name: String,
        season_id: SeasonId,
        segment_id: SegmentId,
        required_laps: u32,
        window: TimeWindow,
    ) -> Result<Self, ModelError> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(ModelError::MissingField("week.name"));
        }
        if segment_id.is_empty() {
            return Err(ModelError::MissingField("week.segment_id"));
        }
        if required_laps == 0 {
            return Err(ModelError::InvalidValue {
                field: "week.required_laps",
                reason: "must be at least 1".to_string(),
            });
        }
        let id = EntityId::generate(&["week", &name, &window.start.to_rfc3339()]);
        Ok(Self {
            id,
            name,
            season_id,
            segment_id,
            required_laps,
            window,
            multiplier: DEFAULT_MULTIPLIER,
        })
    }

    /// Builder method to use an externally assigned ID.
    pub fn with_id(mut self, id: WeekId) -> Self {
        self.id = id;
        self
    }

    /// Builder method to set the scoring multiplier.
    pub fn with_multiplier(mut self, multiplier: u32) -> Result<Self, ModelError> {
        if !(1..=MAX_MULTIPLIER).contains(&multiplier) {
            return Err(ModelError::InvalidValue {
                field: "week.multiplier",
                reason: format!("must be between 1 and {}", MAX_MULTIPLIER),
            });
        }
        self.multiplier = multiplier;
        Ok(self)
    }

    /// Two weeks are comparable when they ride the same segment the same number of times.
    pub fn is_comparable_to(&self, other: &Week) -> bool {
        self.segment_id == other.segment_id && self.required_laps == other.required_laps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn window(day: u32) -> TimeWindow {
        TimeWindow::new(
            Utc.with_ymd_and_hms(2025, 3, day, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, day + 1, 0, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_week_defaults_to_single_multiplier() {
        let week = Week::new(
            "Week 1".to_string(),
            "s1".into(),
            "seg".into(),
            2,
            window(4),
        )
        .unwrap();
        assert_eq!(week.multiplier, 1);
        assert_eq!(week.required_laps, 2);
    }

    #[test]
    fn test_week_rejects_zero_laps_and_multiplier() {
        assert!(Week::new("W".to_string(), "s1".into(), "seg".into(), 0, window(4)).is_err());

        let week = Week::new("W".to_string(), "s1".into(), "seg".into(), 1, window(4)).unwrap();
        assert!(week.with_multiplier(0).is_err());
    }

    #[test]
    fn test_week_multiplier_upper_bound() {
        let week = Week::new("W".to_string(), "s1".into(), "seg".into(), 1, window(4)).unwrap();
        assert_eq!(
            week.clone().with_multiplier(MAX_MULTIPLIER).unwrap().multiplier,
            MAX_MULTIPLIER
        );
        assert!(week.clone().with_multiplier(MAX_MULTIPLIER + 1).is_err());
        assert!(week.with_multiplier(u32::MAX / 2).is_err());

        let row = r#"{"id":"w1","name":"Week 1","season_id":"s1","segment_id":"seg","required_laps":1,"multiplier":101,
            "window":{"start":"2025-03-04T00:00:00Z","end":"2025-03-05T00:00:00Z"}}"#;
        assert!(serde_json::from_str::<Week>(row).is_err());
    }

    #[test]
    fn test_week_row_defaults_and_validation() {
        let row = r#"{"id":"w1","name":"Week 1","season_id":"s1","segment_id":"seg",
            "required_laps":1,"window":{"start":"2025-03-04T00:00:00Z","end":"2025-03-05T00:00:00Z"}}"#;
        let week: Week = serde_json::from_str(row).unwrap();
        assert_eq!(week.id.as_str(), "w1");
        assert_eq!(week.multiplier, DEFAULT_MULTIPLIER);

        let bad = row.replace("\"required_laps\":1", "\"required_laps\":0");
        assert!(serde_json::from_str::<Week>(&bad).is_err());
    }

    #[test]
    fn test_week_comparability() {
        let a = Week::new("A".to_string(), "s1".into(), "seg".into(), 2, window(4)).unwrap();
        let b = Week::new("B".to_string(), "s1".into(), "seg".into(), 2, window(11)).unwrap();
        let c = Week::new("C".to_string(), "s1".into(), "seg".into(), 3, window(18)).unwrap();

        assert!(a.is_comparable_to(&b));
        assert!(!a.is_comparable_to(&c));
    }

    #[test]
    fn test_season_id_override_and_close() {
        let season = Season::new("Spring 2025".to_string(), window(1))
            .unwrap()
            .with_id("spring-2025".into())
            .unwrap()
            .closed();
        assert_eq!(season.id.as_str(), "spring-2025");
        assert!(season.is_closed);
    }
}

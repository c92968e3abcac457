//! Ghost comparison against the most recent comparable week.

use serde::Serialize;

use crate::models::{ParticipantId, Week, WeekId, WeekResult};

/// A participant's time from an earlier comparable week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ghost {
    pub week_id: WeekId,
    pub week_name: String,
    pub total_seconds: u32,

    /// Current minus ghost time; negative means faster this week
    pub delta_seconds: Option<i64>,
}

/// Find the participant's result in the latest earlier week on the same
/// segment with the same lap count.
///
/// Only weeks starting strictly before `target` are considered, and only
/// weeks where the participant actually has a result.
pub fn find_ghost(
    target: &Week,
    participant_id: &ParticipantId,
    current_seconds: Option<u32>,
    weeks: &[Week],
    results: &[WeekResult],
) -> Option<Ghost> {
    weeks
        .iter()
        .filter(|w| w.id != target.id)
        .filter(|w| w.window.start < target.window.start)
        .filter(|w| w.is_comparable_to(target))
        .filter_map(|w| {
            results
                .iter()
                .find(|r| r.week_id == w.id && &r.participant_id == participant_id)
                .map(|r| (w, r))
        })
        .max_by_key(|(w, _)| w.window.start)
        .map(|(w, r)| Ghost {
            week_id: w.id.clone(),
            week_name: w.name.clone(),
            total_seconds: r.total_seconds,
            delta_seconds: current_seconds.map(|c| i64::from(c) - i64::from(r.total_seconds)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimeWindow;
    use chrono::{TimeZone, Utc};

    fn week(id: &str, day: u32, segment: &str, laps: u32) -> Week {
        let window = TimeWindow::new(
            Utc.with_ymd_and_hms(2025, 3, day, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, day + 1, 0, 0, 0).unwrap(),
        )
        .unwrap();
        Week::new(format!("Week {}", id), "s1".into(), segment.into(), laps, window)
            .unwrap()
            .with_id(id.into())
    }

    fn result(week: &str, participant: &str, secs: u32) -> WeekResult {
        WeekResult {
            participant_id: participant.into(),
            week_id: week.into(),
            activity_id: format!("{}-{}", week, participant).into(),
            total_seconds: secs,
        }
    }

    #[test]
    fn test_finds_most_recent_comparable_week() {
        let weeks = vec![
            week("w1", 4, "seg", 2),
            week("w2", 11, "seg", 2),
            week("w3", 18, "other", 2),
            week("w4", 25, "seg", 2),
        ];
        let results = vec![
            result("w1", "ada", 700),
            result("w2", "ada", 680),
            result("w3", "ada", 300),
        ];

        let ghost = find_ghost(&weeks[3], &"ada".into(), Some(660), &weeks, &results).unwrap();
        assert_eq!(ghost.week_id.as_str(), "w2");
        assert_eq!(ghost.week_name, "Week w2");
        assert_eq!(ghost.total_seconds, 680);
        assert_eq!(ghost.delta_seconds, Some(-20));
    }

    #[test]
    fn test_different_lap_count_is_not_comparable() {
        let weeks = vec![week("w1", 4, "seg", 3), week("w2", 11, "seg", 2)];
        let results = vec![result("w1", "ada", 900)];
        assert!(find_ghost(&weeks[1], &"ada".into(), None, &weeks, &results).is_none());
    }

    #[test]
    fn test_later_weeks_are_ignored() {
        let weeks = vec![week("w1", 4, "seg", 1), week("w2", 11, "seg", 1)];
        let results = vec![result("w2", "ada", 500)];
        assert!(find_ghost(&weeks[0], &"ada".into(), Some(510), &weeks, &results).is_none());
    }

    #[test]
    fn test_skips_weeks_the_participant_missed() {
        let weeks = vec![
            week("w1", 4, "seg", 1),
            week("w2", 11, "seg", 1),
            week("w3", 18, "seg", 1),
        ];
        let results = vec![result("w1", "ada", 520), result("w2", "bo", 480)];

        let ghost = find_ghost(&weeks[2], &"ada".into(), None, &weeks, &results).unwrap();
        assert_eq!(ghost.week_id.as_str(), "w1");
        assert_eq!(ghost.delta_seconds, None);
    }
}

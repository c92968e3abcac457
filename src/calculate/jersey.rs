//! Season jerseys.
//!
//! Every week is either a climb or a flat week, decided by the segment's
//! average grade. The weekly winner (rank 1) earns a category win; the
//! season champion of a category is the rider with the most wins.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use super::scoring::ScoredResult;
use crate::models::{ParticipantId, WeekId};

/// Weeks on segments steeper than this average grade (percent) are climbs.
pub const CLIMB_GRADE_THRESHOLD: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JerseyCategory {
    Climb,
    Flat,
}

impl JerseyCategory {
    pub fn from_grade(average_grade: f64) -> Self {
        if average_grade > CLIMB_GRADE_THRESHOLD {
            JerseyCategory::Climb
        } else {
            JerseyCategory::Flat
        }
    }
}

impl fmt::Display for JerseyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JerseyCategory::Climb => write!(f, "climb"),
            JerseyCategory::Flat => write!(f, "flat"),
        }
    }
}

/// The rank-1 participant of a scored week, if anyone finished.
pub fn weekly_winner(results: &[ScoredResult]) -> Option<&ParticipantId> {
    results.iter().find(|r| r.rank == 1).map(|r| &r.participant_id)
}

/// A classified week and its winner.
#[derive(Debug, Clone)]
pub struct CategoryWeek {
    pub week_id: WeekId,
    pub category: JerseyCategory,
    pub winner: Option<ParticipantId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WinCount {
    pub participant_id: ParticipantId,
    pub wins: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryStandings {
    pub category: JerseyCategory,

    /// Weeks of this category in the season
    pub weeks: u32,

    /// Win counts, most wins first
    pub wins: Vec<WinCount>,

    /// Declared only once the season is closed
    pub champion: Option<ParticipantId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JerseyStandings {
    pub season_closed: bool,
    pub climb: CategoryStandings,
    pub flat: CategoryStandings,
}

fn tally_category(
    weeks: &[CategoryWeek],
    category: JerseyCategory,
    season_closed: bool,
) -> CategoryStandings {
    let mut counts: HashMap<&ParticipantId, u32> = HashMap::new();
    let mut leader: Option<(&ParticipantId, u32)> = None;
    let mut category_weeks = 0;

    for week in weeks.iter().filter(|w| w.category == category) {
        category_weeks += 1;
        let Some(winner) = week.winner.as_ref() else {
            continue;
        };
        let count = counts.entry(winner).or_insert(0);
        *count += 1;
        // Strictly greater: on a tie the rider who got there first keeps the lead
        if leader.map_or(true, |(_, best)| *count > best) {
            leader = Some((winner, *count));
        }
    }

    let mut wins: Vec<WinCount> = counts
        .into_iter()
        .map(|(participant_id, wins)| WinCount {
            participant_id: participant_id.clone(),
            wins,
        })
        .collect();
    wins.sort_by(|a, b| {
        b.wins
            .cmp(&a.wins)
            .then_with(|| a.participant_id.natural_cmp(&b.participant_id))
    });

    CategoryStandings {
        category,
        weeks: category_weeks,
        wins,
        champion: if season_closed {
            leader.map(|(id, _)| id.clone())
        } else {
            None
        },
    }
}

/// Tally category wins for a season. `weeks` must be in start order.
pub fn tally_jerseys(weeks: &[CategoryWeek], season_closed: bool) -> JerseyStandings {
    JerseyStandings {
        season_closed,
        climb: tally_category(weeks, JerseyCategory::Climb, season_closed),
        flat: tally_category(weeks, JerseyCategory::Flat, season_closed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cw(id: &str, category: JerseyCategory, winner: Option<&str>) -> CategoryWeek {
        CategoryWeek {
            week_id: id.into(),
            category,
            winner: winner.map(ParticipantId::from),
        }
    }

    #[test]
    fn test_grade_threshold_is_exclusive() {
        assert_eq!(JerseyCategory::from_grade(2.0), JerseyCategory::Flat);
        assert_eq!(JerseyCategory::from_grade(2.01), JerseyCategory::Climb);
        assert_eq!(JerseyCategory::from_grade(-1.5), JerseyCategory::Flat);
        assert_eq!(JerseyCategory::from_grade(8.0), JerseyCategory::Climb);
    }

    #[test]
    fn test_closed_season_declares_champions() {
        use JerseyCategory::*;
        let weeks = vec![
            cw("w1", Climb, Some("ada")),
            cw("w2", Flat, Some("bo")),
            cw("w3", Climb, Some("ada")),
            cw("w4", Climb, Some("cy")),
            cw("w5", Flat, None),
        ];

        let jerseys = tally_jerseys(&weeks, true);

        assert_eq!(jerseys.climb.weeks, 3);
        assert_eq!(jerseys.climb.champion.as_ref().map(|p| p.as_str()), Some("ada"));
        assert_eq!(
            jerseys.climb.wins,
            vec![
                WinCount { participant_id: "ada".into(), wins: 2 },
                WinCount { participant_id: "cy".into(), wins: 1 },
            ]
        );
        assert_eq!(jerseys.flat.weeks, 2);
        assert_eq!(jerseys.flat.champion.as_ref().map(|p| p.as_str()), Some("bo"));
    }

    #[test]
    fn test_open_season_exposes_counts_only() {
        let weeks = vec![cw("w1", JerseyCategory::Flat, Some("bo"))];
        let jerseys = tally_jerseys(&weeks, false);

        assert!(jerseys.flat.champion.is_none());
        assert_eq!(jerseys.flat.wins.len(), 1);
        assert_eq!(jerseys.flat.wins[0].wins, 1);
    }

    #[test]
    fn test_tied_champion_is_first_to_reach_max() {
        use JerseyCategory::*;
        let weeks = vec![
            cw("w1", Climb, Some("zed")),
            cw("w2", Climb, Some("amy")),
            cw("w3", Climb, Some("zed")),
            cw("w4", Climb, Some("amy")),
        ];
        let jerseys = tally_jerseys(&weeks, true);
        assert_eq!(jerseys.climb.champion.as_ref().map(|p| p.as_str()), Some("zed"));
    }

    #[test]
    fn test_category_without_weeks() {
        let jerseys = tally_jerseys(&[], true);
        assert_eq!(jerseys.climb.weeks, 0);
        assert!(jerseys.climb.wins.is_empty());
        assert!(jerseys.climb.champion.is_none());
    }
}

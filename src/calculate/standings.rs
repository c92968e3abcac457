//! Season standings.
//!
//! Each week is scored on its own; the season totals are the per-week
//! points summed per participant. Weeks that could not be scored are
//! reported and left out rather than counted as zero.

use std::collections::HashMap;

use serde::Serialize;
use tracing::warn;

use super::scoring::ScoredResult;
use crate::models::{ParticipantId, WeekId};

/// One week's scored results.
#[derive(Debug, Clone)]
pub struct WeekScores {
    pub week_id: WeekId,
    pub results: Vec<ScoredResult>,
}

/// A week excluded from aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedWeek {
    pub week_id: WeekId,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StandingEntry {
    pub rank: u32,
    pub participant_id: ParticipantId,
    pub total_points: u32,
    pub weeks_completed: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeasonStandings {
    pub entries: Vec<StandingEntry>,
    pub skipped_weeks: Vec<SkippedWeek>,
}

#[derive(Default)]
struct Tally {
    points: u32,
    weeks: u32,
}

/// Sum weekly points into season standings.
///
/// Order: points descending, then weeks completed descending, then
/// participant id ascending (numeric ids by value).
pub fn aggregate_season<I>(weeks: I) -> SeasonStandings
where
    I: IntoIterator<Item = Result<WeekScores, SkippedWeek>>,
{
    let mut tallies: HashMap<ParticipantId, Tally> = HashMap::new();
    let mut skipped_weeks = Vec::new();

    for week in weeks {
        let week = match week {
            Ok(w) => w,
            Err(skipped) => {
                warn!("Excluding week {} from standings: {}", skipped.week_id, skipped.reason);
                skipped_weeks.push(skipped);
                continue;
            }
        };

        for result in week.results {
            let tally = tallies.entry(result.participant_id).or_default();
            tally.points = tally.points.saturating_add(result.points.total);
            tally.weeks += 1;
        }
    }

    let mut sorted: Vec<(ParticipantId, Tally)> = tallies.into_iter().collect();
    sorted.sort_by(|(a_id, a), (b_id, b)| {
        b.points
            .cmp(&a.points)
            .then_with(|| b.weeks.cmp(&a.weeks))
            .then_with(|| a_id.natural_cmp(b_id))
    });

    let entries = sorted
        .into_iter()
        .enumerate()
        .map(|(i, (participant_id, tally))| StandingEntry {
            rank: i as u32 + 1,
            participant_id,
            total_points: tally.points,
            weeks_completed: tally.weeks,
        })
        .collect();

    SeasonStandings {
        entries,
        skipped_weeks,
    }
}

//! League read model.
//!
//! Joins stored rows into the views callers ask for: a week's leaderboard,
//! season standings and season jerseys. Every view is computed from a
//! fresh [`LeagueSnapshot`]; nothing derived is kept between calls.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::cache::ParticipantDirectory;
use crate::calculate::{
    aggregate_season, find_ghost, format_duration, score_week, tally_jerseys, weekly_winner,
    CategoryWeek, Ghost, JerseyCategory, JerseyStandings, PointsBreakdown, ScoredResult,
    ScoringEntry, SkippedWeek, WeekScores,
};
use crate::models::{
    Participant, ParticipantId, Season, SeasonId, Segment, SegmentId, Submission, Week, WeekId,
    WeekResult,
};
use crate::storage::{
    read_participants, read_seasons, read_segments, read_submissions, read_weeks, StorageConfig,
    StorageError,
};

#[derive(Debug, Error)]
pub enum LeagueError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Week {week_id} uses unknown segment {segment_id}")]
    UnknownSegment {
        week_id: WeekId,
        segment_id: SegmentId,
    },

    #[error("Inconsistent result for participant {participant_id} in week {week_id}: {reason}")]
    InconsistentResult {
        participant_id: ParticipantId,
        week_id: WeekId,
        reason: String,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// All league rows as read at one moment.
#[derive(Debug, Clone, Default)]
pub struct LeagueSnapshot {
    pub participants: Vec<Participant>,
    pub segments: Vec<Segment>,
    pub seasons: Vec<Season>,
    /// Sorted by start
    pub weeks: Vec<Week>,
    pub submissions: Vec<Submission>,
}

impl LeagueSnapshot {
    /// Read every league file.
    pub fn load(config: &StorageConfig) -> Result<Self, StorageError> {
        let snapshot = Self {
            participants: read_participants(config)?,
            segments: read_segments(config)?,
            seasons: read_seasons(config)?,
            weeks: read_weeks(config)?,
            submissions: read_submissions(config)?,
        };
        debug!(
            "Loaded league snapshot: {} weeks, {} submissions",
            snapshot.weeks.len(),
            snapshot.submissions.len()
        );
        Ok(snapshot)
    }

    pub fn week(&self, id: &WeekId) -> Result<&Week, LeagueError> {
        self.weeks
            .iter()
            .find(|w| &w.id == id)
            .ok_or_else(|| LeagueError::NotFound {
                kind: "Week",
                id: id.to_string(),
            })
    }

    pub fn season(&self, id: &SeasonId) -> Result<&Season, LeagueError> {
        self.seasons
            .iter()
            .find(|s| &s.id == id)
            .ok_or_else(|| LeagueError::NotFound {
                kind: "Season",
                id: id.to_string(),
            })
    }

    pub fn segment(&self, id: &SegmentId) -> Option<&Segment> {
        self.segments.iter().find(|s| &s.id == id)
    }

    /// Weeks of a season in start order.
    pub fn season_weeks(&self, season: &Season) -> Vec<&Week> {
        self.weeks
            .iter()
            .filter(|w| w.season_id == season.id)
            .inspect(|w| {
                if !w.window.is_inside(&season.window) {
                    warn!("Week {} lies outside season {} window", w.id, season.id);
                }
            })
            .collect()
    }

    pub fn week_submissions(&self, week_id: &WeekId) -> Vec<&Submission> {
        self.submissions
            .iter()
            .filter(|s| &s.result.week_id == week_id)
            .collect()
    }

    pub fn results(&self) -> Vec<WeekResult> {
        self.submissions.iter().map(|s| s.result.clone()).collect()
    }
}

/// Check a stored submission against its week before it is scored.
fn check_submission(week: &Week, submission: &Submission) -> Result<(), LeagueError> {
    let inconsistent = |reason: String| LeagueError::InconsistentResult {
        participant_id: submission.result.participant_id.clone(),
        week_id: week.id.clone(),
        reason,
    };

    let record = &submission.record;
    if record.efforts.len() != week.required_laps as usize {
        return Err(inconsistent(format!(
            "{} efforts stored, {} laps required",
            record.efforts.len(),
            week.required_laps
        )));
    }
    if let Some(e) = record.efforts.iter().find(|e| e.segment_id != week.segment_id) {
        return Err(inconsistent(format!(
            "effort {} is on segment {}",
            e.id, e.segment_id
        )));
    }
    if record.total_seconds() != u64::from(submission.result.total_seconds) {
        return Err(inconsistent(format!(
            "efforts sum to {}s but result says {}s",
            record.total_seconds(),
            submission.result.total_seconds
        )));
    }
    if !week.window.contains(record.start_date) {
        return Err(inconsistent(format!(
            "activity {} started outside the week window",
            record.id
        )));
    }
    Ok(())
}

fn scoring_entry(week: &Week, submission: &Submission) -> Result<ScoringEntry, LeagueError> {
    check_submission(week, submission)?;
    Ok(ScoringEntry {
        participant_id: submission.result.participant_id.clone(),
        total_seconds: submission.result.total_seconds,
        has_pr: submission.record.has_pr(),
    })
}

/// Build scoring input for a week, validating every stored result.
pub fn scoring_entries(
    snapshot: &LeagueSnapshot,
    week: &Week,
) -> Result<Vec<ScoringEntry>, LeagueError> {
    snapshot
        .week_submissions(&week.id)
        .into_iter()
        .map(|s| scoring_entry(week, s))
        .collect()
}

/// Score a week from current rows.
pub fn score_stored_week(
    snapshot: &LeagueSnapshot,
    week: &Week,
) -> Result<Vec<ScoredResult>, LeagueError> {
    let entries = scoring_entries(snapshot, week)?;
    Ok(score_week(&entries, week.multiplier))
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekSummary {
    pub id: WeekId,
    pub name: String,
    pub season_id: SeasonId,
    pub segment_id: SegmentId,
    pub segment_name: Option<String>,
    pub average_grade: Option<f64>,
    pub category: Option<JerseyCategory>,
    pub required_laps: u32,
    pub multiplier: u32,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl WeekSummary {
    fn new(week: &Week, segment: Option<&Segment>) -> Self {
        Self {
            id: week.id.clone(),
            name: week.name.clone(),
            season_id: week.season_id.clone(),
            segment_id: week.segment_id.clone(),
            segment_name: segment.map(|s| s.name.clone()),
            average_grade: segment.map(|s| s.average_grade),
            category: segment.map(|s| JerseyCategory::from_grade(s.average_grade)),
            required_laps: week.required_laps,
            multiplier: week.multiplier,
            start: week.window.start,
            end: week.window.end,
        }
    }
}

/// One accepted lap as shown on the leaderboard.
#[derive(Debug, Clone, Serialize)]
pub struct EffortBreakdown {
    pub lap: u32,
    pub effort_id: String,
    pub elapsed_seconds: u32,
    pub is_pr: bool,
    pub average_watts: Option<f64>,
    pub average_heartrate: Option<f64>,
    pub average_cadence: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub participant_id: ParticipantId,
    pub name: String,
    pub total_seconds: u32,
    pub time: String,
    pub gap_to_leader_seconds: u32,
    pub points: PointsBreakdown,
    pub efforts: Vec<EffortBreakdown>,
    pub ghost: Option<Ghost>,
}

/// A stored result left off a leaderboard because it failed its checks.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedResult {
    pub participant_id: ParticipantId,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekLeaderboard {
    pub week: WeekSummary,
    pub entries: Vec<LeaderboardEntry>,
    pub skipped_results: Vec<SkippedResult>,
}

/// Compute the leaderboard of a week.
///
/// Results that fail their checks are left out and listed in
/// `skipped_results`; the rest are ranked among themselves.
pub fn week_leaderboard(
    snapshot: &LeagueSnapshot,
    directory: &dyn ParticipantDirectory,
    week_id: &WeekId,
) -> Result<WeekLeaderboard, LeagueError> {
    let week = snapshot.week(week_id)?;
    let mut scoring = Vec::new();
    let mut skipped_results = Vec::new();
    for submission in snapshot.week_submissions(&week.id) {
        match scoring_entry(week, submission) {
            Ok(entry) => scoring.push(entry),
            Err(e) => {
                warn!("Excluding result from week {} leaderboard: {}", week.id, e);
                skipped_results.push(SkippedResult {
                    participant_id: submission.result.participant_id.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    let scored = score_week(&scoring, week.multiplier);
    let results = snapshot.results();
    let leader_seconds = scored.first().map(|r| r.total_seconds).unwrap_or(0);

    let entries = scored
        .into_iter()
        .map(|r| {
            let efforts = snapshot
                .submissions
                .iter()
                .find(|s| s.key() == (&r.participant_id, &week.id))
                .map(|s| {
                    s.record
                        .efforts
                        .iter()
                        .enumerate()
                        .map(|(i, e)| EffortBreakdown {
                            lap: i as u32 + 1,
                            effort_id: e.id.to_string(),
                            elapsed_seconds: e.elapsed_seconds,
                            is_pr: e.is_pr,
                            average_watts: e.average_watts,
                            average_heartrate: e.average_heartrate,
                            average_cadence: e.average_cadence,
                        })
                        .collect()
                })
                .unwrap_or_default();
            let ghost = find_ghost(
                week,
                &r.participant_id,
                Some(r.total_seconds),
                &snapshot.weeks,
                &results,
            );

            LeaderboardEntry {
                rank: r.rank,
                name: directory.display_name(&r.participant_id),
                time: format_duration(r.total_seconds),
                gap_to_leader_seconds: r.total_seconds - leader_seconds,
                total_seconds: r.total_seconds,
                points: r.points,
                efforts,
                ghost,
                participant_id: r.participant_id,
            }
        })
        .collect();

    Ok(WeekLeaderboard {
        week: WeekSummary::new(week, snapshot.segment(&week.segment_id)),
        entries,
        skipped_results,
    })
}

/// Score every week of a season, isolating weeks that fail.
fn season_week_scores<'a>(
    snapshot: &'a LeagueSnapshot,
    season: &Season,
) -> Vec<(&'a Week, Result<WeekScores, SkippedWeek>)> {
    snapshot
        .season_weeks(season)
        .into_iter()
        .map(|week| {
            let scores = score_stored_week(snapshot, week)
                .map(|results| WeekScores {
                    week_id: week.id.clone(),
                    results,
                })
                .map_err(|e| SkippedWeek {
                    week_id: week.id.clone(),
                    reason: e.to_string(),
                });
            (week, scores)
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct StandingRow {
    pub rank: u32,
    pub participant_id: ParticipantId,
    pub name: String,
    pub total_points: u32,
    pub weeks_completed: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeasonStandingsView {
    pub season_id: SeasonId,
    pub season_name: String,
    pub is_closed: bool,
    pub weeks_scored: usize,
    pub standings: Vec<StandingRow>,
    pub skipped_weeks: Vec<SkippedWeek>,
}

/// Compute season standings from current rows.
pub fn season_standings(
    snapshot: &LeagueSnapshot,
    directory: &dyn ParticipantDirectory,
    season_id: &SeasonId,
) -> Result<SeasonStandingsView, LeagueError> {
    let season = snapshot.season(season_id)?;
    let weeks = season_week_scores(snapshot, season);
    let weeks_scored = weeks.iter().filter(|(_, s)| s.is_ok()).count();
    let aggregated = aggregate_season(weeks.into_iter().map(|(_, s)| s));

    let standings = aggregated
        .entries
        .into_iter()
        .map(|e| StandingRow {
            rank: e.rank,
            name: directory.display_name(&e.participant_id),
            participant_id: e.participant_id,
            total_points: e.total_points,
            weeks_completed: e.weeks_completed,
        })
        .collect();

    Ok(SeasonStandingsView {
        season_id: season.id.clone(),
        season_name: season.name.clone(),
        is_closed: season.is_closed,
        weeks_scored,
        standings,
        skipped_weeks: aggregated.skipped_weeks,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct SeasonJerseysView {
    pub season_id: SeasonId,
    pub season_name: String,
    pub jerseys: JerseyStandings,
    pub climb_champion_name: Option<String>,
    pub flat_champion_name: Option<String>,
    pub skipped_weeks: Vec<SkippedWeek>,
}

/// Tally climb and flat jerseys for a season.
pub fn season_jerseys(
    snapshot: &LeagueSnapshot,
    directory: &dyn ParticipantDirectory,
    season_id: &SeasonId,
) -> Result<SeasonJerseysView, LeagueError> {
    let season = snapshot.season(season_id)?;
    let mut skipped_weeks = Vec::new();
    let mut category_weeks = Vec::new();

    for (week, scores) in season_week_scores(snapshot, season) {
        let scores = match scores {
            Ok(s) => s,
            Err(skipped) => {
                warn!("Excluding week {} from jerseys: {}", skipped.week_id, skipped.reason);
                skipped_weeks.push(skipped);
                continue;
            }
        };
        let Some(segment) = snapshot.segment(&week.segment_id) else {
            let err = LeagueError::UnknownSegment {
                week_id: week.id.clone(),
                segment_id: week.segment_id.clone(),
            };
            warn!("Excluding week {} from jerseys: {}", week.id, err);
            skipped_weeks.push(SkippedWeek {
                week_id: week.id.clone(),
                reason: err.to_string(),
            });
            continue;
        };

        category_weeks.push(CategoryWeek {
            week_id: week.id.clone(),
            category: JerseyCategory::from_grade(segment.average_grade),
            winner: weekly_winner(&scores.results).cloned(),
        });
    }

    let jerseys = tally_jerseys(&category_weeks, season.is_closed);
    let name_of = |id: &Option<ParticipantId>| id.as_ref().map(|p| directory.display_name(p));

    Ok(SeasonJerseysView {
        season_id: season.id.clone(),
        season_name: season.name.clone(),
        climb_champion_name: name_of(&jerseys.climb.champion),
        flat_champion_name: name_of(&jerseys.flat.champion),
        jerseys,
        skipped_weeks,
    })
}

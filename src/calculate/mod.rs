//! League calculation engine.
//!
//! Pure, stateless computations over stored rows:
//! - Validity windows and best contiguous laps
//! - Qualifying activity selection
//! - Weekly points, season standings and jerseys
//! - Ghost comparison with earlier comparable weeks
//!
//! Nothing here is cached or persisted; every caller recomputes from the
//! current rows.

pub mod best_window;
pub mod ghost;
pub mod jersey;
pub mod scoring;
pub mod selector;
pub mod standings;
pub mod window;

pub use best_window::{select_best_window, BestWindow, BestWindowError};
pub use ghost::{find_ghost, Ghost};
pub use jersey::{
    tally_jerseys, weekly_winner, CategoryStandings, CategoryWeek, JerseyCategory,
    JerseyStandings, WinCount, CLIMB_GRADE_THRESHOLD,
};
pub use scoring::{score_week, PointsBreakdown, ScoredResult, ScoringEntry};
pub use selector::{
    select_qualifying, CandidateActivity, CandidateFailure, QualifyingActivity,
    RejectedCandidate, Rejection, SelectionCriteria, SelectionError, SelectionOutcome,
};
pub use standings::{aggregate_season, SeasonStandings, SkippedWeek, StandingEntry, WeekScores};
pub use window::{is_within, parse_timestamp, WindowError};

/// Format seconds as `m:ss` or `h:mm:ss`.
pub fn format_duration(total_seconds: u32) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

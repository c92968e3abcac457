//! Weekly scoring.
//!
//! Points for a week are `(beaten + 1 + pr) * multiplier`: one base point per
//! rider beaten, a participation point for finishing, and a bonus point when
//! any accepted lap was a personal record.

use serde::Serialize;

use crate::models::ParticipantId;

/// Points awarded to every finisher.
pub const PARTICIPATION_POINTS: u32 = 1;

/// Bonus for a personal record on any accepted lap.
pub const PR_BONUS_POINTS: u32 = 1;

/// One finisher's input to the scoring engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoringEntry {
    pub participant_id: ParticipantId,
    pub total_seconds: u32,
    pub has_pr: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PointsBreakdown {
    /// Riders beaten
    pub base: u32,
    pub participation: u32,
    pub pr_bonus: u32,
    pub multiplier: u32,
    pub total: u32,
}

impl PointsBreakdown {
    fn new(rank: u32, finishers: u32, has_pr: bool, multiplier: u32) -> Self {
        let base = finishers - rank;
        let pr_bonus = if has_pr { PR_BONUS_POINTS } else { 0 };
        Self {
            base,
            participation: PARTICIPATION_POINTS,
            pr_bonus,
            multiplier,
            total: (base + PARTICIPATION_POINTS + pr_bonus).saturating_mul(multiplier),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoredResult {
    /// 1-based, no shared ranks
    pub rank: u32,
    pub participant_id: ParticipantId,
    pub total_seconds: u32,
    pub has_pr: bool,
    pub points: PointsBreakdown,
}

/// Rank one week's finishers and compute their points.
///
/// Sorted by total time ascending; equal times are ordered by participant id
/// (numeric ids by value) so the result never depends on input order. Totals
/// saturate at `u32::MAX`.
pub fn score_week(entries: &[ScoringEntry], multiplier: u32) -> Vec<ScoredResult> {
    let mut sorted: Vec<&ScoringEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| {
        a.total_seconds
            .cmp(&b.total_seconds)
            .then_with(|| a.participant_id.natural_cmp(&b.participant_id))
    });

    let finishers = sorted.len() as u32;
    sorted
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
            let rank = i as u32 + 1;
            ScoredResult {
                rank,
                participant_id: entry.participant_id.clone(),
                total_seconds: entry.total_seconds,
                has_pr: entry.has_pr,
                points: PointsBreakdown::new(rank, finishers, entry.has_pr, multiplier),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, secs: u32, pr: bool) -> ScoringEntry {
        ScoringEntry {
            participant_id: id.into(),
            total_seconds: secs,
            has_pr: pr,
        }
    }

    fn totals(results: &[ScoredResult]) -> Vec<u32> {
        results.iter().map(|r| r.points.total).collect()
    }

    #[test]
    fn test_three_riders_double_points() {
        let results = score_week(
            &[entry("c", 1200, false), entry("a", 1000, false), entry("b", 1100, false)],
            2,
        );

        let ranks: Vec<_> = results.iter().map(|r| (r.participant_id.as_str(), r.rank)).collect();
        assert_eq!(ranks, vec![("a", 1), ("b", 2), ("c", 3)]);

        let base: Vec<_> = results.iter().map(|r| r.points.base).collect();
        assert_eq!(base, vec![2, 1, 0]);
        assert_eq!(totals(&results), vec![6, 4, 2]);
    }

    #[test]
    fn test_single_rider_with_pr_triple_points() {
        let results = score_week(&[entry("solo", 900, true)], 3);
        let p = results[0].points;
        assert_eq!(p.base, 0);
        assert_eq!(p.participation, 1);
        assert_eq!(p.pr_bonus, 1);
        assert_eq!(p.total, 6);
    }

    #[test]
    fn test_base_points_sum_is_triangular() {
        for finishers in 0..12u32 {
            for multiplier in [1, 2, 5] {
                let entries: Vec<_> = (0..finishers)
                    .map(|i| entry(&format!("p{:02}", i), 1000 + (i * 37) % 11, i % 3 == 0))
                    .collect();
                let results = score_week(&entries, multiplier);
                let base_sum: u32 = results.iter().map(|r| r.points.base).sum();
                assert_eq!(base_sum, finishers * finishers.saturating_sub(1) / 2);
            }
        }
    }

    #[test]
    fn test_participation_floor() {
        let entries: Vec<_> = (0..6).map(|i| entry(&format!("p{}", i), 500 + i * 10, false)).collect();
        for multiplier in 1..5 {
            for r in score_week(&entries, multiplier) {
                assert!(r.points.total >= multiplier);
            }
        }
    }

    #[test]
    fn test_better_rank_never_scores_less() {
        let entries: Vec<_> = (0..8).map(|i| entry(&format!("p{}", i), 700 - i * 5, false)).collect();
        let results = score_week(&entries, 2);
        for pair in results.windows(2) {
            assert!(pair[0].points.total >= pair[1].points.total);
        }
    }

    #[test]
    fn test_doubling_multiplier_doubles_totals() {
        let entries = vec![entry("a", 610, true), entry("b", 640, false), entry("c", 700, false)];
        let single = score_week(&entries, 1);
        let double = score_week(&entries, 2);
        for (s, d) in single.iter().zip(double.iter()) {
            assert_eq!(s.participant_id, d.participant_id);
            assert_eq!(s.points.total * 2, d.points.total);
        }
    }

    #[test]
    fn test_equal_times_break_by_participant_id() {
        let forward = score_week(&[entry("b", 600, false), entry("a", 600, false)], 1);
        let reverse = score_week(&[entry("a", 600, false), entry("b", 600, false)], 1);

        assert_eq!(forward, reverse);
        assert_eq!(forward[0].participant_id.as_str(), "a");
        assert_eq!(forward[1].rank, 2);
    }

    #[test]
    fn test_scoring_is_idempotent() {
        let entries = vec![entry("a", 610, false), entry("b", 590, true)];
        assert_eq!(score_week(&entries, 2), score_week(&entries, 2));
    }

    #[test]
    fn test_empty_week() {
        assert!(score_week(&[], 1).is_empty());
    }

    #[test]
    fn test_equal_times_order_numeric_ids_by_value() {
        let results = score_week(&[entry("100", 900, false), entry("99", 900, false)], 1);
        let ids: Vec<_> = results.iter().map(|r| r.participant_id.as_str()).collect();
        assert_eq!(ids, vec!["99", "100"]);
        assert_eq!(totals(&results), vec![2, 1]);
    }

    #[test]
    fn test_huge_multiplier_saturates() {
        let results = score_week(&[entry("a", 900, true), entry("b", 950, false)], u32::MAX / 2);
        assert_eq!(results[0].points.total, u32::MAX);
        assert_eq!(results[1].points.total, u32::MAX / 2);
        assert!(results.iter().all(|r| r.points.total >= r.points.multiplier));
    }
}

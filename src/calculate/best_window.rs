//! Fastest contiguous run of laps.
//!
//! Riders often log extra passes (warm-up, an accidental extra lap). The
//! accepted laps are the `required` consecutive efforts with the smallest
//! total, in recording order.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BestWindowError {
    #[error("Required lap count must be at least 1")]
    InvalidCount,

    #[error("Insufficient data: {available} efforts, {required} required")]
    InsufficientData { available: usize, required: usize },
}

/// The selected run of efforts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestWindow {
    /// Index of the first selected effort
    pub start: usize,

    /// Original indices of the selected efforts
    pub indices: Vec<usize>,

    /// Sum of the selected durations
    pub total: u64,
}

/// Find the contiguous window of `required` durations with the minimum sum.
///
/// Ties go to the earliest starting index.
pub fn select_best_window(durations: &[u32], required: usize) -> Result<BestWindow, BestWindowError> {
    if required == 0 {
        return Err(BestWindowError::InvalidCount);
    }
    if durations.len() < required {
        return Err(BestWindowError::InsufficientData {
            available: durations.len(),
            required,
        });
    }

    let mut sum: u64 = durations[..required].iter().map(|&d| u64::from(d)).sum();
    let mut best_start = 0;
    let mut best_total = sum;

    for start in 1..=durations.len() - required {
        sum = sum - u64::from(durations[start - 1]) + u64::from(durations[start + required - 1]);
        if sum < best_total {
            best_total = sum;
            best_start = start;
        }
    }

    Ok(BestWindow {
        start: best_start,
        indices: (best_start..best_start + required).collect(),
        total: best_total,
    })
}

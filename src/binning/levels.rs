//! Density-balanced derivation of representative speed levels
//!
//! Low closing speeds are plentiful, so each 0.1-resolution level there holds
//! enough observations for its own density. Higher speeds are sparse: past
//! the last well-populated fine level, observations are merged in speed order
//! into runs of `min_per_level` and each run is represented by its mean speed.

use crate::common::constants::LEVEL_RESOLUTION;
use crate::common::grid::round_decimals;
use crate::config::BinningConfig;
use crate::errors::InferenceError;
use crate::types::Observation;

use super::quantizer::SpeedLevels;

const LEVEL_DECIMALS: i32 = 1;

/// How the fine-level prefix was resolved
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LevelDerivation {
    /// Fine levels up to and including `cut` are kept as-is
    PrefixFound {
        /// Highest fine level holding at least `min_per_level` observations
        cut: f64,
    },
    /// No fine level is populated enough; every positive level is merged
    NoLevelQualifies,
}

impl LevelDerivation {
    /// Fine levels at or below this value keep their own bin
    #[inline]
    pub fn cut(&self) -> f64 {
        match *self {
            LevelDerivation::PrefixFound { cut } => cut,
            LevelDerivation::NoLevelQualifies => 0.0,
        }
    }
}

/// Result of level derivation
#[derive(Debug, Clone)]
pub struct DerivedLevels {
    /// Which branch produced the levels
    pub outcome: LevelDerivation,
    /// Level assigned to each input observation (input order); `None` for
    /// observations whose fine level is not above the cut and not kept
    pub assignments: Vec<Option<f64>>,
    /// Distinct assigned levels, ascending
    pub levels: SpeedLevels,
}

impl DerivedLevels {
    /// Number of observations that received a level
    pub fn num_assigned(&self) -> usize {
        self.assignments.iter().filter(|a| a.is_some()).count()
    }
}

/// Derive representative speed levels from observed relative speeds.
///
/// # Errors
/// - [`InferenceError::Configuration`] when `min_per_level` is zero
/// - [`InferenceError::EmptySpeedLevels`] when no observation gets a level
pub fn derive_levels(
    observations: &[Observation],
    config: &BinningConfig,
) -> Result<DerivedLevels, InferenceError> {
    config.validate()?;
    let min_count = config.min_per_level;

    let mut order: Vec<usize> = (0..observations.len()).collect();
    order.sort_by(|&a, &b| {
        observations[a]
            .relative_speed
            .total_cmp(&observations[b].relative_speed)
    });
    let fine: Vec<f64> = order
        .iter()
        .map(|&i| round_decimals(observations[i].relative_speed, LEVEL_DECIMALS))
        .collect();

    let outcome = match last_populated_level(&fine, min_count) {
        Some(cut) => LevelDerivation::PrefixFound { cut },
        None => LevelDerivation::NoLevelQualifies,
    };
    let cut = outcome.cut();
    log::debug!(
        "Level derivation: {} observations, {:?}",
        observations.len(),
        outcome
    );

    let mut assignments: Vec<Option<f64>> = vec![None; observations.len()];

    if let LevelDerivation::PrefixFound { .. } = outcome {
        for (pos, &obs_idx) in order.iter().enumerate() {
            if fine[pos] <= cut {
                assignments[obs_idx] = Some(fine[pos]);
            }
        }
    }

    // Sorted positions above the cut, merged into consecutive runs
    let merged: Vec<usize> = (0..order.len()).filter(|&pos| fine[pos] > cut).collect();
    for run in merged.chunks(min_count) {
        let mean = run
            .iter()
            .map(|&pos| observations[order[pos]].relative_speed)
            .sum::<f64>()
            / run.len() as f64;
        let level = round_decimals(mean, LEVEL_DECIMALS);
        for &pos in run {
            assignments[order[pos]] = Some(level);
        }
    }

    let levels = SpeedLevels::new(assignments.iter().flatten().copied())?;
    log::info!(
        "Derived {} speed levels (fine resolution {} up to {})",
        levels.len(),
        LEVEL_RESOLUTION,
        cut
    );

    Ok(DerivedLevels {
        outcome,
        assignments,
        levels,
    })
}

/// Highest fine level whose run in `fine` (sorted) has at least `min_count`
/// members.
fn last_populated_level(fine: &[f64], min_count: usize) -> Option<f64> {
    let mut best = None;
    let mut start = 0;
    while start < fine.len() {
        let level = fine[start];
        let end = start + fine[start..].iter().take_while(|&&f| f == level).count();
        if end - start >= min_count {
            best = Some(level);
        }
        start = end;
    }
    best
}

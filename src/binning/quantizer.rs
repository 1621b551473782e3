//! Nearest-level quantization of relative speeds

use crate::common::parallel::map_ordered;
use crate::errors::{InferenceError, InputError};

/// Sorted, de-duplicated set of representative relative-speed levels
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedLevels {
    levels: Vec<f64>,
}

impl SpeedLevels {
    /// Build from any collection of levels.
    ///
    /// Levels are sorted ascending and exact duplicates removed. Fails on an
    /// empty collection or a non-finite level.
    pub fn new<I: IntoIterator<Item = f64>>(levels: I) -> Result<Self, InferenceError> {
        let mut levels: Vec<f64> = levels.into_iter().collect();
        if let Some(row) = levels.iter().position(|l| !l.is_finite()) {
            return Err(InputError::NonFinite {
                row,
                column: "speed_level".to_string(),
            }
            .into());
        }
        if levels.is_empty() {
            return Err(InferenceError::EmptySpeedLevels);
        }
        levels.sort_by(f64::total_cmp);
        levels.dedup();
        Ok(Self { levels })
    }

    /// Levels in ascending order
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.levels
    }

    /// Number of levels
    #[inline]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Always false; construction rejects empty sets
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Highest level (saturation level)
    #[inline]
    pub fn max(&self) -> f64 {
        self.levels[self.levels.len() - 1]
    }

    /// Level at a bin index
    #[inline]
    pub fn get(&self, index: usize) -> Option<f64> {
        self.levels.get(index).copied()
    }

    /// Bin index of the level nearest to `v`.
    ///
    /// Speeds at or above the top level saturate into the top bin. Otherwise
    /// the candidates are the first level `>= v` and its predecessor; an exact
    /// tie goes to the upper candidate.
    pub fn quantize_index(&self, v: f64) -> usize {
        let last = self.levels.len() - 1;
        if v >= self.levels[last] {
            return last;
        }
        let upper = self.levels.partition_point(|&r| r < v);
        let lower = upper.saturating_sub(1);
        let upper_gap = self.levels[upper] - v;
        let lower_gap = v - self.levels[lower];
        if upper_gap <= lower_gap {
            upper
        } else {
            lower
        }
    }

    /// Level nearest to `v` (see [`quantize_index`](Self::quantize_index))
    #[inline]
    pub fn quantize(&self, v: f64) -> f64 {
        self.levels[self.quantize_index(v)]
    }

    /// Bin indices for a whole column of speeds
    pub fn quantize_batch(&self, speeds: &[f64]) -> Vec<usize> {
        map_ordered(speeds, |&v| self.quantize_index(v))
    }
}

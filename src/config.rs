//! Configuration types for inference runs
//!
//! [`InferenceConfig`] holds the numerical knobs of density estimation and
//! threshold solving; [`BinningConfig`] holds the minimum population used when
//! deriving representative speed levels. Both deserialize from JSON with every
//! field optional, falling back to the defaults in [`crate::common::constants`].

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::constants::{
    ALPHA_START, ALPHA_STEP, CANDIDATE_STEP, DENSITY_SCAN_LIMIT, HIGHWAY_MIN_PER_LEVEL,
    HUNDRED_CAR_MIN_PER_LEVEL, MIN_CONFLICT_SAMPLES, NUM_ALPHAS,
};
use crate::errors::{InferenceError, InputError};

/// Numerical parameters of density estimation and threshold solving
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Step of the density scan and candidate-threshold grids
    pub candidate_step: f64,
    /// Exclusive upper limit of the grid used to locate the baseline peak
    pub density_scan_limit: f64,
    /// Conflict subsets with this many members or fewer are missing
    pub min_conflict_samples: usize,
    /// First weighting coefficient
    pub alpha_start: f64,
    /// Spacing between weighting coefficients
    pub alpha_step: f64,
    /// Number of weighting coefficients
    pub num_alphas: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            candidate_step: CANDIDATE_STEP,
            density_scan_limit: DENSITY_SCAN_LIMIT,
            min_conflict_samples: MIN_CONFLICT_SAMPLES,
            alpha_start: ALPHA_START,
            alpha_step: ALPHA_STEP,
            num_alphas: NUM_ALPHAS,
        }
    }
}

impl InferenceConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the candidate grid step.
    pub fn with_candidate_step(mut self, step: f64) -> Self {
        self.candidate_step = step;
        self
    }

    /// Set the exclusive upper limit of the baseline peak scan.
    pub fn with_density_scan_limit(mut self, limit: f64) -> Self {
        self.density_scan_limit = limit;
        self
    }

    /// Set the missing-bin cutoff (missing when count <= `min`).
    pub fn with_min_conflict_samples(mut self, min: usize) -> Self {
        self.min_conflict_samples = min;
        self
    }

    /// Set the weighting-coefficient schedule.
    pub fn with_alphas(mut self, start: f64, step: f64, count: usize) -> Self {
        self.alpha_start = start;
        self.alpha_step = step;
        self.num_alphas = count;
        self
    }

    /// Weighting coefficients, `alpha_start + k * alpha_step` for each k.
    pub fn alphas(&self) -> Vec<f64> {
        (0..self.num_alphas)
            .map(|k| self.alpha_start + k as f64 * self.alpha_step)
            .collect()
    }

    /// Check that every parameter is usable.
    pub fn validate(&self) -> Result<(), InferenceError> {
        if !(self.candidate_step.is_finite() && self.candidate_step > 0.0) {
            return Err(configuration(format!(
                "candidate_step must be positive, got {}",
                self.candidate_step
            )));
        }
        if !(self.density_scan_limit.is_finite() && self.density_scan_limit > 0.0) {
            return Err(configuration(format!(
                "density_scan_limit must be positive, got {}",
                self.density_scan_limit
            )));
        }
        if self.num_alphas == 0 {
            return Err(configuration("num_alphas must be at least 1".to_string()));
        }
        if let Some(bad) = self.alphas().into_iter().find(|a| !(0.0..=1.0).contains(a)) {
            return Err(configuration(format!(
                "weighting coefficient {} lies outside [0, 1]",
                bad
            )));
        }
        Ok(())
    }

    /// Parse from a JSON string; absent fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, InferenceError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| configuration(format!("invalid inference config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, InferenceError> {
        let content = fs::read_to_string(path.as_ref()).map_err(InputError::from)?;
        Self::from_json_str(&content)
    }
}

/// Parameters of representative speed-level derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinningConfig {
    /// Minimum observations a fine (0.1) level needs, and the size of the
    /// merged runs above the last well-populated level
    pub min_per_level: usize,
}

impl Default for BinningConfig {
    fn default() -> Self {
        Self::hundred_car_events()
    }
}

impl BinningConfig {
    /// Create a binning configuration
    pub fn new(min_per_level: usize) -> Self {
        Self { min_per_level }
    }

    /// Preset for highway trajectories with rule-based (synthetic) conflicts
    pub fn highway_trajectories() -> Self {
        Self::new(HIGHWAY_MIN_PER_LEVEL)
    }

    /// Preset for the 100-car naturalistic study with annotated events
    pub fn hundred_car_events() -> Self {
        Self::new(HUNDRED_CAR_MIN_PER_LEVEL)
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<(), InferenceError> {
        if self.min_per_level == 0 {
            return Err(configuration("min_per_level must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn configuration(description: String) -> InferenceError {
    InferenceError::Configuration { description }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_alphas() {
        let alphas = InferenceConfig::default().alphas();
        assert_eq!(alphas.len(), 19);
        assert!((alphas[0] - 0.05).abs() < 1e-12);
        assert!((alphas[9] - 0.5).abs() < 1e-12);
        assert!((alphas[18] - 0.95).abs() < 1e-12);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = InferenceConfig::from_json_str(r#"{ "min_conflict_samples": 10 }"#).unwrap();
        assert_eq!(config.min_conflict_samples, 10);
        assert_eq!(config.candidate_step, CANDIDATE_STEP);
        assert_eq!(config.num_alphas, NUM_ALPHAS);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(InferenceConfig::new().with_candidate_step(0.0).validate().is_err());
        assert!(InferenceConfig::new().with_alphas(0.5, 0.5, 3).validate().is_err());
        assert!(InferenceConfig::new().with_alphas(0.1, 0.1, 0).validate().is_err());
        assert!(InferenceConfig::new().validate().is_ok());
    }

    #[test]
    fn test_invalid_json() {
        let err = InferenceConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, InferenceError::Configuration { .. }));
    }

    #[test]
    fn test_binning_presets() {
        assert_eq!(BinningConfig::highway_trajectories().min_per_level, 7500);
        assert_eq!(BinningConfig::hundred_car_events().min_per_level, 800);
        assert!(BinningConfig::new(0).validate().is_err());
    }
}

//! Numerical constants used throughout the inference engine
//!
//! The grid steps and the alpha schedule are part of the output contract:
//! changing them changes every threshold table. User-facing overrides live in
//! [`InferenceConfig`](crate::config::InferenceConfig); these are the defaults.

/// Step of both the density scan grid and the candidate-threshold grid
pub const CANDIDATE_STEP: f64 = 0.1;

/// Exclusive upper limit of the grid used to locate the baseline density peak
pub const DENSITY_SCAN_LIMIT: f64 = 200.0;

/// A conflict subset with this many members or fewer is treated as missing
pub const MIN_CONFLICT_SAMPLES: usize = 5;

/// First weighting coefficient
pub const ALPHA_START: f64 = 0.05;

/// Spacing between consecutive weighting coefficients
pub const ALPHA_STEP: f64 = 0.05;

/// Number of weighting coefficients (0.05 through 0.95)
pub const NUM_ALPHAS: usize = 19;

/// Resolution (in speed units) of the fine speed levels used during binning
pub const LEVEL_RESOLUTION: f64 = 0.1;

/// Minimum observations per speed level for the synthetic-conflict highway dataset
pub const HIGHWAY_MIN_PER_LEVEL: usize = 7500;

/// Minimum observations per speed level for the 100-car near-crash event dataset
pub const HUNDRED_CAR_MIN_PER_LEVEL: usize = 800;

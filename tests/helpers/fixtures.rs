//! Deterministic datasets for integration tests

use tempfile::TempDir;

use spacing_thresholds::synthetic::{generate_labeled, separated_bin, SyntheticConfig};
use spacing_thresholds::{ConflictDefinition, Observation, SpeedLevels};

/// Speed level of the separated single-bin scenario
pub const SEPARATED_LEVEL: f64 = 2.0;

/// Levels of the borrowing scenario
pub const BORROWING_LEVELS: [f64; 5] = [0.5, 1.0, 1.5, 2.0, 2.5];

/// Conflicts per bin in the borrowing scenario: bins 0, 2 and 3 fall at or
/// below the five-sample cutoff
pub const BORROWING_CONFLICTS: [usize; 5] = [2, 20, 5, 0, 30];

/// Observations per bin in the borrowing scenario
pub const BORROWING_POPULATION: usize = 300;

/// One bin: 900 spacings around 50 and 100 labeled conflicts around 10
pub fn separated_observations(seed: u64) -> (Vec<Observation>, SpeedLevels, Vec<ConflictDefinition>) {
    let observations = separated_bin(SEPARATED_LEVEL, 900, 100, seed).unwrap();
    let levels = SpeedLevels::new([SEPARATED_LEVEL]).unwrap();
    (observations, levels, ConflictDefinition::from_names(&["conflict"]))
}

/// Five bins whose conflict counts follow [`BORROWING_CONFLICTS`]
pub fn borrowing_observations() -> (Vec<Observation>, SpeedLevels, Vec<ConflictDefinition>) {
    let mut observations = Vec::new();
    for (&level, &conflicts) in BORROWING_LEVELS.iter().zip(&BORROWING_CONFLICTS) {
        for k in 0..BORROWING_POPULATION {
            let is_conflict = k < conflicts;
            let spacing = if is_conflict {
                3.0 + k as f64 * 0.25
            } else {
                25.0 + (k % 40) as f64 + level
            };
            observations.push(Observation::new(spacing, level, 15.0).with_labels([is_conflict]));
        }
    }
    let levels = SpeedLevels::new(BORROWING_LEVELS).unwrap();
    (observations, levels, ConflictDefinition::from_names(&["conflict"]))
}

/// Rule-labeled synthetic car-following data
pub fn labeled_synthetic(num_pairs: usize, seed: u64) -> (Vec<Observation>, Vec<ConflictDefinition>) {
    generate_labeled(&SyntheticConfig::default().with_num_pairs(num_pairs), seed).unwrap()
}

/// Scratch directory removed when dropped
pub fn scratch_dir() -> TempDir {
    TempDir::new().unwrap()
}

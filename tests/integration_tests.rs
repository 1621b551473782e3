//! End-to-end tests of the inference pipeline
//!
//! Scenarios are seeded, so every run sees the same samples.

mod helpers;

use helpers::assertions::{assert_rows_well_formed, assert_scalar_close};
use helpers::fixtures::{
    borrowing_observations, labeled_synthetic, separated_observations, BORROWING_POPULATION,
    SEPARATED_LEVEL,
};
use spacing_thresholds::{
    derive_levels, BinningConfig, DebugReporter, InferenceConfig, InferenceError, SpacingPipeline,
};

//=============================================================================
// Separated single-bin scenario
//=============================================================================

#[test]
fn test_separated_threshold_between_regimes() {
    let (observations, levels, definitions) = separated_observations(42);
    let mut pipeline = SpacingPipeline::new(InferenceConfig::default()).with_curves(true);
    let output = pipeline.run(&observations, &levels, &definitions).unwrap();

    assert!(output.is_complete());
    assert_eq!(output.table.len(), 19);
    assert_rows_well_formed(&output.table);

    let row = output
        .table
        .lookup("conflict", SEPARATED_LEVEL, 0.5)
        .expect("alpha 0.5 row");
    assert!(
        row.threshold >= 15.0 && row.threshold <= 45.0,
        "threshold = {}",
        row.threshold
    );
    assert_scalar_close(row.conflict_rate, 0.1, 1e-12, "conflict_rate");

    // Curves at the chosen threshold
    let curves = &output.curves[0].curves;
    let k = curves
        .candidates
        .iter()
        .position(|&t| t == row.threshold)
        .expect("threshold on the grid");
    assert!(curves.missed_detection[k] < 0.3, "pma = {}", curves.missed_detection[k]);
    assert!(curves.false_alarm[k] < 0.3, "pfa = {}", curves.false_alarm[k]);
}

#[test]
fn test_threshold_grows_with_alpha() {
    let (observations, levels, definitions) = separated_observations(7);
    let output = spacing_thresholds::run_pipeline(&observations, &levels, &definitions).unwrap();
    let rows: Vec<_> = output.table.for_definition("conflict").collect();
    assert_eq!(rows.len(), 19);
    for pair in rows.windows(2) {
        assert!(pair[0].alpha < pair[1].alpha);
        assert!(
            pair[0].threshold <= pair[1].threshold,
            "alpha {} -> {}, alpha {} -> {}",
            pair[0].alpha,
            pair[0].threshold,
            pair[1].alpha,
            pair[1].threshold
        );
    }
    // The upper bound sits at the baseline peak, near the normal regime
    assert!(rows[0].upper_bound > 40.0 && rows[0].upper_bound < 60.0);
}

#[test]
fn test_custom_alpha_grid() {
    let (observations, levels, definitions) = separated_observations(42);
    let config = InferenceConfig::default().with_alphas(0.25, 0.25, 3);
    let mut pipeline = SpacingPipeline::new(config);
    let output = pipeline.run(&observations, &levels, &definitions).unwrap();
    let alphas: Vec<f64> = output.table.rows.iter().map(|r| r.alpha).collect();
    assert_eq!(alphas, vec![0.25, 0.5, 0.75]);
}

//=============================================================================
// Borrowing
//=============================================================================

#[test]
fn test_borrowing_follows_index_distance() {
    let (observations, levels, definitions) = borrowing_observations();
    let mut pipeline =
        SpacingPipeline::new(InferenceConfig::default()).with_reporter(DebugReporter::new());
    let output = pipeline.run(&observations, &levels, &definitions).unwrap();

    let borrows: Vec<(usize, usize)> = pipeline
        .reporter()
        .borrow_events()
        .iter()
        .map(|e| (e.bin, e.source_bin))
        .collect();
    assert_eq!(borrows, vec![(0, 1), (2, 1), (3, 4)]);

    let missing: Vec<usize> = pipeline
        .reporter()
        .missing_events()
        .iter()
        .map(|e| e.count)
        .collect();
    assert_eq!(missing, vec![2, 5, 0]);

    // Five bins, each with its own rows
    assert_eq!(output.table.len(), 5 * 19);
    assert_rows_well_formed(&output.table);
}

#[test]
fn test_borrowed_bins_take_minimum_rate() {
    let (observations, levels, definitions) = borrowing_observations();
    let output = spacing_thresholds::run_pipeline(&observations, &levels, &definitions).unwrap();
    let floor = 20.0 / BORROWING_POPULATION as f64;

    for (level, expected) in [
        (0.5, floor),
        (1.0, floor),
        (1.5, floor),
        (2.0, floor),
        (2.5, 30.0 / BORROWING_POPULATION as f64),
    ] {
        let row = output.table.lookup("conflict", level, 0.05).unwrap();
        assert_scalar_close(row.conflict_rate, expected, 1e-12, &format!("rate at {}", level));
    }
}

#[test]
fn test_all_bins_missing_fails_definition_only() {
    let (mut observations, levels, _) = borrowing_observations();
    // Second label column with no conflicts anywhere
    for obs in &mut observations {
        let first = obs.labels[0];
        obs.labels = [first, false].into_iter().collect();
    }
    let definitions = spacing_thresholds::ConflictDefinition::from_names(&["conflict", "never"]);

    let mut pipeline =
        SpacingPipeline::new(InferenceConfig::default()).with_reporter(DebugReporter::new());
    let output = pipeline.run(&observations, &levels, &definitions).unwrap();

    assert_eq!(output.table.definitions(), vec!["conflict"]);
    assert_eq!(output.failures.len(), 1);
    assert!(matches!(
        output.failures[0].error,
        InferenceError::NoConflictSource { num_bins: 5, .. }
    ));
    assert_eq!(pipeline.reporter().failure_events()[0].0, "never");
}

//=============================================================================
// Rule-labeled synthetic data
//=============================================================================

#[test]
fn test_labeled_synthetic_run_is_idempotent() {
    let (observations, definitions) = labeled_synthetic(3000, 11);
    let derived = derive_levels(&observations, &BinningConfig::new(500)).unwrap();

    let first = spacing_thresholds::run_pipeline(&observations, &derived.levels, &definitions).unwrap();
    let second = spacing_thresholds::run_pipeline(&observations, &derived.levels, &definitions).unwrap();

    assert_eq!(first.table, second.table);
    assert_eq!(first.populations, second.populations);
    assert_eq!(
        first.populations.iter().sum::<usize>(),
        observations.len()
    );
    let completed = definitions.len() - first.failures.len();
    assert_eq!(first.table.len(), derived.levels.len() * 19 * completed);
    assert!(completed > 0);
    assert_rows_well_formed(&first.table);
}

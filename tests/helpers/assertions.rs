//! Assertion helpers with explicit tolerances

use spacing_thresholds::ThresholdTable;

/// Compare scalar values with tolerance
pub fn assert_scalar_close(actual: f64, expected: f64, tolerance: f64, field_name: &str) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= tolerance,
        "{}: expected {}, got {} (diff: {}, tolerance: {})",
        field_name,
        expected,
        actual,
        diff,
        tolerance
    );
}

/// Every row keeps its threshold inside `[0, upper_bound)` and its masses
/// and rate inside `[0, 1]`
pub fn assert_rows_well_formed(table: &ThresholdTable) {
    for (i, row) in table.rows.iter().enumerate() {
        assert!(
            row.threshold >= 0.0 && row.threshold < row.upper_bound,
            "row {}: threshold {} outside [0, {})",
            i,
            row.threshold,
            row.upper_bound
        );
        for (name, value) in [
            ("cumulative_baseline_mass", row.cumulative_baseline_mass),
            ("cumulative_conflict_mass", row.cumulative_conflict_mass),
            ("conflict_rate", row.conflict_rate),
        ] {
            assert!(
                (0.0..=1.0 + 1e-12).contains(&value),
                "row {}: {} = {} outside [0, 1]",
                i,
                name,
                value
            );
        }
    }
}

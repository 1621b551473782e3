//! File-based table handling

mod helpers;

use std::fs;

use helpers::fixtures::{scratch_dir, separated_observations};
use spacing_thresholds::io::{
    read_observations_path, read_speed_levels_path, write_curves_path, write_thresholds_path,
    THRESHOLD_COLUMNS,
};
use spacing_thresholds::{InferenceConfig, SpacingPipeline};

#[test]
fn test_tables_through_files() {
    let dir = scratch_dir();
    let (observations, _, _) = separated_observations(3);

    let obs_path = dir.path().join("observations.csv");
    let mut text = String::from("spacing,relative_speed,absolute_speed,conflict_a\n");
    for o in &observations {
        text.push_str(&format!(
            "{},{},{},{}\n",
            o.spacing, o.relative_speed, o.absolute_speed, o.labels[0]
        ));
    }
    fs::write(&obs_path, text).unwrap();

    let levels_path = dir.path().join("levels.csv");
    fs::write(&levels_path, "speed_level\n2.0\n").unwrap();

    let table = read_observations_path(&obs_path).unwrap();
    let levels = read_speed_levels_path(&levels_path).unwrap();
    assert_eq!(table.observations, observations);

    let definitions = table.select::<&str>(&[]).unwrap();
    let mut pipeline = SpacingPipeline::new(InferenceConfig::default()).with_curves(true);
    let output = pipeline.run(&table.observations, &levels, &definitions).unwrap();

    let out_path = dir.path().join("thresholds.csv");
    let curves_path = dir.path().join("curves.csv");
    write_thresholds_path(&out_path, &output.table).unwrap();
    write_curves_path(&curves_path, &output.curves).unwrap();

    let written = fs::read_to_string(&out_path).unwrap();
    let mut lines = written.lines();
    assert_eq!(lines.next(), Some(THRESHOLD_COLUMNS.join(",").as_str()));
    assert_eq!(lines.count(), 19);
    assert!(written.lines().skip(1).all(|l| l.ends_with(",conflict_a")));

    let curves = fs::read_to_string(&curves_path).unwrap();
    assert_eq!(curves.lines().count(), 1 + output.curves[0].curves.len());
}

#[test]
fn test_scratch_dir_removed_on_drop() {
    let dir = scratch_dir();
    let root = dir.path().to_path_buf();
    let levels_path = root.join("levels.csv");
    fs::write(&levels_path, "speed_level\n1.0\n").unwrap();
    assert_eq!(read_speed_levels_path(&levels_path).unwrap().len(), 1);

    drop(dir);
    assert!(!root.exists());
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = scratch_dir();
    let err = read_observations_path(dir.path().join("does_not_exist.csv")).unwrap_err();
    assert!(matches!(err, spacing_thresholds::InputError::Io { .. }));
}

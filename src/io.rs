//! CSV input and output tables
//!
//! Observation tables need `spacing`, `relative_speed` and `absolute_speed`
//! columns; every column whose header starts with `conflict` is a label
//! column. Level tables need a `speed_level` column. Extra columns are
//! ignored.

use std::fs::File;
use std::io;
use std::path::Path;

use serde::Serialize;

use crate::binning::SpeedLevels;
use crate::errors::{InferenceError, InputError};
use crate::pipeline::BinCurves;
use crate::types::{ConflictDefinition, Observation, ThresholdTable};

/// Header prefix of label columns
pub const CONFLICT_COLUMN_PREFIX: &str = "conflict";

/// Column order of the threshold table
pub const THRESHOLD_COLUMNS: [&str; 8] = [
    "speed_level",
    "alpha",
    "threshold",
    "upper_bound",
    "cumulative_baseline_mass",
    "cumulative_conflict_mass",
    "conflict_rate",
    "conflict_definition",
];

const CURVE_COLUMNS: [&str; 5] = [
    "conflict_definition",
    "speed_level",
    "threshold",
    "missed_detection",
    "false_alarm",
];

/// Observations with the label columns found in the file
#[derive(Debug, Clone, Default)]
pub struct ObservationTable {
    /// Rows in file order
    pub observations: Vec<Observation>,
    /// One definition per label column, in header order
    pub definitions: Vec<ConflictDefinition>,
}

impl ObservationTable {
    /// Definitions matching `names`, in the requested order.
    ///
    /// An empty request selects every label column.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<ConflictDefinition>, InferenceError> {
        if names.is_empty() {
            return Ok(self.definitions.clone());
        }
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.definitions
                    .iter()
                    .find(|d| d.name == name)
                    .cloned()
                    .ok_or_else(|| InferenceError::UnknownDefinition {
                        name: name.to_string(),
                    })
            })
            .collect()
    }
}

// ============================================================================
// Readers
// ============================================================================

/// Read an observation table.
pub fn read_observations<R: io::Read>(reader: R) -> Result<ObservationTable, InputError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();

    let spacing = column_index(&headers, "spacing")?;
    let relative_speed = column_index(&headers, "relative_speed")?;
    let absolute_speed = column_index(&headers, "absolute_speed")?;
    let label_columns: Vec<(usize, &str)> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| h.starts_with(CONFLICT_COLUMN_PREFIX))
        .collect();

    let mut observations = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        let labels = label_columns
            .iter()
            .map(|&(idx, name)| parse_bool(&record, idx, row, name))
            .collect::<Result<Vec<bool>, _>>()?;
        observations.push(
            Observation::new(
                parse_f64(&record, spacing, row, "spacing")?,
                parse_f64(&record, relative_speed, row, "relative_speed")?,
                parse_f64(&record, absolute_speed, row, "absolute_speed")?,
            )
            .with_labels(labels),
        );
    }

    let names: Vec<&str> = label_columns.iter().map(|&(_, name)| name).collect();
    Ok(ObservationTable {
        observations,
        definitions: ConflictDefinition::from_names(&names),
    })
}

/// Read an observation table from a file.
pub fn read_observations_path<P: AsRef<Path>>(path: P) -> Result<ObservationTable, InputError> {
    read_observations(File::open(path)?)
}

/// Read representative speed levels from the `speed_level` column.
pub fn read_speed_levels<R: io::Read>(reader: R) -> Result<SpeedLevels, InferenceError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers().map_err(InputError::from)?.clone();
    let column = column_index(&headers, "speed_level")?;

    let mut values = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record.map_err(InputError::from)?;
        values.push(parse_f64(&record, column, row, "speed_level")?);
    }
    SpeedLevels::new(values)
}

/// Read representative speed levels from a file.
pub fn read_speed_levels_path<P: AsRef<Path>>(path: P) -> Result<SpeedLevels, InferenceError> {
    let file = File::open(path).map_err(InputError::from)?;
    read_speed_levels(file)
}

// ============================================================================
// Writers
// ============================================================================

/// Write the threshold table, header included even when empty.
pub fn write_thresholds<W: io::Write>(writer: W, table: &ThresholdTable) -> Result<(), InputError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(THRESHOLD_COLUMNS)?;
    for row in &table.rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the threshold table to a file.
pub fn write_thresholds_path<P: AsRef<Path>>(path: P, table: &ThresholdTable) -> Result<(), InputError> {
    write_thresholds(File::create(path)?, table)
}

#[derive(Serialize)]
struct CurveRecord<'a> {
    conflict_definition: &'a str,
    speed_level: f64,
    threshold: f64,
    missed_detection: f64,
    false_alarm: f64,
}

/// Write per-bin diagnostic curves in long format, one row per candidate.
pub fn write_curves<W: io::Write>(writer: W, curves: &[BinCurves]) -> Result<(), InputError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(CURVE_COLUMNS)?;
    for bin in curves {
        let c = &bin.curves;
        for k in 0..c.len() {
            wtr.serialize(CurveRecord {
                conflict_definition: &bin.definition,
                speed_level: bin.speed_level,
                threshold: c.candidates[k],
                missed_detection: c.missed_detection[k],
                false_alarm: c.false_alarm[k],
            })?;
        }
    }
    wtr.flush()?;
    Ok(())
}

/// Write per-bin diagnostic curves to a file.
pub fn write_curves_path<P: AsRef<Path>>(path: P, curves: &[BinCurves]) -> Result<(), InputError> {
    write_curves(File::create(path)?, curves)
}

// ============================================================================
// Cell parsing
// ============================================================================

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize, InputError> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| InputError::MissingColumn {
            column: name.to_string(),
        })
}

fn cell<'r>(record: &'r csv::StringRecord, idx: usize, row: usize, column: &str) -> Result<&'r str, InputError> {
    record.get(idx).ok_or_else(|| InputError::InvalidValue {
        row,
        column: column.to_string(),
        value: String::new(),
    })
}

fn parse_f64(record: &csv::StringRecord, idx: usize, row: usize, column: &str) -> Result<f64, InputError> {
    let raw = cell(record, idx, row, column)?;
    let value: f64 = raw.parse().map_err(|_| InputError::InvalidValue {
        row,
        column: column.to_string(),
        value: raw.to_string(),
    })?;
    if !value.is_finite() {
        return Err(InputError::NonFinite {
            row,
            column: column.to_string(),
        });
    }
    Ok(value)
}

fn parse_bool(record: &csv::StringRecord, idx: usize, row: usize, column: &str) -> Result<bool, InputError> {
    let raw = cell(record, idx, row, column)?;
    match raw.to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "1.0" => Ok(true),
        "false" | "f" | "0" | "0.0" => Ok(false),
        _ => Err(InputError::InvalidValue {
            row,
            column: column.to_string(),
            value: raw.to_string(),
        }),
    }
}

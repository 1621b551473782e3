//! Error types for spacing inference and input handling
//!
//! Every fallible stage returns one of these instead of panicking.

use std::fmt;

/// Errors that can occur while inferring spacing thresholds
#[derive(Debug, Clone)]
pub enum InferenceError {
    /// A density could not be fit to a sample (too few points or zero spread)
    DegenerateSample {
        /// Which sample failed (e.g. "baseline at level 2.5")
        context: String,
        /// Number of points in the sample
        size: usize,
    },

    /// Every speed bin lacked enough conflicts for a definition, so no bin
    /// can lend its density to the others
    NoConflictSource {
        /// Conflict definition name
        definition: String,
        /// Number of speed bins inspected
        num_bins: usize,
    },

    /// The candidate-threshold grid is empty
    EmptyCandidateGrid {
        /// Upper integration bound that produced the empty grid
        upper_bound: f64,
    },

    /// No representative speed levels were supplied or derived
    EmptySpeedLevels,

    /// A conflict definition was requested that the data does not carry
    UnknownDefinition {
        /// Requested name
        name: String,
    },

    /// Configuration error
    Configuration {
        /// Description of the configuration issue
        description: String,
    },

    /// Malformed input table
    Input(InputError),
}

impl fmt::Display for InferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InferenceError::DegenerateSample { context, size } => {
                write!(
                    f,
                    "Cannot fit density for {}: degenerate sample of {} points",
                    context, size
                )
            }
            InferenceError::NoConflictSource {
                definition,
                num_bins,
            } => {
                write!(
                    f,
                    "No speed bin has enough '{}' conflicts to fit a density ({} bins inspected)",
                    definition, num_bins
                )
            }
            InferenceError::EmptyCandidateGrid { upper_bound } => {
                write!(
                    f,
                    "Candidate threshold grid is empty (upper bound {:.3})",
                    upper_bound
                )
            }
            InferenceError::EmptySpeedLevels => write!(f, "No representative speed levels"),
            InferenceError::UnknownDefinition { name } => {
                write!(f, "Unknown conflict definition: {}", name)
            }
            InferenceError::Configuration { description } => {
                write!(f, "Configuration error: {}", description)
            }
            InferenceError::Input(e) => write!(f, "Malformed input: {}", e),
        }
    }
}

impl std::error::Error for InferenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InferenceError::Input(e) => Some(e),
            _ => None,
        }
    }
}

impl From<InputError> for InferenceError {
    fn from(e: InputError) -> Self {
        InferenceError::Input(e)
    }
}

/// Errors raised while reading or writing tabular data
#[derive(Debug, Clone)]
pub enum InputError {
    /// A required column is absent
    MissingColumn {
        /// Column name
        column: String,
    },

    /// A cell could not be parsed
    InvalidValue {
        /// Zero-based data row (header excluded)
        row: usize,
        /// Column name
        column: String,
        /// Raw cell content
        value: String,
    },

    /// A numeric cell parsed to NaN or infinity
    NonFinite {
        /// Zero-based data row
        row: usize,
        /// Column name
        column: String,
    },

    /// Underlying CSV or filesystem failure
    Io {
        /// Description of the failure
        description: String,
    },
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::MissingColumn { column } => {
                write!(f, "missing required column '{}'", column)
            }
            InputError::InvalidValue { row, column, value } => {
                write!(
                    f,
                    "row {}: cannot parse '{}' in column '{}'",
                    row, value, column
                )
            }
            InputError::NonFinite { row, column } => {
                write!(f, "row {}: non-finite value in column '{}'", row, column)
            }
            InputError::Io { description } => write!(f, "I/O failure: {}", description),
        }
    }
}

impl std::error::Error for InputError {}

impl From<csv::Error> for InputError {
    fn from(e: csv::Error) -> Self {
        InputError::Io {
            description: e.to_string(),
        }
    }
}

impl From<std::io::Error> for InputError {
    fn from(e: std::io::Error) -> Self {
        InputError::Io {
            description: e.to_string(),
        }
    }
}

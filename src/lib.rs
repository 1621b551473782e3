/*!
# spacing-thresholds - probability-based car-following conflict thresholds

Infers, for each representative relative (closing) speed, the following
distance below which a car-following state should be treated as a conflict.

For every speed bin the crate fits two kernel density estimates over spacing,
one on all observations of the bin (baseline) and one on the observations
labeled as conflicts (conflict). A grid search then trades missed detections
against false alarms and reports one threshold per weighting coefficient.

## Modules

- [`binning`] - representative speed levels, quantization, per-level bins
- [`density`] - Gaussian KDE, per-bin fits, borrowing for sparse bins
- [`solver`] - missed-detection / false-alarm curves and threshold selection
- [`labeling`] - rule-based conflict labels
- [`pipeline`] - the end-to-end run with per-definition failure isolation
- [`io`] - CSV tables in and out
- [`synthetic`] - reproducible car-following samples
- [`reporter`] - observability hooks

## Example

```rust
use spacing_thresholds::{run_pipeline, synthetic, SpeedLevels};

let bin = synthetic::separated_bin(2.0, 900, 100, 42).unwrap();
let levels = SpeedLevels::new([2.0]).unwrap();
let definitions = spacing_thresholds::ConflictDefinition::from_names(&["conflict"]);

let output = run_pipeline(&bin, &levels, &definitions).unwrap();
assert_eq!(output.table.len(), 19);
```
*/

// ============================================================================
// Core modules
// ============================================================================

/// Speed levels, quantization and bin assignment
pub mod binning;

/// Numerical constants, grids and bin-level mapping
pub mod common;

/// Run configuration
pub mod config;

/// Kernel density estimation and per-bin fits
pub mod density;

/// Error types
pub mod errors;

/// CSV input and output
pub mod io;

/// Rule-based conflict labeling
pub mod labeling;

/// End-to-end inference pipeline
pub mod pipeline;

/// Observability hooks
pub mod reporter;

/// Threshold solving
pub mod solver;

/// Synthetic data generation
pub mod synthetic;

/// Observation and output types
pub mod types;

// ============================================================================
// Re-exports for convenience
// ============================================================================

// Core types
pub use types::{
    CarFollowingState, ConflictDefinition, ConflictLabels, Observation, ThresholdRow,
    ThresholdTable,
};

// Configuration
pub use config::{BinningConfig, InferenceConfig};

// Errors
pub use errors::{InferenceError, InputError};

// Stages
pub use binning::{assign_bins, derive_levels, DerivedLevels, LevelDerivation, SpeedBin, SpeedLevels};
pub use density::{GaussianKde, SpacingDensity};
pub use solver::{solve_threshold, SolvedThreshold, ThresholdCurves, ThresholdSolver};

// Pipeline
pub use pipeline::{run_pipeline, BinCurves, DefinitionFailure, PipelineOutput, SpacingPipeline};

// Reporters
pub use reporter::{CompositeReporter, DebugReporter, InferenceReporter, LoggingReporter, NoOpReporter};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

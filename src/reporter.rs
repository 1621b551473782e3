//! Observability for spacing-threshold inference.
//!
//! The [`InferenceReporter`] trait receives callbacks at key points of a
//! pipeline run: input filtering, per-bin density fits, density borrowing,
//! per-bin solves, and per-definition failures. Reporters keep diagnostics
//! out of the numerical code.
//!
//! The default [`NoOpReporter`] has empty callbacks that compile away.
//!
//! # Example
//!
//! ```
//! use spacing_thresholds::reporter::{DebugReporter, InferenceReporter};
//!
//! let mut reporter = DebugReporter::new();
//! reporter.on_conflict_missing("conflict_1", 0, 0.5, 2);
//! reporter.on_density_borrowed("conflict_1", 0, 1);
//!
//! assert_eq!(reporter.missing_events().len(), 1);
//! assert_eq!(reporter.borrow_events()[0].source_bin, 1);
//! ```

use crate::errors::InferenceError;
use crate::solver::SolvedThreshold;

// ============================================================================
// InferenceReporter Trait
// ============================================================================

/// Observability trait for pipeline execution.
///
/// All methods have empty default implementations, so implementors override
/// only the events they care about. Callbacks take `&mut self`; the pipeline
/// delivers them from a single thread even when bins are solved in parallel.
pub trait InferenceReporter {
    /// Called once after non-closing observations are dropped.
    fn on_observations_filtered(&mut self, _kept: usize, _dropped: usize) {}

    /// Called after the baseline density of a bin is fitted.
    fn on_baseline_fit(&mut self, _bin: usize, _level: f64, _population: usize) {}

    /// Called after a conflict density is fitted on a bin's own conflicts.
    fn on_conflict_fit(&mut self, _definition: &str, _bin: usize, _level: f64, _count: usize) {}

    /// Called when a bin has too few conflicts to fit a density.
    fn on_conflict_missing(&mut self, _definition: &str, _bin: usize, _level: f64, _count: usize) {}

    /// Called when a missing bin takes the density of `source_bin`.
    fn on_density_borrowed(&mut self, _definition: &str, _bin: usize, _source_bin: usize) {}

    /// Called after the thresholds of one (bin, definition) pair are solved.
    fn on_bin_solved(&mut self, _definition: &str, _level: f64, _thresholds: &[SolvedThreshold]) {}

    /// Called when a definition is abandoned; other definitions continue.
    fn on_definition_failed(&mut self, _definition: &str, _error: &InferenceError) {}
}

// ============================================================================
// NoOpReporter
// ============================================================================

/// Reporter that does nothing; the default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpReporter;

impl NoOpReporter {
    /// Create a new no-op reporter.
    pub fn new() -> Self {
        Self
    }
}

impl InferenceReporter for NoOpReporter {}

// ============================================================================
// DebugReporter
// ============================================================================

/// A captured conflict-fit or missing-bin event
#[derive(Debug, Clone, PartialEq)]
pub struct ConflictEvent {
    /// Conflict definition name
    pub definition: String,
    /// Bin index
    pub bin: usize,
    /// Speed level of the bin
    pub level: f64,
    /// Conflicts observed in the bin
    pub count: usize,
}

/// A captured borrowing event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorrowEvent {
    /// Conflict definition name
    pub definition: String,
    /// Borrowing bin
    pub bin: usize,
    /// Lending bin
    pub source_bin: usize,
}

/// Reporter that stores every event for post-hoc inspection.
///
/// Mostly useful in tests: borrowing decisions and failures become plain
/// data.
#[derive(Debug, Clone, Default)]
pub struct DebugReporter {
    filtered: Vec<(usize, usize)>,
    baselines: Vec<(usize, f64, usize)>,
    conflict_fits: Vec<ConflictEvent>,
    missing: Vec<ConflictEvent>,
    borrows: Vec<BorrowEvent>,
    solved: Vec<(String, f64, Vec<SolvedThreshold>)>,
    failures: Vec<(String, String)>,
}

impl DebugReporter {
    /// Create a new debug reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all captured events.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// `(kept, dropped)` filter events.
    pub fn filter_events(&self) -> &[(usize, usize)] {
        &self.filtered
    }

    /// `(bin, level, population)` baseline events.
    pub fn baseline_events(&self) -> &[(usize, f64, usize)] {
        &self.baselines
    }

    /// Conflict densities fitted on a bin's own data.
    pub fn conflict_fit_events(&self) -> &[ConflictEvent] {
        &self.conflict_fits
    }

    /// Bins marked missing.
    pub fn missing_events(&self) -> &[ConflictEvent] {
        &self.missing
    }

    /// Borrowing decisions.
    pub fn borrow_events(&self) -> &[BorrowEvent] {
        &self.borrows
    }

    /// `(definition, level, thresholds)` solve events.
    pub fn solved_events(&self) -> &[(String, f64, Vec<SolvedThreshold>)] {
        &self.solved
    }

    /// `(definition, error message)` failure events.
    pub fn failure_events(&self) -> &[(String, String)] {
        &self.failures
    }

    /// Total number of captured events across all types.
    pub fn total_events(&self) -> usize {
        self.filtered.len()
            + self.baselines.len()
            + self.conflict_fits.len()
            + self.missing.len()
            + self.borrows.len()
            + self.solved.len()
            + self.failures.len()
    }
}

impl InferenceReporter for DebugReporter {
    fn on_observations_filtered(&mut self, kept: usize, dropped: usize) {
        self.filtered.push((kept, dropped));
    }

    fn on_baseline_fit(&mut self, bin: usize, level: f64, population: usize) {
        self.baselines.push((bin, level, population));
    }

    fn on_conflict_fit(&mut self, definition: &str, bin: usize, level: f64, count: usize) {
        self.conflict_fits.push(ConflictEvent {
            definition: definition.to_string(),
            bin,
            level,
            count,
        });
    }

    fn on_conflict_missing(&mut self, definition: &str, bin: usize, level: f64, count: usize) {
        self.missing.push(ConflictEvent {
            definition: definition.to_string(),
            bin,
            level,
            count,
        });
    }

    fn on_density_borrowed(&mut self, definition: &str, bin: usize, source_bin: usize) {
        self.borrows.push(BorrowEvent {
            definition: definition.to_string(),
            bin,
            source_bin,
        });
    }

    fn on_bin_solved(&mut self, definition: &str, level: f64, thresholds: &[SolvedThreshold]) {
        self.solved
            .push((definition.to_string(), level, thresholds.to_vec()));
    }

    fn on_definition_failed(&mut self, definition: &str, error: &InferenceError) {
        self.failures
            .push((definition.to_string(), error.to_string()));
    }
}

// ============================================================================
// LoggingReporter
// ============================================================================

/// Reporter that emits events through the `log` facade.
///
/// - filtering, borrowing: INFO
/// - per-bin fits and solves: DEBUG (solves only when verbose)
/// - missing bins, failed definitions: WARN
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingReporter {
    verbose: bool,
}

impl LoggingReporter {
    /// Create a new logging reporter.
    pub fn new() -> Self {
        Self { verbose: false }
    }

    /// Create a logging reporter that also logs every solved threshold.
    pub fn verbose() -> Self {
        Self { verbose: true }
    }
}

impl InferenceReporter for LoggingReporter {
    fn on_observations_filtered(&mut self, kept: usize, dropped: usize) {
        if dropped > 0 {
            log::info!(
                "Kept {} closing observations, dropped {} with non-positive spacing or relative speed",
                kept,
                dropped
            );
        } else {
            log::info!("Kept {} closing observations", kept);
        }
    }

    fn on_baseline_fit(&mut self, bin: usize, level: f64, population: usize) {
        log::debug!("Baseline bin {} (v = {}): {} observations", bin, level, population);
    }

    fn on_conflict_fit(&mut self, definition: &str, bin: usize, level: f64, count: usize) {
        log::debug!("{}: bin {} (v = {}) fitted on {} conflicts", definition, bin, level, count);
    }

    fn on_conflict_missing(&mut self, definition: &str, bin: usize, level: f64, count: usize) {
        log::warn!(
            "{}: bin {} (v = {}) has only {} conflicts, density will be borrowed",
            definition,
            bin,
            level,
            count
        );
    }

    fn on_density_borrowed(&mut self, definition: &str, bin: usize, source_bin: usize) {
        log::info!("{}: bin {} borrows conflict density of bin {}", definition, bin, source_bin);
    }

    fn on_bin_solved(&mut self, definition: &str, level: f64, thresholds: &[SolvedThreshold]) {
        if self.verbose {
            for t in thresholds {
                log::debug!(
                    "{}: v = {}, alpha = {:.2} -> threshold {:.1} (upper bound {:.1})",
                    definition,
                    level,
                    t.alpha,
                    t.threshold,
                    t.upper_bound
                );
            }
        }
    }

    fn on_definition_failed(&mut self, definition: &str, error: &InferenceError) {
        log::warn!("{}: abandoned: {}", definition, error);
    }
}

// ============================================================================
// CompositeReporter
// ============================================================================

/// Reporter that forwards every event to two reporters.
///
/// Nest composites to fan out to more.
#[derive(Debug, Clone, Default)]
pub struct CompositeReporter<A, B> {
    first: A,
    second: B,
}

impl<A: InferenceReporter, B: InferenceReporter> CompositeReporter<A, B> {
    /// Combine two reporters.
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    /// First reporter.
    pub fn first(&self) -> &A {
        &self.first
    }

    /// Second reporter.
    pub fn second(&self) -> &B {
        &self.second
    }

    /// Split into the two reporters.
    pub fn into_parts(self) -> (A, B) {
        (self.first, self.second)
    }
}

impl<A: InferenceReporter, B: InferenceReporter> InferenceReporter for CompositeReporter<A, B> {
    fn on_observations_filtered(&mut self, kept: usize, dropped: usize) {
        self.first.on_observations_filtered(kept, dropped);
        self.second.on_observations_filtered(kept, dropped);
    }

    fn on_baseline_fit(&mut self, bin: usize, level: f64, population: usize) {
        self.first.on_baseline_fit(bin, level, population);
        self.second.on_baseline_fit(bin, level, population);
    }

    fn on_conflict_fit(&mut self, definition: &str, bin: usize, level: f64, count: usize) {
        self.first.on_conflict_fit(definition, bin, level, count);
        self.second.on_conflict_fit(definition, bin, level, count);
    }

    fn on_conflict_missing(&mut self, definition: &str, bin: usize, level: f64, count: usize) {
        self.first.on_conflict_missing(definition, bin, level, count);
        self.second.on_conflict_missing(definition, bin, level, count);
    }

    fn on_density_borrowed(&mut self, definition: &str, bin: usize, source_bin: usize) {
        self.first.on_density_borrowed(definition, bin, source_bin);
        self.second.on_density_borrowed(definition, bin, source_bin);
    }

    fn on_bin_solved(&mut self, definition: &str, level: f64, thresholds: &[SolvedThreshold]) {
        self.first.on_bin_solved(definition, level, thresholds);
        self.second.on_bin_solved(definition, level, thresholds);
    }

    fn on_definition_failed(&mut self, definition: &str, error: &InferenceError) {
        self.first.on_definition_failed(definition, error);
        self.second.on_definition_failed(definition, error);
    }
}

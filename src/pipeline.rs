//! End-to-end inference: observations and speed levels in, threshold table out
//!
//! A run validates the input, drops non-closing observations, groups the rest
//! into speed bins, fits one baseline density per bin, and then processes
//! each conflict definition independently: conflict fits, borrowing, rate
//! normalization and threshold solving. A failing definition is recorded in
//! [`PipelineOutput::failures`] without touching the rows of the others.

use std::borrow::Cow;

use crate::binning::{assign_bins, SpeedBin, SpeedLevels};
use crate::common::parallel::map_ordered;
use crate::config::InferenceConfig;
use crate::density::{borrow_missing, fit_baseline, fit_conflict, BaselineFit, ConflictFit};
use crate::errors::{InferenceError, InputError};
use crate::reporter::{InferenceReporter, NoOpReporter};
use crate::solver::{ThresholdCurves, ThresholdSolver};
use crate::types::{ConflictDefinition, Observation, ThresholdRow, ThresholdTable};

/// Diagnostic curves of one (definition, bin) pair
#[derive(Debug, Clone)]
pub struct BinCurves {
    /// Conflict definition name
    pub definition: String,
    /// Speed level of the bin
    pub speed_level: f64,
    /// Candidate grid with missed-detection and false-alarm curves
    pub curves: ThresholdCurves,
}

/// A conflict definition abandoned during a run
#[derive(Debug, Clone)]
pub struct DefinitionFailure {
    /// Conflict definition name
    pub definition: String,
    /// Cause
    pub error: InferenceError,
}

/// Result of a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineOutput {
    /// Rows of every definition that completed
    pub table: ThresholdTable,
    /// Per-bin curves (only when requested with [`SpacingPipeline::with_curves`])
    pub curves: Vec<BinCurves>,
    /// Definitions that could not be completed
    pub failures: Vec<DefinitionFailure>,
    /// Observation count per bin, in level order
    pub populations: Vec<usize>,
    /// Observations dropped for non-positive spacing or relative speed
    pub dropped: usize,
}

impl PipelineOutput {
    /// Whether every definition produced rows
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Spacing-threshold inference pipeline
///
/// # Example
///
/// ```
/// use spacing_thresholds::pipeline::SpacingPipeline;
/// use spacing_thresholds::reporter::DebugReporter;
/// use spacing_thresholds::InferenceConfig;
///
/// let pipeline = SpacingPipeline::new(InferenceConfig::default())
///     .with_reporter(DebugReporter::new())
///     .with_curves(true);
/// assert!(pipeline.reporter().filter_events().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct SpacingPipeline<R: InferenceReporter = NoOpReporter> {
    config: InferenceConfig,
    solver: ThresholdSolver,
    keep_curves: bool,
    reporter: R,
}

impl SpacingPipeline<NoOpReporter> {
    /// Create a pipeline without a reporter.
    pub fn new(config: InferenceConfig) -> Self {
        Self {
            solver: ThresholdSolver::new(&config),
            config,
            keep_curves: false,
            reporter: NoOpReporter,
        }
    }
}

impl<R: InferenceReporter> SpacingPipeline<R> {
    /// Replace the reporter.
    pub fn with_reporter<R2: InferenceReporter>(self, reporter: R2) -> SpacingPipeline<R2> {
        SpacingPipeline {
            config: self.config,
            solver: self.solver,
            keep_curves: self.keep_curves,
            reporter,
        }
    }

    /// Keep the per-bin diagnostic curves in the output.
    pub fn with_curves(mut self, keep: bool) -> Self {
        self.keep_curves = keep;
        self
    }

    /// Run configuration.
    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Reporter.
    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Mutable reporter.
    pub fn reporter_mut(&mut self) -> &mut R {
        &mut self.reporter
    }

    /// Consume the pipeline, returning the reporter.
    pub fn into_reporter(self) -> R {
        self.reporter
    }

    /// Infer thresholds for every definition.
    ///
    /// # Errors
    /// Fatal for the whole run: invalid configuration, non-finite values,
    /// a definition index beyond the observations' label sets, and baseline
    /// fits that fail (e.g. an empty speed level). Per-definition problems
    /// are reported in [`PipelineOutput::failures`] instead.
    pub fn run(
        &mut self,
        observations: &[Observation],
        levels: &SpeedLevels,
        definitions: &[ConflictDefinition],
    ) -> Result<PipelineOutput, InferenceError> {
        self.config.validate()?;
        validate_observations(observations, definitions)?;

        let total = observations.len();
        let closing: Cow<'_, [Observation]> = if observations.iter().all(Observation::is_closing) {
            Cow::Borrowed(observations)
        } else {
            Cow::Owned(
                observations
                    .iter()
                    .filter(|o| o.is_closing())
                    .cloned()
                    .collect(),
            )
        };
        let dropped = total - closing.len();
        self.reporter.on_observations_filtered(closing.len(), dropped);

        let bins = assign_bins(levels, &closing);
        let baselines = map_ordered(&bins, fit_baseline)
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?;
        for (bin, fit) in bins.iter().zip(&baselines) {
            self.reporter.on_baseline_fit(bin.index, bin.level, fit.population);
        }
        let populations: Vec<usize> = baselines.iter().map(|b| b.population).collect();

        let mut output = PipelineOutput {
            populations,
            dropped,
            ..PipelineOutput::default()
        };
        for definition in definitions {
            match self.run_definition(definition, &bins, &baselines, &output.populations) {
                Ok((rows, curves)) => {
                    output.table.extend(rows);
                    output.curves.extend(curves);
                }
                Err(error) => {
                    self.reporter.on_definition_failed(&definition.name, &error);
                    output.failures.push(DefinitionFailure {
                        definition: definition.name.clone(),
                        error,
                    });
                }
            }
        }
        Ok(output)
    }

    fn run_definition(
        &mut self,
        definition: &ConflictDefinition,
        bins: &[SpeedBin<'_>],
        baselines: &[BaselineFit],
        populations: &[usize],
    ) -> Result<(Vec<ThresholdRow>, Vec<BinCurves>), InferenceError> {
        let min_samples = self.config.min_conflict_samples;
        let fits = map_ordered(bins, |bin| {
            fit_conflict(bin, |o: &Observation| o.is_conflict(definition), min_samples)
        })
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;

        for (bin, fit) in bins.iter().zip(&fits) {
            match fit {
                ConflictFit::Fitted { count, .. } => {
                    self.reporter
                        .on_conflict_fit(&definition.name, bin.index, bin.level, *count)
                }
                ConflictFit::Missing { count } => {
                    self.reporter
                        .on_conflict_missing(&definition.name, bin.index, bin.level, *count)
                }
            }
        }

        let densities = borrow_missing(definition, fits, populations)?;
        for (bin, source) in densities.borrowed() {
            self.reporter.on_density_borrowed(&definition.name, bin, source);
        }

        let solver = &self.solver;
        let indices: Vec<usize> = (0..bins.len()).collect();
        let curves = map_ordered(&indices, |&i| {
            let slot = &densities.slots[i];
            solver.curves(
                baselines[i].density.as_ref(),
                slot.density.as_ref(),
                slot.max_spacing,
                slot.rate,
            )
        })
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;

        let mut rows = Vec::with_capacity(bins.len() * solver.alphas().len());
        let mut kept = Vec::new();
        for (bin, bin_curves) in bins.iter().zip(curves) {
            let solved = solver.select_all(&bin_curves);
            self.reporter.on_bin_solved(&definition.name, bin.level, &solved);
            rows.extend(
                solved
                    .iter()
                    .map(|s| ThresholdRow::from_solved(bin.level, &definition.name, s)),
            );
            if self.keep_curves {
                kept.push(BinCurves {
                    definition: definition.name.clone(),
                    speed_level: bin.level,
                    curves: bin_curves,
                });
            }
        }
        Ok((rows, kept))
    }
}

/// Run the pipeline with the default configuration and no reporter.
pub fn run_pipeline(
    observations: &[Observation],
    levels: &SpeedLevels,
    definitions: &[ConflictDefinition],
) -> Result<PipelineOutput, InferenceError> {
    SpacingPipeline::new(InferenceConfig::default()).run(observations, levels, definitions)
}

fn validate_observations(
    observations: &[Observation],
    definitions: &[ConflictDefinition],
) -> Result<(), InputError> {
    for (row, obs) in observations.iter().enumerate() {
        for (column, value) in [
            ("spacing", obs.spacing),
            ("relative_speed", obs.relative_speed),
            ("absolute_speed", obs.absolute_speed),
        ] {
            if !value.is_finite() {
                return Err(InputError::NonFinite {
                    row,
                    column: column.to_string(),
                });
            }
        }
        if let Some(def) = definitions.iter().find(|d| d.index >= obs.labels.len()) {
            return Err(InputError::MissingColumn {
                column: def.name.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::DebugReporter;

    /// Two bins of 200 observations; `conflict_a` has 30 conflicts per bin,
    /// `conflict_b` only 3
    fn dataset() -> Vec<Observation> {
        let mut obs = Vec::new();
        for level in [1.0, 3.0] {
            for k in 0..200 {
                let v = level + ((k % 7) as f64 - 3.0) * 0.05;
                let spacing = if k < 30 {
                    2.0 + k as f64 * 0.2
                } else {
                    20.0 + (k % 50) as f64 * 0.8 + level
                };
                obs.push(Observation::new(spacing, v, 20.0).with_labels([k < 30, k < 3]));
            }
        }
        obs
    }

    fn definitions() -> Vec<ConflictDefinition> {
        ConflictDefinition::from_names(&["conflict_a", "conflict_b"])
    }

    #[test]
    fn test_run_isolates_failing_definition() {
        let levels = SpeedLevels::new([1.0, 3.0]).unwrap();
        let output = run_pipeline(&dataset(), &levels, &definitions()).unwrap();

        assert_eq!(output.table.len(), 2 * 19);
        assert_eq!(output.table.definitions(), vec!["conflict_a"]);
        assert_eq!(output.failures.len(), 1);
        assert_eq!(output.failures[0].definition, "conflict_b");
        assert!(matches!(
            output.failures[0].error,
            InferenceError::NoConflictSource { num_bins: 2, .. }
        ));
        assert_eq!(output.populations, vec![200, 200]);
        assert!(!output.is_complete());
    }

    #[test]
    fn test_rows_ordered_by_level_then_alpha() {
        let levels = SpeedLevels::new([1.0, 3.0]).unwrap();
        let output = run_pipeline(&dataset(), &levels, &definitions()).unwrap();
        let rows = &output.table.rows;
        assert_eq!(rows[0].speed_level, 1.0);
        assert_eq!(rows[19].speed_level, 3.0);
        for pair in rows[..19].windows(2) {
            assert!(pair[0].alpha < pair[1].alpha);
        }
        for row in rows {
            assert!((row.conflict_rate - 30.0 / 200.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_run_is_idempotent() {
        let levels = SpeedLevels::new([1.0, 3.0]).unwrap();
        let data = dataset();
        let first = run_pipeline(&data, &levels, &definitions()).unwrap();
        let second = run_pipeline(&data, &levels, &definitions()).unwrap();
        assert_eq!(first.table, second.table);
    }

    #[test]
    fn test_non_closing_observations_dropped() {
        let levels = SpeedLevels::new([1.0, 3.0]).unwrap();
        let mut data = dataset();
        data.push(Observation::new(15.0, -2.0, 20.0).with_labels([true, true]));
        data.push(Observation::new(0.0, 2.0, 20.0).with_labels([false, false]));

        let mut pipeline =
            SpacingPipeline::new(InferenceConfig::default()).with_reporter(DebugReporter::new());
        let output = pipeline.run(&data, &levels, &definitions()).unwrap();
        assert_eq!(output.dropped, 2);
        assert_eq!(pipeline.reporter().filter_events(), &[(400, 2)]);
        assert_eq!(pipeline.reporter().missing_events().len(), 2);
        assert_eq!(pipeline.reporter().failure_events().len(), 1);
    }

    #[test]
    fn test_curves_kept_on_request() {
        let levels = SpeedLevels::new([1.0, 3.0]).unwrap();
        let mut pipeline = SpacingPipeline::new(InferenceConfig::default()).with_curves(true);
        let output = pipeline.run(&dataset(), &levels, &definitions()).unwrap();
        assert_eq!(output.curves.len(), 2);
        assert_eq!(output.curves[1].speed_level, 3.0);
        assert!(!output.curves[0].curves.is_empty());
    }

    #[test]
    fn test_non_finite_input_is_fatal() {
        let levels = SpeedLevels::new([1.0, 3.0]).unwrap();
        let mut data = dataset();
        data[7].spacing = f64::NAN;
        let err = run_pipeline(&data, &levels, &definitions()).unwrap_err();
        match err {
            InferenceError::Input(InputError::NonFinite { row, column }) => {
                assert_eq!(row, 7);
                assert_eq!(column, "spacing");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_unknown_label_column_is_fatal() {
        let levels = SpeedLevels::new([1.0, 3.0]).unwrap();
        let defs = vec![ConflictDefinition::new("conflict_z", 5)];
        let err = run_pipeline(&dataset(), &levels, &defs).unwrap_err();
        assert!(matches!(
            err,
            InferenceError::Input(InputError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_empty_level_is_fatal() {
        let levels = SpeedLevels::new([1.0, 3.0, 50.0]).unwrap();
        let err = run_pipeline(&dataset(), &levels, &definitions()).unwrap_err();
        assert!(matches!(err, InferenceError::DegenerateSample { size: 0, .. }));
    }
}

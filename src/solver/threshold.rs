//! Missed-detection / false-alarm tradeoff over a candidate-threshold grid
//!
//! For a bin with baseline density `p_s`, conflict density `p_sc` and conflict
//! rate `c`, a spacing threshold `t` below an upper bound `u` yields
//!
//! ```text
//! pma(t) = ∫_t^u p_sc
//! pfa(t) = (∫_0^t p_s - c ∫_0^t p_sc) / (∫_0^u p_s - c ∫_0^u p_sc)
//! ```
//!
//! and each weighting coefficient `alpha` picks the first grid point
//! minimizing `alpha * pma + (1 - alpha) * pfa`.

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::common::grid::{arange, argmax_first, argmin_first};
use crate::config::InferenceConfig;
use crate::density::SpacingDensity;
use crate::errors::InferenceError;

/// Threshold chosen for one weighting coefficient
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolvedThreshold {
    /// Weight on missed detection
    pub alpha: f64,
    /// Chosen spacing threshold
    pub threshold: f64,
    /// Upper integration bound
    pub upper_bound: f64,
    /// Baseline mass on [0, upper_bound]
    pub total_baseline_mass: f64,
    /// Conflict mass on [0, upper_bound]
    pub total_conflict_mass: f64,
    /// Conflict rate used in the false-alarm normalization
    pub conflict_rate: f64,
}

/// Missed-detection and false-alarm curves of one bin
#[derive(Debug, Clone)]
pub struct ThresholdCurves {
    /// Candidate thresholds `0, step, 2 step, ...` below the upper bound
    pub candidates: DVector<f64>,
    /// Missed-detection probability at each candidate
    pub missed_detection: DVector<f64>,
    /// False-alarm probability at each candidate
    pub false_alarm: DVector<f64>,
    /// Upper integration bound
    pub upper_bound: f64,
    /// Baseline mass on [0, upper_bound]
    pub total_baseline_mass: f64,
    /// Conflict mass on [0, upper_bound]
    pub total_conflict_mass: f64,
    /// Conflict rate
    pub conflict_rate: f64,
}

impl ThresholdCurves {
    /// Number of candidate thresholds
    #[inline]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether the grid is empty (never true for curves built by the solver)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Weighted objective `alpha * pma + (1 - alpha) * pfa` at every candidate
    pub fn objective(&self, alpha: f64) -> DVector<f64> {
        &self.missed_detection * alpha + &self.false_alarm * (1.0 - alpha)
    }

    /// First candidate minimizing the objective for `alpha`.
    ///
    /// NaN objective values (a zero false-alarm normalizer gives `0 / 0` at
    /// `t = 0`) are passed over rather than selected. If every value is NaN
    /// the first candidate is chosen.
    pub fn select(&self, alpha: f64) -> SolvedThreshold {
        let idx = argmin_first(&self.objective(alpha)).unwrap_or(0);
        SolvedThreshold {
            alpha,
            threshold: self.candidates.get(idx).copied().unwrap_or(0.0),
            upper_bound: self.upper_bound,
            total_baseline_mass: self.total_baseline_mass,
            total_conflict_mass: self.total_conflict_mass,
            conflict_rate: self.conflict_rate,
        }
    }
}

/// Grid-search solver for spacing thresholds
#[derive(Debug, Clone)]
pub struct ThresholdSolver {
    candidate_step: f64,
    density_scan_limit: f64,
    alphas: Vec<f64>,
}

impl Default for ThresholdSolver {
    fn default() -> Self {
        Self::new(&InferenceConfig::default())
    }
}

impl ThresholdSolver {
    /// Create a solver from the grid and alpha settings of `config`
    pub fn new(config: &InferenceConfig) -> Self {
        Self {
            candidate_step: config.candidate_step,
            density_scan_limit: config.density_scan_limit,
            alphas: config.alphas(),
        }
    }

    /// Weighting coefficients, one output row each
    #[inline]
    pub fn alphas(&self) -> &[f64] {
        &self.alphas
    }

    /// Scan-grid point where the baseline density peaks (first maximum)
    pub fn baseline_peak(&self, baseline: &dyn SpacingDensity) -> f64 {
        let grid = arange(0.0, self.density_scan_limit, self.candidate_step);
        let density = baseline.pdf_batch(&grid);
        argmax_first(&density)
            .and_then(|i| grid.get(i).copied())
            .unwrap_or(0.0)
    }

    /// Upper integration bound: the larger of the observed maximum conflict
    /// spacing and the baseline peak
    pub fn upper_bound(&self, baseline: &dyn SpacingDensity, observed_max_conflict_spacing: f64) -> f64 {
        observed_max_conflict_spacing.max(self.baseline_peak(baseline))
    }

    /// Missed-detection and false-alarm curves over the candidate grid.
    ///
    /// # Errors
    /// [`InferenceError::EmptyCandidateGrid`] when the upper bound leaves no
    /// candidate (bound at or below zero).
    pub fn curves(
        &self,
        baseline: &dyn SpacingDensity,
        conflict: &dyn SpacingDensity,
        observed_max_conflict_spacing: f64,
        conflict_rate: f64,
    ) -> Result<ThresholdCurves, InferenceError> {
        let upper_bound = self.upper_bound(baseline, observed_max_conflict_spacing);
        let candidates = arange(0.0, upper_bound, self.candidate_step);
        if candidates.is_empty() {
            return Err(InferenceError::EmptyCandidateGrid { upper_bound });
        }

        let total_baseline_mass = baseline.integrate(0.0, upper_bound);
        let total_conflict_mass = conflict.integrate(0.0, upper_bound);
        let normalizer = total_baseline_mass - conflict_rate * total_conflict_mass;

        let missed_detection = candidates.map(|t| conflict.integrate(t, upper_bound));
        let false_alarm = candidates.map(|t| {
            (baseline.integrate(0.0, t) - conflict_rate * conflict.integrate(0.0, t)) / normalizer
        });

        Ok(ThresholdCurves {
            candidates,
            missed_detection,
            false_alarm,
            upper_bound,
            total_baseline_mass,
            total_conflict_mass,
            conflict_rate,
        })
    }

    /// One solved threshold per weighting coefficient.
    pub fn select_all(&self, curves: &ThresholdCurves) -> Vec<SolvedThreshold> {
        self.alphas.iter().map(|&alpha| curves.select(alpha)).collect()
    }

    /// Solve a bin: build the curves and select a threshold per coefficient.
    pub fn solve(
        &self,
        baseline: &dyn SpacingDensity,
        conflict: &dyn SpacingDensity,
        observed_max_conflict_spacing: f64,
        conflict_rate: f64,
    ) -> Result<Vec<SolvedThreshold>, InferenceError> {
        let curves = self.curves(baseline, conflict, observed_max_conflict_spacing, conflict_rate)?;
        Ok(self.select_all(&curves))
    }
}

/// Solve one bin with the default grid and the 19 default coefficients.
pub fn solve_threshold(
    baseline: &dyn SpacingDensity,
    conflict: &dyn SpacingDensity,
    observed_max_conflict_spacing: f64,
    conflict_rate: f64,
) -> Result<Vec<SolvedThreshold>, InferenceError> {
    ThresholdSolver::default().solve(baseline, conflict, observed_max_conflict_spacing, conflict_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::density::GaussianKde;

    /// Evenly spread sample with the given center and half-width
    fn spread(center: f64, half_width: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|k| center - half_width + 2.0 * half_width * (k as f64 + 0.5) / n as f64)
            .collect()
    }

    /// Baseline mixing 900 normal-following and 100 conflict spacings
    fn separated_bin() -> (GaussianKde, GaussianKde, f64, f64) {
        let conflicts = spread(10.0, 5.0, 100);
        let mut all = spread(50.0, 14.0, 900);
        all.extend_from_slice(&conflicts);
        let baseline = GaussianKde::fit(&all).unwrap();
        let conflict = GaussianKde::fit(&conflicts).unwrap();
        let max_conflict = conflicts.iter().copied().fold(f64::MIN, f64::max);
        (baseline, conflict, max_conflict, 0.1)
    }

    #[test]
    fn test_upper_bound_uses_baseline_peak() {
        let (baseline, _, max_conflict, _) = separated_bin();
        let solver = ThresholdSolver::default();
        let peak = solver.baseline_peak(&baseline);
        assert!(peak > 40.0 && peak < 60.0, "peak = {}", peak);
        assert_eq!(solver.upper_bound(&baseline, max_conflict), peak);
        assert_eq!(solver.upper_bound(&baseline, 150.0), 150.0);
    }

    #[test]
    fn test_candidate_grid_excludes_bound() {
        let (baseline, conflict, _, rate) = separated_bin();
        let solver = ThresholdSolver::default();
        let curves = solver.curves(&baseline, &conflict, 100.0, rate).unwrap();
        assert_eq!(curves.len(), 1000);
        assert_eq!(curves.candidates[0], 0.0);
        assert_eq!(curves.candidates[999], 999.0 * 0.1);
    }

    #[test]
    fn test_missed_detection_non_increasing() {
        let (baseline, conflict, max_conflict, rate) = separated_bin();
        let curves = ThresholdSolver::default()
            .curves(&baseline, &conflict, max_conflict, rate)
            .unwrap();
        for k in 1..curves.len() {
            assert!(curves.missed_detection[k] <= curves.missed_detection[k - 1] + 1e-12);
        }
        // At t = 0 the whole conflict mass below the bound is missed
        assert!((curves.missed_detection[0] - curves.total_conflict_mass).abs() < 1e-12);
        assert_eq!(curves.false_alarm[0], 0.0);
    }

    #[test]
    fn test_separated_bin_threshold_between_modes() {
        let (baseline, conflict, max_conflict, rate) = separated_bin();
        let solver = ThresholdSolver::default();
        let curves = solver.curves(&baseline, &conflict, max_conflict, rate).unwrap();
        let solved = curves.select(0.5);
        assert!(
            solved.threshold >= 12.0 && solved.threshold <= 45.0,
            "threshold = {}",
            solved.threshold
        );
        let k = (solved.threshold / 0.1).round() as usize;
        assert!(curves.missed_detection[k] < 0.3);
        assert!(curves.false_alarm[k] < 0.3);
    }

    #[test]
    fn test_alpha_trend() {
        let (baseline, conflict, max_conflict, rate) = separated_bin();
        let rows = solve_threshold(&baseline, &conflict, max_conflict, rate).unwrap();
        assert_eq!(rows.len(), 19);
        for pair in rows.windows(2) {
            assert!(pair[0].threshold <= pair[1].threshold);
        }
        assert!((rows[0].alpha - 0.05).abs() < 1e-12);
        assert!((rows[18].alpha - 0.95).abs() < 1e-12);
        for row in &rows {
            assert_eq!(row.upper_bound, rows[0].upper_bound);
            assert_eq!(row.conflict_rate, rate);
        }
    }

    #[test]
    fn test_extreme_alphas_hit_grid_ends() {
        let (baseline, conflict, max_conflict, rate) = separated_bin();
        let curves = ThresholdSolver::default()
            .curves(&baseline, &conflict, max_conflict, rate)
            .unwrap();
        // Only missed detections matter: first point where pma bottoms out
        let all_pma = curves.select(1.0);
        let k = (all_pma.threshold / 0.1).round() as usize;
        let min_pma = curves.missed_detection.min();
        assert!((curves.missed_detection[k] - min_pma).abs() < 1e-15);

        // Without a conflict-rate correction pfa grows from zero at t = 0, so
        // only false alarms mattering pins the threshold to the first candidate
        let uncorrected = ThresholdSolver::default()
            .curves(&baseline, &conflict, max_conflict, 0.0)
            .unwrap();
        for k in 1..uncorrected.len() {
            assert!(uncorrected.false_alarm[k] > 0.0);
        }
        let all_pfa = uncorrected.select(0.0);
        assert_eq!(all_pfa.threshold, uncorrected.candidates[0]);
        assert_eq!(all_pfa.threshold, 0.0);
        assert!(all_pfa.threshold < uncorrected.select(1.0).threshold);
    }

    #[test]
    fn test_select_passes_over_nan_objective() {
        let curves = ThresholdCurves {
            candidates: DVector::from_vec(vec![0.0, 0.1, 0.2, 0.3]),
            missed_detection: DVector::from_vec(vec![0.9, 0.5, 0.2, 0.2]),
            false_alarm: DVector::from_vec(vec![f64::NAN, 0.3, 0.4, 0.6]),
            upper_bound: 0.4,
            total_baseline_mass: 0.5,
            total_conflict_mass: 0.9,
            conflict_rate: 0.5,
        };
        // 0.5 * pma + 0.5 * pfa = [NaN, 0.4, 0.3, 0.4]
        assert_eq!(curves.select(0.5).threshold, 0.2);
        // pfa alone bottoms out at the first finite point
        assert_eq!(curves.select(0.0).threshold, 0.1);

        let all_nan = ThresholdCurves {
            false_alarm: DVector::from_element(4, f64::NAN),
            ..curves
        };
        assert_eq!(all_nan.select(0.5).threshold, 0.0);
    }

    #[test]
    fn test_empty_grid_is_error() {
        // Baseline peaks at the grid origin and no conflict spacing was seen
        let baseline = GaussianKde::with_bandwidth(&[-5.0, -4.0], 1.0).unwrap();
        let conflict = GaussianKde::with_bandwidth(&[1.0, 2.0], 1.0).unwrap();
        let err = ThresholdSolver::default()
            .solve(&baseline, &conflict, 0.0, 0.1)
            .unwrap_err();
        assert!(matches!(err, InferenceError::EmptyCandidateGrid { .. }));
    }
}

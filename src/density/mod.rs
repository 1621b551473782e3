//! Continuous spacing densities and their per-bin estimation.
//!
//! - [`SpacingDensity`] - any 1-D density evaluable pointwise and integrable
//!   over an arbitrary interval
//! - [`GaussianKde`] - Gaussian kernel density estimate (Scott's rule)
//! - [`estimator`] - baseline and conflict fits per speed bin, borrowing for
//!   bins with too few conflicts, and conflict-rate normalization

pub mod estimator;
pub mod kde;

use std::fmt;
use std::sync::Arc;

use nalgebra::DVector;

pub use estimator::{
    borrow_missing, estimate, fit_baseline, fit_conflict, nearest_present, BaselineFit, ConflictFit,
    ConflictSlot, DensitySource, DefinitionDensities,
};
pub use kde::GaussianKde;

/// A probability density over spacing
///
/// Implementations must be non-negative and integrate to one over the real
/// line. They are shared between bins, so they must be thread-safe.
pub trait SpacingDensity: fmt::Debug + Send + Sync {
    /// Density at `x`
    fn pdf(&self, x: f64) -> f64;

    /// Probability mass on `[low, high]` (negative when `high < low`)
    fn integrate(&self, low: f64, high: f64) -> f64;

    /// Density at every grid point
    fn pdf_batch(&self, xs: &DVector<f64>) -> DVector<f64> {
        xs.map(|x| self.pdf(x))
    }
}

/// Shared handle to a fitted density; borrowing clones the handle, not the fit
pub type SharedDensity = Arc<dyn SpacingDensity>;

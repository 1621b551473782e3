//! Gaussian kernel density estimation in one dimension
//!
//! Bandwidth follows Scott's rule: the kernel standard deviation is the
//! sample standard deviation (`ddof = 1`) scaled by `n^(-1/5)`. Box integrals
//! are exact: each kernel contributes the difference of two normal CDFs.

use std::f64::consts::{PI, SQRT_2};

use nalgebra::DVector;
use statrs::function::erf::erfc;

use crate::errors::InferenceError;

use super::SpacingDensity;

/// Gaussian KDE over a 1-D sample
#[derive(Debug, Clone)]
pub struct GaussianKde {
    dataset: DVector<f64>,
    bandwidth: f64,
}

impl GaussianKde {
    /// Fit with Scott's rule bandwidth.
    ///
    /// # Errors
    /// [`InferenceError::DegenerateSample`] when the sample has fewer than two
    /// points, contains non-finite values, or has zero variance.
    pub fn fit(samples: &[f64]) -> Result<Self, InferenceError> {
        let n = samples.len();
        if n < 2 || samples.iter().any(|s| !s.is_finite()) {
            return Err(degenerate(n));
        }
        let dataset = DVector::from_column_slice(samples);
        let mean = dataset.mean();
        let sum_sq = dataset.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>();
        let std = (sum_sq / (n - 1) as f64).sqrt();
        let bandwidth = std * scott_factor(n);
        if !(bandwidth.is_finite() && bandwidth > 0.0) {
            return Err(degenerate(n));
        }
        Ok(Self { dataset, bandwidth })
    }

    /// Fit with an explicit kernel standard deviation.
    pub fn with_bandwidth(samples: &[f64], bandwidth: f64) -> Result<Self, InferenceError> {
        let n = samples.len();
        if n == 0 || !(bandwidth.is_finite() && bandwidth > 0.0) {
            return Err(degenerate(n));
        }
        Ok(Self {
            dataset: DVector::from_column_slice(samples),
            bandwidth,
        })
    }

    /// Kernel standard deviation
    #[inline]
    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    /// Number of kernels
    #[inline]
    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    /// Whether the estimate has no kernels (never true for a fitted KDE)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    /// The fitted sample
    #[inline]
    pub fn dataset(&self) -> &DVector<f64> {
        &self.dataset
    }

    /// Mass below `x`
    pub fn cdf(&self, x: f64) -> f64 {
        let h = self.bandwidth;
        self.dataset
            .iter()
            .map(|&xi| standard_normal_cdf((x - xi) / h))
            .sum::<f64>()
            / self.dataset.len() as f64
    }
}

impl SpacingDensity for GaussianKde {
    fn pdf(&self, x: f64) -> f64 {
        let h = self.bandwidth;
        let norm = 1.0 / (h * (2.0 * PI).sqrt() * self.dataset.len() as f64);
        self.dataset
            .iter()
            .map(|&xi| {
                let z = (x - xi) / h;
                (-0.5 * z * z).exp()
            })
            .sum::<f64>()
            * norm
    }

    fn integrate(&self, low: f64, high: f64) -> f64 {
        let h = self.bandwidth;
        self.dataset
            .iter()
            .map(|&xi| standard_normal_cdf((high - xi) / h) - standard_normal_cdf((low - xi) / h))
            .sum::<f64>()
            / self.dataset.len() as f64
    }
}

/// Scott's bandwidth factor for one dimension
#[inline]
fn scott_factor(n: usize) -> f64 {
    (n as f64).powf(-0.2)
}

/// Standard normal CDF via the complementary error function (accurate in
/// the lower tail)
#[inline]
fn standard_normal_cdf(z: f64) -> f64 {
    0.5 * erfc(-z / SQRT_2)
}

fn degenerate(size: usize) -> InferenceError {
    InferenceError::DegenerateSample {
        context: "kernel density sample".to_string(),
        size,
    }
}

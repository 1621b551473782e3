//! Per-bin density estimation and conflict-density borrowing
//!
//! Densities of one conflict definition are stored in an array indexed by bin
//! position. Bins whose conflict subset is too small are fitted as
//! [`ConflictFit::Missing`]; once every bin has been attempted, each missing
//! bin takes a shared handle to the density of the nearest fitted bin by
//! index distance (ties go to the lower index). The nearest-neighbour search
//! runs over the fitted bins only, in one batch, so long runs of missing bins
//! split between their two fitted neighbours.

use std::sync::Arc;

use crate::binning::SpeedBin;
use crate::errors::InferenceError;
use crate::types::{ConflictDefinition, Observation};

use super::{GaussianKde, SharedDensity};

/// Baseline density of one bin
#[derive(Debug, Clone)]
pub struct BaselineFit {
    /// Density over all spacings of the bin
    pub density: SharedDensity,
    /// Number of observations in the bin
    pub population: usize,
}

/// Conflict density attempt for one (bin, definition) pair
#[derive(Debug, Clone)]
pub enum ConflictFit {
    /// Enough conflicts to fit a density
    Fitted {
        /// Density over conflict spacings
        density: SharedDensity,
        /// Number of conflicts in the bin
        count: usize,
        /// Largest observed conflict spacing
        max_spacing: f64,
    },
    /// Too few conflicts; the density will be borrowed
    Missing {
        /// Number of conflicts in the bin
        count: usize,
    },
}

impl ConflictFit {
    /// Whether the density must be borrowed
    #[inline]
    pub fn is_missing(&self) -> bool {
        matches!(self, ConflictFit::Missing { .. })
    }

    /// Number of conflicts found in the bin
    #[inline]
    pub fn count(&self) -> usize {
        match *self {
            ConflictFit::Fitted { count, .. } | ConflictFit::Missing { count } => count,
        }
    }
}

/// Where a bin's conflict density came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DensitySource {
    /// Fitted on the bin's own conflicts
    Fitted,
    /// Shared from the bin at `from`
    Borrowed {
        /// Index of the lending bin
        from: usize,
    },
}

/// Final conflict-density slot of one bin
#[derive(Debug, Clone)]
pub struct ConflictSlot {
    /// Conflict density (own or borrowed)
    pub density: SharedDensity,
    /// Provenance of the density
    pub source: DensitySource,
    /// Conflicts observed in the bin
    pub count: usize,
    /// Largest observed conflict spacing; zero for borrowed slots
    pub max_spacing: f64,
    /// Conflict rate; the minimum fitted rate for borrowed slots
    pub rate: f64,
}

/// Conflict densities of every bin for one definition
#[derive(Debug, Clone)]
pub struct DefinitionDensities {
    /// Conflict definition
    pub definition: ConflictDefinition,
    /// One slot per bin, in level order
    pub slots: Vec<ConflictSlot>,
}

impl DefinitionDensities {
    /// `(bin, lender)` pairs for every borrowed slot
    pub fn borrowed(&self) -> Vec<(usize, usize)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| match s.source {
                DensitySource::Borrowed { from } => Some((i, from)),
                DensitySource::Fitted => None,
            })
            .collect()
    }
}

/// Fit the baseline density over every spacing of the bin.
pub fn fit_baseline(bin: &SpeedBin<'_>) -> Result<BaselineFit, InferenceError> {
    let spacings = bin.spacings();
    let kde = GaussianKde::fit(&spacings)
        .map_err(|e| with_context(e, format!("baseline at level {}", bin.level)))?;
    Ok(BaselineFit {
        density: Arc::new(kde),
        population: spacings.len(),
    })
}

/// Fit the conflict density over members satisfying `predicate`.
///
/// Subsets with `min_samples` members or fewer are reported as missing
/// without fitting.
pub fn fit_conflict<F>(
    bin: &SpeedBin<'_>,
    predicate: F,
    min_samples: usize,
) -> Result<ConflictFit, InferenceError>
where
    F: Fn(&Observation) -> bool,
{
    let spacings = bin.spacings_where(predicate);
    let count = spacings.len();
    if count <= min_samples {
        return Ok(ConflictFit::Missing { count });
    }
    let kde = GaussianKde::fit(&spacings)
        .map_err(|e| with_context(e, format!("conflicts at level {}", bin.level)))?;
    let max_spacing = spacings.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Ok(ConflictFit::Fitted {
        density: Arc::new(kde),
        count,
        max_spacing,
    })
}

/// Baseline and conflict estimates of one bin.
pub fn estimate<F>(
    bin: &SpeedBin<'_>,
    predicate: F,
    min_samples: usize,
) -> Result<(BaselineFit, ConflictFit), InferenceError>
where
    F: Fn(&Observation) -> bool,
{
    Ok((fit_baseline(bin)?, fit_conflict(bin, predicate, min_samples)?))
}

/// Source bin for every bin: itself when present, otherwise the nearest
/// present bin by index distance (lower index on ties).
///
/// Returns `None` when no bin is present.
pub fn nearest_present(present: &[bool]) -> Option<Vec<usize>> {
    let fitted: Vec<usize> = (0..present.len()).filter(|&i| present[i]).collect();
    if fitted.is_empty() {
        return None;
    }
    let sources = (0..present.len())
        .map(|i| {
            if present[i] {
                return i;
            }
            // First fitted index above i, and the one before it
            let above = fitted.partition_point(|&f| f < i);
            let lo = above.checked_sub(1).map(|b| fitted[b]);
            let hi = fitted.get(above).copied();
            match (lo, hi) {
                (Some(lo), Some(hi)) if hi - i < i - lo => hi,
                (Some(lo), _) => lo,
                (None, hi) => hi.unwrap_or(i),
            }
        })
        .collect();
    Some(sources)
}

/// Resolve missing bins by borrowing and normalize conflict rates.
///
/// `populations[i]` is the observation count of bin `i`. Fitted rates are
/// `count / population`; borrowed slots take the minimum fitted rate.
///
/// # Errors
/// [`InferenceError::NoConflictSource`] when every bin is missing.
pub fn borrow_missing(
    definition: &ConflictDefinition,
    fits: Vec<ConflictFit>,
    populations: &[usize],
) -> Result<DefinitionDensities, InferenceError> {
    if populations.len() != fits.len() {
        return Err(InferenceError::Configuration {
            description: format!(
                "{} bin populations supplied for {} conflict fits",
                populations.len(),
                fits.len()
            ),
        });
    }
    let present: Vec<bool> = fits.iter().map(|f| !f.is_missing()).collect();
    let sources = nearest_present(&present).ok_or_else(|| InferenceError::NoConflictSource {
        definition: definition.name.clone(),
        num_bins: fits.len(),
    })?;

    let rates: Vec<Option<f64>> = fits
        .iter()
        .zip(populations)
        .map(|(fit, &population)| match fit {
            ConflictFit::Fitted { count, .. } if population > 0 => {
                Some(*count as f64 / population as f64)
            }
            _ => None,
        })
        .collect();
    let floor_rate = rates
        .iter()
        .flatten()
        .copied()
        .fold(f64::INFINITY, f64::min);

    let densities: Vec<Option<SharedDensity>> = fits
        .iter()
        .map(|fit| match fit {
            ConflictFit::Fitted { density, .. } => Some(Arc::clone(density)),
            ConflictFit::Missing { .. } => None,
        })
        .collect();

    let slots = fits
        .iter()
        .enumerate()
        .map(|(i, fit)| {
            let source = sources[i];
            let density = densities[source].clone().ok_or_else(|| {
                InferenceError::NoConflictSource {
                    definition: definition.name.clone(),
                    num_bins: fits.len(),
                }
            })?;
            Ok(match *fit {
                ConflictFit::Fitted {
                    count, max_spacing, ..
                } => ConflictSlot {
                    density,
                    source: DensitySource::Fitted,
                    count,
                    max_spacing,
                    rate: rates[i].unwrap_or(floor_rate),
                },
                ConflictFit::Missing { count } => ConflictSlot {
                    density,
                    source: DensitySource::Borrowed { from: source },
                    count,
                    max_spacing: 0.0,
                    rate: floor_rate,
                },
            })
        })
        .collect::<Result<Vec<_>, InferenceError>>()?;

    Ok(DefinitionDensities {
        definition: definition.clone(),
        slots,
    })
}

fn with_context(err: InferenceError, context: String) -> InferenceError {
    match err {
        InferenceError::DegenerateSample { size, .. } => {
            InferenceError::DegenerateSample { context, size }
        }
        other => other,
    }
}

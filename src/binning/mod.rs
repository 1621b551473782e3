//! Speed binning: representative levels, quantization, and grouping.
//!
//! - [`levels`] derives the representative relative-speed levels
//! - [`quantizer`] maps each observation to its nearest level
//! - [`assign_bins`] groups observations into one [`SpeedBin`] per level

pub mod levels;
pub mod quantizer;

pub use levels::{derive_levels, DerivedLevels, LevelDerivation};
pub use quantizer::SpeedLevels;

use crate::types::Observation;

/// Observations assigned to one representative speed level
#[derive(Debug, Clone)]
pub struct SpeedBin<'a> {
    /// Position of the level in the sorted level set
    pub index: usize,
    /// Representative relative speed
    pub level: f64,
    /// Member observations
    pub observations: Vec<&'a Observation>,
}

impl<'a> SpeedBin<'a> {
    /// Number of member observations
    #[inline]
    pub fn population(&self) -> usize {
        self.observations.len()
    }

    /// Spacing of every member
    pub fn spacings(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.spacing).collect()
    }

    /// Spacing of the members satisfying `predicate`
    pub fn spacings_where<F: Fn(&Observation) -> bool>(&self, predicate: F) -> Vec<f64> {
        self.observations
            .iter()
            .filter(|o| predicate(o))
            .map(|o| o.spacing)
            .collect()
    }
}

/// Group observations into one bin per level, in level order.
///
/// Every observation lands in exactly one bin; bins may be empty.
pub fn assign_bins<'a>(levels: &SpeedLevels, observations: &'a [Observation]) -> Vec<SpeedBin<'a>> {
    let speeds: Vec<f64> = observations.iter().map(|o| o.relative_speed).collect();
    let indices = levels.quantize_batch(&speeds);

    let mut bins: Vec<SpeedBin<'a>> = levels
        .as_slice()
        .iter()
        .enumerate()
        .map(|(index, &level)| SpeedBin {
            index,
            level,
            observations: Vec::new(),
        })
        .collect();
    for (obs, bin_idx) in observations.iter().zip(indices) {
        bins[bin_idx].observations.push(obs);
    }
    bins
}

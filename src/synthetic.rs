//! Reproducible synthetic car-following data
//!
//! Pairs are drawn in two regimes. Ordinary following keeps a time headway
//! around two seconds; a `conflict_share` of pairs close in with a short
//! time to collision instead. Every generator takes an explicit seed so that
//! tests and benchmarks see identical samples across runs.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::errors::InferenceError;
use crate::labeling::{apply_rule_sets, RULE_BASED_DEFINITIONS};
use crate::types::{CarFollowingState, ConflictDefinition, Observation};

/// Parameters of the two-regime generator
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticConfig {
    /// Number of (follower, leader) pairs drawn
    pub num_pairs: usize,
    /// Mean follower speed
    pub speed_mean: f64,
    /// Follower speed standard deviation
    pub speed_std: f64,
    /// Mean closing speed
    pub relative_speed_mean: f64,
    /// Closing speed standard deviation
    pub relative_speed_std: f64,
    /// Mean time headway of ordinary following (seconds)
    pub headway_mean: f64,
    /// Time headway standard deviation
    pub headway_std: f64,
    /// Share of pairs drawn in the conflict regime
    pub conflict_share: f64,
    /// Mean time to collision in the conflict regime (seconds)
    pub conflict_ttc_mean: f64,
    /// Time-to-collision standard deviation
    pub conflict_ttc_std: f64,
    /// Leader vehicle length
    pub leader_length: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            num_pairs: 20_000,
            speed_mean: 20.0,
            speed_std: 6.0,
            relative_speed_mean: 1.5,
            relative_speed_std: 1.0,
            headway_mean: 1.8,
            headway_std: 0.5,
            conflict_share: 0.1,
            conflict_ttc_mean: 2.5,
            conflict_ttc_std: 0.8,
            leader_length: 4.5,
        }
    }
}

impl SyntheticConfig {
    /// Set the number of pairs.
    pub fn with_num_pairs(mut self, num_pairs: usize) -> Self {
        self.num_pairs = num_pairs;
        self
    }

    /// Set the share of conflict-regime pairs.
    pub fn with_conflict_share(mut self, share: f64) -> Self {
        self.conflict_share = share;
        self
    }
}

/// Draw follower/leader states.
///
/// # Errors
/// [`InferenceError::Configuration`] for a negative or non-finite standard
/// deviation, or a conflict share outside `[0, 1]`.
pub fn generate_states(config: &SyntheticConfig, seed: u64) -> Result<Vec<CarFollowingState>, InferenceError> {
    if !(0.0..=1.0).contains(&config.conflict_share) {
        return Err(InferenceError::Configuration {
            description: format!("conflict share {} is not a probability", config.conflict_share),
        });
    }
    let speed = normal(config.speed_mean, config.speed_std)?;
    let relative_speed = normal(config.relative_speed_mean, config.relative_speed_std)?;
    let headway = normal(config.headway_mean, config.headway_std)?;
    let ttc = normal(config.conflict_ttc_mean, config.conflict_ttc_std)?;

    let mut rng = StdRng::seed_from_u64(seed);
    let states = (0..config.num_pairs)
        .map(|_| {
            let v_follower = speed.sample(&mut rng).abs();
            let closing = relative_speed.sample(&mut rng).abs();
            let gap = if rng.gen::<f64>() < config.conflict_share {
                ttc.sample(&mut rng).abs() * closing
            } else {
                headway.sample(&mut rng).abs() * v_follower
            };
            CarFollowingState {
                position: 0.0,
                speed: v_follower,
                leader_position: gap + config.leader_length,
                leader_speed: v_follower - closing,
                leader_length: config.leader_length,
            }
        })
        .collect();
    Ok(states)
}

/// Draw closing observations (unlabeled).
pub fn generate_observations(config: &SyntheticConfig, seed: u64) -> Result<Vec<Observation>, InferenceError> {
    Ok(generate_states(config, seed)?
        .iter()
        .filter_map(CarFollowingState::to_observation)
        .collect())
}

/// Draw closing observations labeled by the three rule-based definitions.
pub fn generate_labeled(
    config: &SyntheticConfig,
    seed: u64,
) -> Result<(Vec<Observation>, Vec<ConflictDefinition>), InferenceError> {
    Ok(apply_rule_sets(generate_observations(config, seed)?, &RULE_BASED_DEFINITIONS))
}

/// One speed bin with well-separated regimes: `num_normal` spacings from
/// N(50, 8) and `num_conflict` labeled spacings from N(10, 3), all at
/// relative speed `level`. Single label column.
pub fn separated_bin(
    level: f64,
    num_normal: usize,
    num_conflict: usize,
    seed: u64,
) -> Result<Vec<Observation>, InferenceError> {
    let following = normal(50.0, 8.0)?;
    let conflict = normal(10.0, 3.0)?;
    let mut rng = StdRng::seed_from_u64(seed);

    let mut observations = Vec::with_capacity(num_normal + num_conflict);
    for _ in 0..num_normal {
        let s = following.sample(&mut rng).abs().max(0.1);
        observations.push(Observation::new(s, level, 20.0).with_labels([false]));
    }
    for _ in 0..num_conflict {
        let s = conflict.sample(&mut rng).abs().max(0.1);
        observations.push(Observation::new(s, level, 20.0).with_labels([true]));
    }
    Ok(observations)
}

fn normal(mean: f64, std: f64) -> Result<Normal<f64>, InferenceError> {
    Normal::new(mean, std).map_err(|e| InferenceError::Configuration {
        description: format!("normal({}, {}): {}", mean, std, e),
    })
}

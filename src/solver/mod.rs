//! Threshold selection: the missed-detection / false-alarm tradeoff per bin

pub mod threshold;

pub use threshold::{solve_threshold, SolvedThreshold, ThresholdCurves, ThresholdSolver};

//! Common utilities shared by the inference stages.
//!
//! This module contains the fixed numerical constants, evenly spaced grid
//! helpers, and the bin-level map helper that switches to rayon when the
//! `rayon` feature is enabled.

pub mod constants;
pub mod grid;
pub mod parallel;

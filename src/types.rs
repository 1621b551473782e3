//! Observation, conflict definition, and threshold output types
//!
//! This module defines the uniform intermediate representation consumed by
//! the inference engine and the write-once rows it produces.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::solver::SolvedThreshold;

/// Per-observation conflict flags, one per conflict definition in use.
///
/// Datasets carry between one and three definitions, so the flags stay inline.
pub type ConflictLabels = SmallVec<[bool; 4]>;

/// One car-following state of a (follower, leader) pair at one timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Net gap to the leading vehicle
    pub spacing: f64,
    /// Follower speed minus leader speed (positive when closing)
    pub relative_speed: f64,
    /// Follower (ego) speed
    pub absolute_speed: f64,
    /// Conflict flags indexed by [`ConflictDefinition::index`]
    pub labels: ConflictLabels,
}

impl Observation {
    /// Create an unlabeled observation
    pub fn new(spacing: f64, relative_speed: f64, absolute_speed: f64) -> Self {
        Self {
            spacing,
            relative_speed,
            absolute_speed,
            labels: ConflictLabels::new(),
        }
    }

    /// Replace the conflict flags
    pub fn with_labels<I: IntoIterator<Item = bool>>(mut self, labels: I) -> Self {
        self.labels = labels.into_iter().collect();
        self
    }

    /// Positive spacing and a closing approach
    #[inline]
    pub fn is_closing(&self) -> bool {
        self.spacing > 0.0 && self.relative_speed > 0.0
    }

    /// Time to collision at constant speeds (infinite when not closing)
    #[inline]
    pub fn time_to_collision(&self) -> f64 {
        if self.relative_speed > 0.0 {
            self.spacing / self.relative_speed
        } else {
            f64::INFINITY
        }
    }

    /// Whether this observation is flagged under `definition`
    #[inline]
    pub fn is_conflict(&self, definition: &ConflictDefinition) -> bool {
        self.labels.get(definition.index).copied().unwrap_or(false)
    }
}

/// Follower and leader kinematics along the lane at one timestamp.
///
/// Positions are longitudinal coordinates; the leader length is subtracted so
/// that spacing is bumper-to-bumper.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarFollowingState {
    /// Follower position
    pub position: f64,
    /// Follower speed
    pub speed: f64,
    /// Leader position
    pub leader_position: f64,
    /// Leader speed
    pub leader_speed: f64,
    /// Leader vehicle length
    pub leader_length: f64,
}

impl CarFollowingState {
    /// Net gap between the follower front and the leader rear
    #[inline]
    pub fn spacing(&self) -> f64 {
        (self.leader_position - self.position).abs() - self.leader_length
    }

    /// Follower speed minus leader speed
    #[inline]
    pub fn relative_speed(&self) -> f64 {
        self.speed - self.leader_speed
    }

    /// Convert to an [`Observation`], or `None` if the pair is not closing in.
    pub fn to_observation(&self) -> Option<Observation> {
        let obs = Observation::new(self.spacing(), self.relative_speed(), self.speed);
        obs.is_closing().then_some(obs)
    }
}

/// A named conflict-label column and its slot in [`Observation::labels`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConflictDefinition {
    /// Column name, e.g. `conflict_1`
    pub name: String,
    /// Position of the flag inside each observation's label set
    pub index: usize,
}

impl ConflictDefinition {
    /// Create a new conflict definition
    pub fn new(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index,
        }
    }

    /// Definitions for label columns in the given order
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Vec<Self> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| Self::new(n.as_ref(), i))
            .collect()
    }
}

/// One solved threshold, keyed by speed level, conflict definition and alpha
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRow {
    /// Representative relative speed of the bin
    pub speed_level: f64,
    /// Weight on missed detection (1 - alpha weighs false alarm)
    pub alpha: f64,
    /// Chosen spacing threshold
    pub threshold: f64,
    /// Upper integration bound: max(observed max conflict spacing, baseline peak)
    pub upper_bound: f64,
    /// Baseline probability mass on [0, upper_bound]
    pub cumulative_baseline_mass: f64,
    /// Conflict probability mass on [0, upper_bound]
    pub cumulative_conflict_mass: f64,
    /// Share of the bin's observations flagged as conflicts
    pub conflict_rate: f64,
    /// Conflict definition name
    pub conflict_definition: String,
}

impl ThresholdRow {
    /// Attach bin and definition keys to a solver result
    pub fn from_solved(speed_level: f64, definition: &str, solved: &SolvedThreshold) -> Self {
        Self {
            speed_level,
            alpha: solved.alpha,
            threshold: solved.threshold,
            upper_bound: solved.upper_bound,
            cumulative_baseline_mass: solved.total_baseline_mass,
            cumulative_conflict_mass: solved.total_conflict_mass,
            conflict_rate: solved.conflict_rate,
            conflict_definition: definition.to_string(),
        }
    }
}

/// All threshold rows of a run, ordered by definition, then level, then alpha
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThresholdTable {
    /// Rows in output order
    pub rows: Vec<ThresholdRow>,
}

impl ThresholdTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Append rows of one definition
    pub fn extend<I: IntoIterator<Item = ThresholdRow>>(&mut self, rows: I) {
        self.rows.extend(rows);
    }

    /// Number of rows
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table holds no rows
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows belonging to one conflict definition
    pub fn for_definition<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ThresholdRow> {
        self.rows.iter().filter(move |r| r.conflict_definition == name)
    }

    /// Distinct definition names in output order
    pub fn definitions(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for row in &self.rows {
            let name = row.conflict_definition.as_str();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Threshold for a (definition, level, alpha) key, if present
    pub fn lookup(&self, definition: &str, speed_level: f64, alpha: f64) -> Option<&ThresholdRow> {
        self.rows.iter().find(|r| {
            r.conflict_definition == definition
                && r.speed_level == speed_level
                && (r.alpha - alpha).abs() < 1e-9
        })
    }
}

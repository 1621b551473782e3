//! Conflict rule tables and the labeling function

use crate::types::{ConflictDefinition, ConflictLabels, Observation};

/// Half-open speed interval `(lower, upper]`; `None` leaves a side unbounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedRange {
    /// Exclusive lower bound
    pub lower: Option<f64>,
    /// Inclusive upper bound
    pub upper: Option<f64>,
}

impl SpeedRange {
    /// Every speed
    pub const ANY: Self = Self {
        lower: None,
        upper: None,
    };

    /// `(lower, +inf)`
    pub const fn above(lower: f64) -> Self {
        Self {
            lower: Some(lower),
            upper: None,
        }
    }

    /// `(lower, upper]`
    pub const fn between(lower: f64, upper: f64) -> Self {
        Self {
            lower: Some(lower),
            upper: Some(upper),
        }
    }

    /// `(-inf, upper]`
    pub const fn at_most(upper: f64) -> Self {
        Self {
            lower: None,
            upper: Some(upper),
        }
    }

    /// Whether `x` lies in the interval
    #[inline]
    pub fn contains(&self, x: f64) -> bool {
        self.lower.map_or(true, |lo| x > lo) && self.upper.map_or(true, |hi| x <= hi)
    }
}

/// Largest spacing still counted as a conflict
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpacingLimit {
    /// `k * relative_speed` (a time-to-collision bound of k seconds)
    RelativeSpeedMultiple(f64),
    /// `k * absolute_speed` (a time-headway bound of k seconds)
    AbsoluteSpeedMultiple(f64),
    /// A fixed distance
    Fixed(f64),
}

impl SpacingLimit {
    /// Limit evaluated for one observation
    #[inline]
    pub fn bound(&self, obs: &Observation) -> f64 {
        match *self {
            SpacingLimit::RelativeSpeedMultiple(k) => k * obs.relative_speed,
            SpacingLimit::AbsoluteSpeedMultiple(k) => k * obs.absolute_speed,
            SpacingLimit::Fixed(d) => d,
        }
    }
}

/// One row of a rule table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConflictRule {
    /// Relative speeds the rule applies to
    pub relative_speed: SpeedRange,
    /// Absolute speeds the rule applies to
    pub absolute_speed: SpeedRange,
    /// Spacing at or below which the state is a conflict
    pub limit: SpacingLimit,
}

impl ConflictRule {
    const fn new(relative_speed: SpeedRange, absolute_speed: SpeedRange, limit: SpacingLimit) -> Self {
        Self {
            relative_speed,
            absolute_speed,
            limit,
        }
    }

    /// Whether the rule flags `obs` as a conflict
    #[inline]
    pub fn matches(&self, obs: &Observation) -> bool {
        self.relative_speed.contains(obs.relative_speed)
            && self.absolute_speed.contains(obs.absolute_speed)
            && obs.spacing <= self.limit.bound(obs)
    }
}

/// A named conflict definition expressed as an ordered rule table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleSet {
    /// Label column produced by this rule set
    pub name: &'static str,
    /// Rules; a flag set by one rule is never cleared by another
    pub rules: &'static [ConflictRule],
}

impl RuleSet {
    /// Whether any rule flags `obs`
    #[inline]
    pub fn is_conflict(&self, obs: &Observation) -> bool {
        self.rules.iter().any(|rule| rule.matches(obs))
    }
}

use SpacingLimit::{AbsoluteSpeedMultiple, Fixed, RelativeSpeedMultiple};

/// Single time-to-collision bound of 3 s at any closing speed
pub const CONFLICT_1: RuleSet = RuleSet {
    name: "conflict_1",
    rules: &[ConflictRule::new(
        SpeedRange::above(0.0),
        SpeedRange::ANY,
        RelativeSpeedMultiple(3.0),
    )],
};

/// Time-to-collision bound that loosens as the closing speed drops
pub const CONFLICT_2: RuleSet = RuleSet {
    name: "conflict_2",
    rules: &[
        ConflictRule::new(SpeedRange::above(5.0), SpeedRange::ANY, RelativeSpeedMultiple(2.5)),
        ConflictRule::new(SpeedRange::between(2.0, 5.0), SpeedRange::ANY, RelativeSpeedMultiple(3.0)),
        ConflictRule::new(SpeedRange::between(0.0, 2.0), SpeedRange::ANY, RelativeSpeedMultiple(3.5)),
    ],
};

/// Closing-speed bands refined by ego speed; slow approaches fall back to
/// headway and fixed-gap bounds
pub const CONFLICT_3: RuleSet = RuleSet {
    name: "conflict_3",
    rules: &[
        ConflictRule::new(SpeedRange::above(5.0), SpeedRange::ANY, RelativeSpeedMultiple(2.5)),
        ConflictRule::new(SpeedRange::between(2.0, 5.0), SpeedRange::above(25.0), RelativeSpeedMultiple(3.5)),
        ConflictRule::new(SpeedRange::between(2.0, 5.0), SpeedRange::between(10.0, 25.0), RelativeSpeedMultiple(3.0)),
        ConflictRule::new(SpeedRange::between(2.0, 5.0), SpeedRange::at_most(10.0), RelativeSpeedMultiple(2.5)),
        ConflictRule::new(SpeedRange::between(0.0, 2.0), SpeedRange::above(5.0), AbsoluteSpeedMultiple(0.5)),
        ConflictRule::new(SpeedRange::between(0.0, 2.0), SpeedRange::between(2.0, 5.0), AbsoluteSpeedMultiple(0.3)),
        ConflictRule::new(SpeedRange::between(0.0, 2.0), SpeedRange::between(1.0, 2.0), Fixed(0.6)),
    ],
};

/// The three rule-based definitions, in column order
pub const RULE_BASED_DEFINITIONS: [RuleSet; 3] = [CONFLICT_1, CONFLICT_2, CONFLICT_3];

/// Flags of `obs` under each rule set, in order
pub fn label(obs: &Observation, rule_sets: &[RuleSet]) -> ConflictLabels {
    rule_sets.iter().map(|set| set.is_conflict(obs)).collect()
}

/// Label every observation, replacing any existing flags.
///
/// Returns the relabeled observations and the definitions describing the
/// new label columns.
pub fn apply_rule_sets(
    observations: Vec<Observation>,
    rule_sets: &[RuleSet],
) -> (Vec<Observation>, Vec<ConflictDefinition>) {
    let labeled = observations
        .into_iter()
        .map(|obs| {
            let labels = label(&obs, rule_sets);
            Observation { labels, ..obs }
        })
        .collect();
    let definitions = rule_sets
        .iter()
        .enumerate()
        .map(|(i, set)| ConflictDefinition::new(set.name, i))
        .collect();
    (labeled, definitions)
}

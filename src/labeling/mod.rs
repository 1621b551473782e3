//! Rule-based conflict labeling.
//!
//! A conflict definition is an ordered table of rules, each pairing a
//! relative-speed range (optionally narrowed by an absolute-speed range) with
//! a spacing limit. An observation is a conflict under a definition when any
//! of its rules matches. Labeling is a pure function of the observation.

pub mod rules;

pub use rules::{
    apply_rule_sets, label, ConflictRule, RuleSet, SpacingLimit, SpeedRange, CONFLICT_1,
    CONFLICT_2, CONFLICT_3, RULE_BASED_DEFINITIONS,
};

use serde::{Deserialize, Serialize};

use crate::units::Mm;

/// A field-book entry before reduction.
///
/// Every numeric field is already rounded to thousandths by construction;
/// `0` means "not observed". `reduced_level` is only read for the first
/// reading of a survey, where it is the benchmark elevation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawReading {
    pub back_sight: Mm,
    pub intermediate_sight: Mm,
    pub fore_sight: Mm,
    pub reduced_level: Mm,
    pub distance: Mm,
    pub remarks: String,
}

impl RawReading {
    /// True when at least one staff sight was booked.
    pub fn has_sight(&self) -> bool {
        !(self.back_sight.is_zero()
            && self.intermediate_sight.is_zero()
            && self.fore_sight.is_zero())
    }
}

/// Which branch of the sight-type dispatch produced a reading's difference.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReductionRule {
    /// First reading of the survey; RL supplied by the caller.
    Benchmark,
    /// IS taken right after a change point: `prev.bs - is`.
    ChangePointBackSight,
    /// IS against the nearest earlier IS: `prev_is - is`.
    LastIntermediate,
    /// IS with no earlier IS, against the nearest earlier BS: `prev_bs - is`.
    LastBackSight,
    /// FS against the nearest earlier IS: `prev_is - fs`.
    ForeSightFromIntermediate,
    /// A sight was booked but no reference sight exists in the history.
    NoReference,
    /// No IS or FS booked; RL carried forward unchanged.
    CarryForward,
}

impl ReductionRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReductionRule::Benchmark => "BENCHMARK",
            ReductionRule::ChangePointBackSight => "CHANGE_POINT_BACK_SIGHT",
            ReductionRule::LastIntermediate => "LAST_INTERMEDIATE",
            ReductionRule::LastBackSight => "LAST_BACK_SIGHT",
            ReductionRule::ForeSightFromIntermediate => "FORE_SIGHT_FROM_INTERMEDIATE",
            ReductionRule::NoReference => "NO_REFERENCE",
            ReductionRule::CarryForward => "CARRY_FORWARD",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "BENCHMARK" => Some(ReductionRule::Benchmark),
            "CHANGE_POINT_BACK_SIGHT" => Some(ReductionRule::ChangePointBackSight),
            "LAST_INTERMEDIATE" => Some(ReductionRule::LastIntermediate),
            "LAST_BACK_SIGHT" => Some(ReductionRule::LastBackSight),
            "FORE_SIGHT_FROM_INTERMEDIATE" => Some(ReductionRule::ForeSightFromIntermediate),
            "NO_REFERENCE" => Some(ReductionRule::NoReference),
            "CARRY_FORWARD" => Some(ReductionRule::CarryForward),
            _ => None,
        }
    }
}

/// A reduced field-book entry.
///
/// Produced once by [`crate::reduce`] and never edited afterwards; callers
/// hold these in traverse order and pass them back as `history`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    pub back_sight: Mm,
    pub intermediate_sight: Mm,
    pub fore_sight: Mm,
    pub rise: Mm,
    pub fall: Mm,
    pub reduced_level: Mm,
    pub distance: Mm,
    pub remarks: String,
    pub rule: ReductionRule,
}

impl Reading {
    /// True when at least one staff sight was booked.
    ///
    /// Readings that fail this still belong to the history; whether to show
    /// or persist them is the caller's decision.
    pub fn is_observed(&self) -> bool {
        !(self.back_sight.is_zero()
            && self.intermediate_sight.is_zero()
            && self.fore_sight.is_zero())
    }
}

/// Column totals printed under a field book.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summation {
    pub sum_bs: Mm,
    pub sum_fs: Mm,
    pub sum_rise: Mm,
    pub sum_fall: Mm,
}

/// Outcome of the arithmetic closure check.
///
/// Recomputed on every check; never stored with the survey.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureResult {
    pub summation: Summation,
    pub bs_minus_fs: Mm,
    pub rise_minus_fall: Mm,
    pub rl_last_minus_first: Mm,
    pub passed: bool,
}

use crate::{Mm, RawReading, Reading, ReductionRule};

/// Nearest earlier non-zero intermediate sight, scanning from the end.
fn nearest_intermediate(history: &[Reading]) -> Option<Mm> {
    history
        .iter()
        .rev()
        .map(|r| r.intermediate_sight)
        .find(|v| !v.is_zero())
}

/// Nearest earlier non-zero back sight, scanning from the end.
fn nearest_back_sight(history: &[Reading]) -> Option<Mm> {
    history
        .iter()
        .rev()
        .map(|r| r.back_sight)
        .find(|v| !v.is_zero())
}

/// Sight-type dispatch. Returns the rule that fired and the signed
/// difference (positive = rise).
fn difference(raw: &RawReading, prev: &Reading, history: &[Reading]) -> (ReductionRule, Mm) {
    // 1) Intermediate sight booked.
    if !raw.intermediate_sight.is_zero() {
        // 1a) Previous line was a change point (BS and FS on the same line).
        if !prev.back_sight.is_zero() && !prev.fore_sight.is_zero() {
            return (
                ReductionRule::ChangePointBackSight,
                prev.back_sight - raw.intermediate_sight,
            );
        }
        // 1b) Run of intermediates: nearest IS wins, then nearest BS.
        if let Some(prev_is) = nearest_intermediate(history) {
            return (
                ReductionRule::LastIntermediate,
                prev_is - raw.intermediate_sight,
            );
        }
        if let Some(prev_bs) = nearest_back_sight(history) {
            return (
                ReductionRule::LastBackSight,
                prev_bs - raw.intermediate_sight,
            );
        }
        return (ReductionRule::NoReference, Mm::ZERO);
    }

    // 2) Fore sight booked (and no IS).
    if !raw.fore_sight.is_zero() {
        return match nearest_intermediate(history) {
            Some(prev_is) => (
                ReductionRule::ForeSightFromIntermediate,
                prev_is - raw.fore_sight,
            ),
            None => (ReductionRule::NoReference, Mm::ZERO),
        };
    }

    // 3) Nothing to reduce against.
    (ReductionRule::CarryForward, Mm::ZERO)
}

/// Reduce one raw reading against the readings already reduced for the
/// same survey.
///
/// Pure: `history` is only read, and the result is for the caller to
/// append. With an empty history the reading is the benchmark and keeps
/// the caller-supplied reduced level.
pub fn reduce(raw: &RawReading, history: &[Reading]) -> Reading {
    let Some(prev) = history.last() else {
        return Reading {
            back_sight: raw.back_sight,
            intermediate_sight: raw.intermediate_sight,
            fore_sight: raw.fore_sight,
            rise: Mm::ZERO,
            fall: Mm::ZERO,
            reduced_level: raw.reduced_level,
            distance: raw.distance,
            remarks: raw.remarks.clone(),
            rule: ReductionRule::Benchmark,
        };
    };

    let (rule, diff) = difference(raw, prev, history);

    let (rise, fall) = if diff.is_positive() {
        (diff, Mm::ZERO)
    } else if diff.is_negative() {
        (Mm::ZERO, -diff)
    } else {
        (Mm::ZERO, Mm::ZERO)
    };

    let reduced_level = if !rise.is_zero() {
        prev.reduced_level + rise
    } else if !fall.is_zero() {
        prev.reduced_level - fall
    } else {
        prev.reduced_level
    };

    Reading {
        back_sight: raw.back_sight,
        intermediate_sight: raw.intermediate_sight,
        fore_sight: raw.fore_sight,
        rise,
        fall,
        reduced_level,
        distance: raw.distance,
        remarks: raw.remarks.clone(),
        rule,
    }
}

/// Reduce an ordered batch from scratch, feeding each result back in as
/// history for the next.
pub fn reduce_all(raws: &[RawReading]) -> Vec<Reading> {
    let mut out: Vec<Reading> = Vec::with_capacity(raws.len());
    for raw in raws {
        let reading = reduce(raw, &out);
        out.push(reading);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(bs: i64, is: i64, fs: i64) -> RawReading {
        RawReading {
            back_sight: Mm::new(bs),
            intermediate_sight: Mm::new(is),
            fore_sight: Mm::new(fs),
            ..Default::default()
        }
    }

    fn benchmark(bs: i64, rl: i64) -> RawReading {
        RawReading {
            back_sight: Mm::new(bs),
            reduced_level: Mm::new(rl),
            ..Default::default()
        }
    }

    #[test]
    fn change_point_back_sight_applies_to_following_intermediate() {
        // Line 2 is a change point (FS then BS on one line).
        let history = reduce_all(&[benchmark(1_000, 50_000), raw(2_000, 0, 800)]);
        assert_eq!(history[1].rule, ReductionRule::NoReference);

        let r = reduce(&raw(0, 1_600, 0), &history);
        assert_eq!(r.rule, ReductionRule::ChangePointBackSight);
        assert_eq!(r.rise, Mm::new(400));
        assert_eq!(r.reduced_level, Mm::new(50_400));
    }

    #[test]
    fn intermediate_prefers_nearest_intermediate_over_back_sight() {
        let history = reduce_all(&[benchmark(1_500, 100_000), raw(0, 1_250, 0)]);
        let r = reduce(&raw(0, 1_900, 0), &history);
        assert_eq!(r.rule, ReductionRule::LastIntermediate);
        assert_eq!(r.fall, Mm::new(650));
        assert_eq!(r.rise, Mm::ZERO);
        assert_eq!(r.reduced_level, Mm::new(99_600));
    }

    #[test]
    fn first_intermediate_falls_back_to_back_sight() {
        let history = reduce_all(&[benchmark(1_500, 100_000)]);
        let r = reduce(&raw(0, 1_250, 0), &history);
        assert_eq!(r.rule, ReductionRule::LastBackSight);
        assert_eq!(r.rise, Mm::new(250));
        assert_eq!(r.reduced_level, Mm::new(100_250));
    }

    #[test]
    fn fore_sight_reduces_against_nearest_intermediate() {
        let history = reduce_all(&[benchmark(1_500, 100_000), raw(0, 1_250, 0)]);
        let r = reduce(&raw(2_000, 0, 800), &history);
        assert_eq!(r.rule, ReductionRule::ForeSightFromIntermediate);
        assert_eq!(r.rise, Mm::new(450));
        assert_eq!(r.reduced_level, Mm::new(100_700));
    }

    #[test]
    fn fore_sight_without_intermediate_has_no_reference() {
        let history = reduce_all(&[benchmark(1_500, 100_000)]);
        let r = reduce(&raw(0, 0, 1_200), &history);
        assert_eq!(r.rule, ReductionRule::NoReference);
        assert_eq!((r.rise, r.fall), (Mm::ZERO, Mm::ZERO));
        assert_eq!(r.reduced_level, Mm::new(100_000));
    }

    #[test]
    fn equal_sights_give_zero_difference() {
        let history = reduce_all(&[benchmark(1_500, 100_000)]);
        let r = reduce(&raw(0, 1_500, 0), &history);
        assert_eq!(r.rule, ReductionRule::LastBackSight);
        assert_eq!((r.rise, r.fall), (Mm::ZERO, Mm::ZERO));
        assert_eq!(r.reduced_level, Mm::new(100_000));
    }

    #[test]
    fn back_sight_only_line_carries_forward() {
        let history = reduce_all(&[benchmark(1_500, 100_000)]);
        let r = reduce(&raw(1_700, 0, 0), &history);
        assert_eq!(r.rule, ReductionRule::CarryForward);
        assert_eq!(r.reduced_level, Mm::new(100_000));
    }

    #[test]
    fn reduce_does_not_touch_history() {
        let history = reduce_all(&[benchmark(1_500, 100_000), raw(0, 1_250, 0)]);
        let before = history.clone();
        let _ = reduce(&raw(0, 900, 0), &history);
        assert_eq!(history, before);
    }
}

use std::fmt;

use crate::{ClosureResult, Reading, Summation};

/// `check` was called before any reading exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyHistory;

impl fmt::Display for EmptyHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "closure check requires at least one reading")
    }
}

impl std::error::Error for EmptyHistory {}

/// Column totals over every reading in `history`.
pub fn summarize(history: &[Reading]) -> Summation {
    let mut s = Summation::default();
    for r in history {
        s.sum_bs += r.back_sight;
        s.sum_fs += r.fore_sight;
        s.sum_rise += r.rise;
        s.sum_fall += r.fall;
    }
    s
}

/// Arithmetic closure check:
/// `ΣBS − ΣFS == ΣRise − ΣFall == RL(last) − RL(first)`.
///
/// Covers the whole history, including readings the caller chose not to
/// display. Equality is exact on thousandths; there is no tolerance.
pub fn check(history: &[Reading]) -> Result<ClosureResult, EmptyHistory> {
    let (first, last) = match (history.first(), history.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(EmptyHistory),
    };

    let summation = summarize(history);
    let bs_minus_fs = summation.sum_bs - summation.sum_fs;
    let rise_minus_fall = summation.sum_rise - summation.sum_fall;
    let rl_last_minus_first = last.reduced_level - first.reduced_level;

    Ok(ClosureResult {
        summation,
        bs_minus_fs,
        rise_minus_fall,
        rl_last_minus_first,
        passed: bs_minus_fs == rise_minus_fall && rise_minus_fall == rl_last_minus_first,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{reduce_all, Mm, RawReading};

    #[test]
    fn empty_history_is_an_error() {
        assert_eq!(check(&[]), Err(EmptyHistory));
        assert_eq!(
            EmptyHistory.to_string(),
            "closure check requires at least one reading"
        );
    }

    #[test]
    fn single_reading_balances_only_without_sights() {
        let bm = RawReading {
            reduced_level: Mm::new(100_000),
            ..Default::default()
        };
        let res = check(&reduce_all(&[bm])).unwrap();
        assert!(res.passed);
        assert_eq!(res.rl_last_minus_first, Mm::ZERO);

        let bm_with_bs = RawReading {
            back_sight: Mm::new(1_500),
            reduced_level: Mm::new(100_000),
            ..Default::default()
        };
        let res = check(&reduce_all(&[bm_with_bs])).unwrap();
        assert!(!res.passed);
        assert_eq!(res.bs_minus_fs, Mm::new(1_500));
    }

    #[test]
    fn summation_counts_every_column() {
        let readings = reduce_all(&[
            RawReading {
                back_sight: Mm::new(1_500),
                reduced_level: Mm::new(100_000),
                ..Default::default()
            },
            RawReading {
                intermediate_sight: Mm::new(1_250),
                ..Default::default()
            },
            RawReading {
                intermediate_sight: Mm::new(1_900),
                ..Default::default()
            },
        ]);
        let s = summarize(&readings);
        assert_eq!(s.sum_bs, Mm::new(1_500));
        assert_eq!(s.sum_fs, Mm::ZERO);
        assert_eq!(s.sum_rise, Mm::new(250));
        assert_eq!(s.sum_fall, Mm::new(650));
    }
}

//! Fixed-point level type.
//!
//! # Motivation
//!
//! Every staff reading, rise, fall and reduced level in a field book is
//! booked to three decimal places (millimetres when readings are in metres).
//! The closure check compares three derived quantities for *exact* equality,
//! so the values must be held in a representation where "rounded to 3
//! decimals" is a property of the type rather than of each call site.
//!
//! `Mm` wraps an `i64` count of thousandths. Rounding happens exactly once,
//! when a value enters the system (see [`crate::parse`] and
//! [`Mm::from_metres`]); all later sums and differences are integer
//! arithmetic and stay exact.
//!
//! # Scale
//!
//! 1.000 = `Mm(1_000)`. There is no `From<i64>` impl; use [`Mm::new`] when a
//! raw integer is known to be thousandths.
//!
//! # Range
//!
//! Values entering the system are limited to `|v| <= 10 000 000.000`
//! ([`Mm::MAX_ABS`]). Parsing and [`Mm::from_metres`] refuse anything larger.
//! Sums, differences and running levels over bounded inputs stay far inside
//! `i64`, so the operators below are plain integer arithmetic.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Thousandths per whole unit.
pub const MM_SCALE: i64 = 1_000;

// ---------------------------------------------------------------------------
// Mm newtype
// ---------------------------------------------------------------------------

/// A length or elevation rounded to 3 decimal places, stored as thousandths.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Mm(i64);

impl Mm {
    /// Zero, which field books read as "not observed".
    pub const ZERO: Mm = Mm(0);

    /// Largest magnitude accepted at the input boundary (10 000 000.000).
    pub const MAX_ABS: Mm = Mm(10_000_000_000);

    /// Construct from a raw count of thousandths.
    #[inline]
    pub const fn new(raw: i64) -> Self {
        Mm(raw)
    }

    /// Extract the underlying count of thousandths.
    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Round a floating-point value to the nearest thousandth
    /// (half away from zero).
    ///
    /// Returns `None` for NaN, infinities, and magnitudes above
    /// [`Mm::MAX_ABS`].
    pub fn from_metres(v: f64) -> Option<Mm> {
        if !v.is_finite() {
            return None;
        }
        let scaled = (v * MM_SCALE as f64).round();
        // MAX_ABS is exactly representable as f64, so the cast below is exact.
        if scaled.abs() > Mm::MAX_ABS.0 as f64 {
            return None;
        }
        Some(Mm(scaled as i64))
    }

    /// True when `|self| <= MAX_ABS`.
    #[inline]
    pub fn within_input_range(self) -> bool {
        self.0.unsigned_abs() <= Mm::MAX_ABS.0.unsigned_abs()
    }

    /// Lossy conversion for display sinks and JSON output.
    #[inline]
    pub fn to_metres(self) -> f64 {
        self.0 as f64 / MM_SCALE as f64
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub fn is_negative(self) -> bool {
        self.0 < 0
    }
}

// ---------------------------------------------------------------------------
// Arithmetic operators (closed over Mm)
// ---------------------------------------------------------------------------

impl Add for Mm {
    type Output = Mm;
    #[inline]
    fn add(self, rhs: Mm) -> Mm {
        Mm(self.0 + rhs.0)
    }
}

impl Sub for Mm {
    type Output = Mm;
    #[inline]
    fn sub(self, rhs: Mm) -> Mm {
        Mm(self.0 - rhs.0)
    }
}

impl Neg for Mm {
    type Output = Mm;
    #[inline]
    fn neg(self) -> Mm {
        Mm(-self.0)
    }
}

impl AddAssign for Mm {
    #[inline]
    fn add_assign(&mut self, rhs: Mm) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Mm {
    #[inline]
    fn sub_assign(&mut self, rhs: Mm) {
        self.0 -= rhs.0;
    }
}

impl Sum for Mm {
    fn sum<I: Iterator<Item = Mm>>(iter: I) -> Mm {
        iter.fold(Mm::ZERO, |acc, v| acc + v)
    }
}

impl<'a> Sum<&'a Mm> for Mm {
    fn sum<I: Iterator<Item = &'a Mm>>(iter: I) -> Mm {
        iter.copied().sum()
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for Mm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / MM_SCALE;
        let frac = (self.0 % MM_SCALE).abs();
        // -0.250 truncates to whole == 0; keep the sign.
        if self.0 < 0 && whole == 0 {
            write!(f, "-{whole}.{frac:03}")
        } else {
            write!(f, "{whole}.{frac:03}")
        }
    }
}

// ---------------------------------------------------------------------------
// Serde: numbers on the wire, thousandths in memory
// ---------------------------------------------------------------------------

impl Serialize for Mm {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_metres())
    }
}

impl<'de> Deserialize<'de> for Mm {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let v = f64::deserialize(deserializer)?;
        Mm::from_metres(v)
            .ok_or_else(|| serde::de::Error::custom(format!("level value out of range: {v}")))
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

//! Numeric parsing at the caller boundary.
//!
//! Field-book entries arrive as text. This module turns them into [`Mm`]
//! values before anything reaches the reduction engine, which never sees
//! unparsed input.
//!
//! Two conventions are offered:
//! - [`parse_sight`]: blank means "not observed" and becomes `0`. This is the
//!   convention the closure arithmetic relies on.
//! - [`parse_optional`]: blank becomes `None`, for callers that want to keep
//!   "not provided" distinct from an explicit zero.

use std::fmt;

use crate::types::RawReading;
use crate::units::{Mm, MM_SCALE};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors produced while parsing a numeric field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The field was blank where a value is required.
    Empty { field: &'static str },
    /// The text is not a plain decimal number.
    Invalid { field: &'static str, raw: String },
    /// The number does not fit the thousandths range.
    OutOfRange { field: &'static str, raw: String },
}

impl ParseError {
    pub fn field(&self) -> &'static str {
        match self {
            ParseError::Empty { field }
            | ParseError::Invalid { field, .. }
            | ParseError::OutOfRange { field, .. } => field,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Empty { field } => write!(f, "field '{field}' is empty"),
            ParseError::Invalid { field, raw } => {
                write!(f, "field '{field}': cannot parse '{raw}' as a number")
            }
            ParseError::OutOfRange { field, raw } => {
                write!(f, "field '{field}': value '{raw}' is out of range")
            }
        }
    }
}

impl std::error::Error for ParseError {}

// ---------------------------------------------------------------------------
// Decimal conversion
// ---------------------------------------------------------------------------

/// Convert a decimal string to thousandths deterministically.
///
/// Rules:
/// - Accepts an optional leading `+` or `-`.
/// - Accepts an optional fractional part separated by `.`.
/// - More than 3 fractional digits are rounded half away from zero on the
///   decimal text itself, so `"1.2345"` is `1.235`.
/// - Rejects blank input, exponents, `NaN`/`inf`, and anything that is not
///   ASCII digits around a single `.`.
/// - Rejects magnitudes above [`Mm::MAX_ABS`] with `OutOfRange`.
/// - Does **not** use floating-point at any stage.
pub fn parse_decimal(s: &str, field: &'static str) -> Result<Mm, ParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ParseError::Empty { field });
    }

    let invalid = || ParseError::Invalid {
        field,
        raw: s.to_string(),
    };
    let out_of_range = || ParseError::OutOfRange {
        field,
        raw: s.to_string(),
    };

    let (negative, digits) = if let Some(rest) = s.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = s.strip_prefix('+') {
        (false, rest)
    } else {
        (false, s)
    };

    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, f),
        None => (digits, ""),
    };

    let all_digits = |p: &str| p.chars().all(|c| c.is_ascii_digit());
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid());
    }
    if !all_digits(int_part) || !all_digits(frac_part) {
        return Err(invalid());
    }

    let int_val: i64 = if int_part.is_empty() {
        0
    } else {
        int_part.parse::<i64>().map_err(|_| out_of_range())?
    };

    // First three fractional digits, zero-padded; the fourth decides rounding.
    let mut frac_val: i64 = 0;
    let mut seen = 0;
    for c in frac_part.chars().take(3) {
        frac_val = frac_val * 10 + i64::from(c as u8 - b'0');
        seen += 1;
    }
    while seen < 3 {
        frac_val *= 10;
        seen += 1;
    }
    let round_up = frac_part
        .chars()
        .nth(3)
        .map(|c| c >= '5')
        .unwrap_or(false);

    let mut thousandths = int_val
        .checked_mul(MM_SCALE)
        .and_then(|v| v.checked_add(frac_val))
        .ok_or_else(out_of_range)?;
    if round_up {
        thousandths = thousandths.checked_add(1).ok_or_else(out_of_range)?;
    }

    let value = Mm::new(if negative { -thousandths } else { thousandths });
    if !value.within_input_range() {
        return Err(out_of_range());
    }
    Ok(value)
}

/// Parse a field keeping "not provided" distinct from zero.
pub fn parse_optional(s: &str, field: &'static str) -> Result<Option<Mm>, ParseError> {
    if s.trim().is_empty() {
        return Ok(None);
    }
    parse_decimal(s, field).map(Some)
}

/// Parse a sight/distance/level field where blank means "not observed".
pub fn parse_sight(s: &str, field: &'static str) -> Result<Mm, ParseError> {
    Ok(parse_optional(s, field)?.unwrap_or(Mm::ZERO))
}

// ---------------------------------------------------------------------------
// Whole-entry parsing
// ---------------------------------------------------------------------------

/// One field-book line as typed by the surveyor.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldInput<'a> {
    pub back_sight: &'a str,
    pub intermediate_sight: &'a str,
    pub fore_sight: &'a str,
    pub reduced_level: &'a str,
    pub distance: &'a str,
    pub remarks: &'a str,
}

impl FieldInput<'_> {
    /// Parse every numeric field (blank = 0) into a [`RawReading`].
    ///
    /// Fields are checked in column order, so the error names the first bad
    /// column the surveyor would see.
    pub fn parse(&self) -> Result<RawReading, ParseError> {
        Ok(RawReading {
            back_sight: parse_sight(self.back_sight, "back_sight")?,
            intermediate_sight: parse_sight(self.intermediate_sight, "intermediate_sight")?,
            fore_sight: parse_sight(self.fore_sight, "fore_sight")?,
            reduced_level: parse_sight(self.reduced_level, "reduced_level")?,
            distance: parse_sight(self.distance, "distance")?,
            remarks: self.remarks.trim().to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

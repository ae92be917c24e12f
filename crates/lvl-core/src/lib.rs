//! lvl-core
//!
//! Rise & Fall reduction of a leveling field book.
//!
//! - `reduce`: one raw reading + the survey's history so far -> reduced reading
//! - `check`: arithmetic closure check over the whole history
//! - `Mm`: fixed-point thousandths so "rounded to 3 decimals" holds everywhere
//! - `parse`: text -> `Mm` at the caller boundary
//!
//! Pure deterministic logic. No IO, no logging, no shared state. The caller
//! owns the history and serializes calls for one survey in traverse order.

mod closure;
mod engine;
mod survey;
mod types;

pub mod parse;
pub mod units;

pub use closure::{check, summarize, EmptyHistory};
pub use engine::{reduce, reduce_all};
pub use parse::{parse_decimal, parse_optional, parse_sight, FieldInput, ParseError};
pub use survey::Survey;
pub use types::{ClosureResult, RawReading, Reading, ReductionRule, Summation};
pub use units::{Mm, MM_SCALE};

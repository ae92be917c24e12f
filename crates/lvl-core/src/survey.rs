use crate::{check, reduce, ClosureResult, EmptyHistory, RawReading, Reading};

/// An in-memory survey: the ordered, append-only history of one leveling
/// run.
///
/// Owned by the caller. The engine functions never keep a reference to it
/// between calls; this type only sequences `reduce` + append.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Survey {
    readings: Vec<Reading>,
}

impl Survey {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from readings already reduced elsewhere (e.g. loaded from a
    /// store), in traverse order.
    pub fn from_history(readings: Vec<Reading>) -> Self {
        Self { readings }
    }

    /// Reduce `raw` against the current history and append it.
    pub fn record(&mut self, raw: &RawReading) -> &Reading {
        let reading = reduce(raw, &self.readings);
        self.readings.push(reading);
        &self.readings[self.readings.len() - 1]
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    /// Readings with at least one sight booked, i.e. the lines a field book
    /// would print.
    pub fn observed(&self) -> impl Iterator<Item = &Reading> {
        self.readings.iter().filter(|r| r.is_observed())
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn check(&self) -> Result<ClosureResult, EmptyHistory> {
        check(&self.readings)
    }

    /// Reset: drop the whole history.
    pub fn clear(&mut self) {
        self.readings.clear();
    }
}

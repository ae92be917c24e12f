use anyhow::{bail, Result};
use lvl_core::{reduce, ClosureResult, RawReading, Reading, Survey};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::ReadingStore;

/// Knobs applied around the engine when booking a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordPolicy {
    /// Append readings that carry no sight at all. When false they are
    /// reduced and returned but never enter the history.
    pub record_silent_readings: bool,
    /// Refuse a first reading whose reduced level is zero.
    pub require_benchmark: bool,
}

impl Default for RecordPolicy {
    fn default() -> Self {
        Self {
            record_silent_readings: true,
            require_benchmark: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Recorded {
    pub reading: Reading,
    /// Position in the history; `None` when the reading was not appended.
    pub seq: Option<i64>,
    pub observed: bool,
}

/// Apply `policy` to one raw line on top of `survey`.
///
/// Returns the reduced reading and whether it entered `survey`. A dropped
/// silent reading is reduced against the history but never appended.
fn book(
    survey: &mut Survey,
    project_id: Uuid,
    raw: &RawReading,
    policy: RecordPolicy,
) -> Result<(Reading, bool)> {
    if survey.is_empty() && policy.require_benchmark && raw.reduced_level.is_zero() {
        bail!("first reading of project {project_id} needs a benchmark reduced level");
    }
    if !raw.has_sight() && !policy.record_silent_readings {
        debug!(%project_id, "silent reading not recorded");
        return Ok((reduce(raw, survey.readings()), false));
    }
    Ok((survey.record(raw).clone(), true))
}

/// Load history, reduce `raw` against it, append the result.
///
/// Not safe to call concurrently for the same project: two callers that
/// load the same history reduce against the same predecessor. The SQLite
/// store rejects the second append rather than storing both.
pub async fn record_reading<S: ReadingStore + ?Sized>(
    store: &S,
    project_id: Uuid,
    raw: &RawReading,
    policy: RecordPolicy,
) -> Result<Recorded> {
    let mut survey = Survey::from_history(store.history(project_id).await?);
    let (reading, kept) = book(&mut survey, project_id, raw, policy)?;
    let observed = reading.is_observed();
    if !kept {
        return Ok(Recorded {
            reading,
            seq: None,
            observed,
        });
    }

    let seq = store.append(project_id, &reading).await?;
    info!(
        %project_id,
        seq,
        rule = reading.rule.as_str(),
        rl = %reading.reduced_level,
        "reading recorded"
    );

    Ok(Recorded {
        reading,
        seq: Some(seq),
        observed,
    })
}

/// Book several lines in order under one policy, as [`record_reading`]
/// would one at a time, then append them in a single
/// [`ReadingStore::append_all`].
///
/// A policy refusal or a store error leaves the history as it was.
pub async fn record_readings<S: ReadingStore + ?Sized>(
    store: &S,
    project_id: Uuid,
    raws: &[RawReading],
    policy: RecordPolicy,
) -> Result<Vec<Recorded>> {
    let mut survey = Survey::from_history(store.history(project_id).await?);
    let mut booked = Vec::with_capacity(raws.len());
    for raw in raws {
        booked.push(book(&mut survey, project_id, raw, policy)?);
    }

    let pending: Vec<Reading> = booked
        .iter()
        .filter(|(_, kept)| *kept)
        .map(|(r, _)| r.clone())
        .collect();
    let mut seqs = store.append_all(project_id, &pending).await?.into_iter();
    info!(
        %project_id,
        rows = raws.len(),
        recorded = pending.len(),
        "readings recorded"
    );

    Ok(booked
        .into_iter()
        .map(|(reading, kept)| Recorded {
            observed: reading.is_observed(),
            seq: if kept { seqs.next() } else { None },
            reading,
        })
        .collect())
}

/// Closure check over the stored history of a project.
pub async fn run_check<S: ReadingStore + ?Sized>(
    store: &S,
    project_id: Uuid,
) -> Result<ClosureResult> {
    let survey = Survey::from_history(store.history(project_id).await?);
    let result = survey.check()?;
    info!(%project_id, passed = result.passed, "closure check");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use lvl_core::{Mm, ReductionRule};

    #[tokio::test]
    async fn require_benchmark_refuses_zero_first_level() {
        let store = MemoryStore::new();
        let pid = Uuid::new_v4();
        let policy = RecordPolicy {
            require_benchmark: true,
            ..Default::default()
        };

        let raw = RawReading {
            back_sight: Mm::new(1_500),
            ..Default::default()
        };
        let err = record_reading(&store, pid, &raw, policy).await.unwrap_err();
        assert!(err.to_string().contains("benchmark"), "got: {err}");
        assert!(store.history(pid).await.unwrap().is_empty());

        let raw = RawReading {
            reduced_level: Mm::new(100_000),
            ..raw
        };
        let rec = record_reading(&store, pid, &raw, policy).await.unwrap();
        assert_eq!(rec.seq, Some(1));
        assert_eq!(rec.reading.rule, ReductionRule::Benchmark);
    }

    #[tokio::test]
    async fn batch_matches_one_at_a_time_and_skips_dropped_lines() {
        let policy = RecordPolicy {
            record_silent_readings: false,
            ..Default::default()
        };
        let raws = vec![
            RawReading {
                back_sight: Mm::new(1_500),
                reduced_level: Mm::new(100_000),
                ..Default::default()
            },
            RawReading {
                remarks: "hedge".to_string(),
                ..Default::default()
            },
            RawReading {
                intermediate_sight: Mm::new(1_250),
                ..Default::default()
            },
        ];

        let single = MemoryStore::new();
        let pid = Uuid::new_v4();
        let mut one_by_one = Vec::new();
        for raw in &raws {
            one_by_one.push(record_reading(&single, pid, raw, policy).await.unwrap());
        }

        let batch = MemoryStore::new();
        let recs = record_readings(&batch, pid, &raws, policy).await.unwrap();

        let seqs: Vec<_> = recs.iter().map(|r| r.seq).collect();
        assert_eq!(seqs, vec![Some(1), None, Some(2)]);
        for (a, b) in recs.iter().zip(&one_by_one) {
            assert_eq!(a.reading, b.reading);
            assert_eq!(a.seq, b.seq);
        }
        assert_eq!(
            batch.history(pid).await.unwrap(),
            single.history(pid).await.unwrap()
        );
    }

    #[tokio::test]
    async fn batch_refused_by_policy_appends_nothing() {
        let store = MemoryStore::new();
        let pid = Uuid::new_v4();
        let policy = RecordPolicy {
            require_benchmark: true,
            ..Default::default()
        };
        let raws = [RawReading {
            back_sight: Mm::new(1_500),
            ..Default::default()
        }];
        assert!(record_readings(&store, pid, &raws, policy).await.is_err());
        assert!(store.history(pid).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn run_check_on_empty_project_errors() {
        let store = MemoryStore::new();
        let err = run_check(&store, Uuid::new_v4()).await.unwrap_err();
        assert!(err.to_string().contains("at least one reading"));
    }
}

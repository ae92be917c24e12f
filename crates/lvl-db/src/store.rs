use std::collections::BTreeMap;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use lvl_core::{Mm, Reading, ReductionRule};
use sqlx::{Executor, Row, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

/// Append-only history of reduced readings, one per project.
///
/// `history` must return readings in the order they were appended. Callers
/// serialize `append` per project; the store only guarantees it will not
/// silently accept two readings at the same position.
#[async_trait]
pub trait ReadingStore: Send + Sync {
    async fn history(&self, project_id: Uuid) -> Result<Vec<Reading>>;

    /// Append one reading; returns its 1-based position.
    async fn append(&self, project_id: Uuid, reading: &Reading) -> Result<i64>;

    /// Append `readings` in order, all or none; returns their positions.
    async fn append_all(&self, project_id: Uuid, readings: &[Reading]) -> Result<Vec<i64>>;

    /// Drop the whole history of a project; returns the number removed.
    async fn clear(&self, project_id: Uuid) -> Result<u64>;
}

// ---------------------------------------------------------------------------
// SQLite
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to `url` and bring the schema up to date.
    pub async fn open(url: &str) -> Result<Self> {
        let pool = crate::connect(url).await?;
        crate::migrate(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl ReadingStore for SqliteStore {
    async fn history(&self, project_id: Uuid) -> Result<Vec<Reading>> {
        let rows = sqlx::query(
            r#"
            select back_sight_mm, intermediate_mm, fore_sight_mm, rise_mm, fall_mm,
                   reduced_level_mm, distance_mm, remarks, rule
            from readings
            where project_id = ?1
            order by seq asc
            "#,
        )
        .bind(project_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("load history failed")?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let rule: String = row.try_get("rule")?;
            out.push(Reading {
                back_sight: Mm::new(row.try_get("back_sight_mm")?),
                intermediate_sight: Mm::new(row.try_get("intermediate_mm")?),
                fore_sight: Mm::new(row.try_get("fore_sight_mm")?),
                rise: Mm::new(row.try_get("rise_mm")?),
                fall: Mm::new(row.try_get("fall_mm")?),
                reduced_level: Mm::new(row.try_get("reduced_level_mm")?),
                distance: Mm::new(row.try_get("distance_mm")?),
                remarks: row.try_get("remarks")?,
                rule: ReductionRule::parse(&rule)
                    .ok_or_else(|| anyhow!("invalid reduction rule in db: {rule}"))?,
            });
        }
        Ok(out)
    }

    async fn append(&self, project_id: Uuid, reading: &Reading) -> Result<i64> {
        let seq = insert_reading(&self.pool, project_id, reading).await?;
        debug!(%project_id, seq, rule = reading.rule.as_str(), "reading appended");
        Ok(seq)
    }

    async fn append_all(&self, project_id: Uuid, readings: &[Reading]) -> Result<Vec<i64>> {
        let mut tx = self.pool.begin().await.context("begin append tx failed")?;
        let mut seqs = Vec::with_capacity(readings.len());
        for reading in readings {
            seqs.push(insert_reading(&mut *tx, project_id, reading).await?);
        }
        tx.commit().await.context("commit append tx failed")?;

        debug!(%project_id, appended = seqs.len(), "readings appended");
        Ok(seqs)
    }

    async fn clear(&self, project_id: Uuid) -> Result<u64> {
        let res = sqlx::query("delete from readings where project_id = ?1")
            .bind(project_id.to_string())
            .execute(&self.pool)
            .await
            .context("clear readings failed")?;
        Ok(res.rows_affected())
    }
}

/// Insert one reading at the next position of `project_id`.
async fn insert_reading<'e, E>(exec: E, project_id: Uuid, reading: &Reading) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    // seq is derived inside the insert; a racing writer that computes the
    // same seq hits the (project_id, seq) primary key instead of
    // interleaving.
    let (seq,): (i64,) = sqlx::query_as(
        r#"
        insert into readings (
          project_id, seq,
          back_sight_mm, intermediate_mm, fore_sight_mm, rise_mm, fall_mm,
          reduced_level_mm, distance_mm, remarks, observed, rule, recorded_at_utc
        )
        select
          ?1, coalesce(max(seq), 0) + 1,
          ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12
        from readings
        where project_id = ?1
        returning seq
        "#,
    )
    .bind(project_id.to_string())
    .bind(reading.back_sight.raw())
    .bind(reading.intermediate_sight.raw())
    .bind(reading.fore_sight.raw())
    .bind(reading.rise.raw())
    .bind(reading.fall.raw())
    .bind(reading.reduced_level.raw())
    .bind(reading.distance.raw())
    .bind(&reading.remarks)
    .bind(reading.is_observed())
    .bind(reading.rule.as_str())
    .bind(Utc::now())
    .fetch_one(exec)
    .await
    .with_context(|| format!("append reading failed for project {project_id}"))?;

    Ok(seq)
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Process-local store. Used by tests and by callers that do not need the
/// history to outlive the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<BTreeMap<Uuid, Vec<Reading>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReadingStore for MemoryStore {
    async fn history(&self, project_id: Uuid) -> Result<Vec<Reading>> {
        let map = self.inner.lock().map_err(|_| anyhow!("memory store poisoned"))?;
        Ok(map.get(&project_id).cloned().unwrap_or_default())
    }

    async fn append(&self, project_id: Uuid, reading: &Reading) -> Result<i64> {
        let mut map = self.inner.lock().map_err(|_| anyhow!("memory store poisoned"))?;
        let list = map.entry(project_id).or_default();
        list.push(reading.clone());
        Ok(list.len() as i64)
    }

    async fn append_all(&self, project_id: Uuid, readings: &[Reading]) -> Result<Vec<i64>> {
        let mut map = self.inner.lock().map_err(|_| anyhow!("memory store poisoned"))?;
        let list = map.entry(project_id).or_default();
        let first = list.len() as i64 + 1;
        list.extend_from_slice(readings);
        Ok((first..first + readings.len() as i64).collect())
    }

    async fn clear(&self, project_id: Uuid) -> Result<u64> {
        let mut map = self.inner.lock().map_err(|_| anyhow!("memory store poisoned"))?;
        Ok(map.remove(&project_id).map(|v| v.len() as u64).unwrap_or(0))
    }
}

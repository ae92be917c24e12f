//! lvl-db
//!
//! SQLite persistence for LevelLog: project metadata plus the append-only
//! reading history of each project, behind the [`ReadingStore`] seam.
//!
//! The reduction itself lives in `lvl-core`; this crate loads history,
//! calls the engine, and appends what it returns (see [`record_reading`]).

pub mod fieldbook;
mod recording;
mod store;

pub use recording::{record_reading, record_readings, run_check, RecordPolicy, Recorded};
pub use store::{MemoryStore, ReadingStore, SqliteStore};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

pub const ENV_DB_URL: &str = "LVL_DATABASE_URL";

/// Open (creating if missing) the SQLite database at `url`.
pub async fn connect(url: &str) -> Result<SqlitePool> {
    let opts = SqliteConnectOptions::from_str(url)
        .with_context(|| format!("invalid database url: {url}"))?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(opts)
        .await
        .with_context(|| format!("failed to open database: {url}"))?;

    debug!(url, "database opened");
    Ok(pool)
}

/// Run embedded SQLx migrations. Idempotent.
pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("db migrate failed")?;
    info!("migrations applied");
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct DbStatus {
    pub ok: bool,
    pub has_readings_table: bool,
}

/// Simple status query (connectivity + schema presence).
pub async fn status(pool: &SqlitePool) -> Result<DbStatus> {
    let (one,): (i64,) = sqlx::query_as("select 1")
        .fetch_one(pool)
        .await
        .context("status connectivity query failed")?;

    let (n,): (i64,) = sqlx::query_as(
        "select count(*) from sqlite_master where type = 'table' and name = 'readings'",
    )
    .fetch_one(pool)
    .await
    .context("status table-exists query failed")?;

    Ok(DbStatus {
        ok: one == 1,
        has_readings_table: n > 0,
    })
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

/// Survey metadata captured before any reading is booked.
#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub title: String,
    pub description: String,
    pub area_of_study: String,
    pub carried_by: String,
    pub date_of_study: String,
    pub config_hash: String,
}

impl NewProject {
    /// At least one descriptive field must be filled in.
    pub fn has_any_detail(&self) -> bool {
        [
            &self.title,
            &self.description,
            &self.area_of_study,
            &self.carried_by,
            &self.date_of_study,
        ]
        .iter()
        .any(|s| !s.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectRow {
    pub project_id: Uuid,
    pub title: String,
    pub description: String,
    pub area_of_study: String,
    pub carried_by: String,
    pub date_of_study: String,
    pub created_at_utc: DateTime<Utc>,
    pub config_hash: String,
}

/// Insert a project and return its new id.
pub async fn insert_project(pool: &SqlitePool, p: &NewProject) -> Result<Uuid> {
    if !p.has_any_detail() {
        return Err(anyhow!(
            "project details are empty: provide at least one of title, description, area, carried-by, date"
        ));
    }

    let project_id = Uuid::new_v4();
    sqlx::query(
        r#"
        insert into projects (
          project_id, title, description, area_of_study, carried_by, date_of_study,
          created_at_utc, config_hash
        ) values (
          ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8
        )
        "#,
    )
    .bind(project_id.to_string())
    .bind(p.title.trim())
    .bind(p.description.trim())
    .bind(p.area_of_study.trim())
    .bind(p.carried_by.trim())
    .bind(p.date_of_study.trim())
    .bind(Utc::now())
    .bind(&p.config_hash)
    .execute(pool)
    .await
    .context("insert_project failed")?;

    info!(%project_id, title = p.title.trim(), "project created");
    Ok(project_id)
}

fn project_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<ProjectRow> {
    let id: String = row.try_get("project_id")?;
    Ok(ProjectRow {
        project_id: Uuid::parse_str(&id).with_context(|| format!("corrupt project_id: {id}"))?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        area_of_study: row.try_get("area_of_study")?,
        carried_by: row.try_get("carried_by")?,
        date_of_study: row.try_get("date_of_study")?,
        created_at_utc: row.try_get("created_at_utc")?,
        config_hash: row.try_get("config_hash")?,
    })
}

/// Fetch one project; errors if it does not exist.
pub async fn fetch_project(pool: &SqlitePool, project_id: Uuid) -> Result<ProjectRow> {
    let row = sqlx::query(
        r#"
        select project_id, title, description, area_of_study, carried_by,
               date_of_study, created_at_utc, config_hash
        from projects
        where project_id = ?1
        "#,
    )
    .bind(project_id.to_string())
    .fetch_optional(pool)
    .await
    .context("fetch_project failed")?
    .ok_or_else(|| anyhow!("unknown project: {project_id}"))?;

    project_from_row(&row)
}

/// All projects, oldest first.
pub async fn list_projects(pool: &SqlitePool) -> Result<Vec<ProjectRow>> {
    let rows = sqlx::query(
        r#"
        select project_id, title, description, area_of_study, carried_by,
               date_of_study, created_at_utc, config_hash
        from projects
        order by created_at_utc asc, title asc
        "#,
    )
    .fetch_all(pool)
    .await
    .context("list_projects failed")?;

    rows.iter().map(project_from_row).collect()
}

/// Number of readings booked against a project (silent ones included).
pub async fn count_readings(pool: &SqlitePool, project_id: Uuid) -> Result<i64> {
    let (n,): (i64,) = sqlx::query_as("select count(*) from readings where project_id = ?1")
        .bind(project_id.to_string())
        .fetch_one(pool)
        .await
        .context("count_readings failed")?;
    Ok(n)
}

/// Fresh, migrated SQLite database inside `dir`. Test helper.
pub async fn testkit_db_pool(dir: &std::path::Path) -> Result<SqlitePool> {
    let url = format!("sqlite://{}", dir.join("levellog-test.db").display());
    let pool = connect(&url).await?;
    migrate(&pool).await?;
    Ok(pool)
}

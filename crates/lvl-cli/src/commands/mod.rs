//! Command handler modules for the `lvl` binary.
//!
//! Shared setup (config, database URL, store) lives here. Command-specific
//! logic lives in the submodules.

pub mod check;
pub mod project;
pub mod reading;

use anyhow::{Context as _, Result};
use lvl_config::{report_unused_keys, LevelSettings, UnusedKeyPolicy, DEFAULT_DB_URL};
use lvl_db::{RecordPolicy, SqliteStore};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

/// Flags accepted before any subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalArgs {
    pub config_paths: Vec<String>,
    pub db_url: Option<String>,
    pub json: bool,
    pub strict_config: bool,
}

/// Resolved settings shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub db_url: String,
    pub config_hash: String,
    pub json: bool,
    pub policy: RecordPolicy,
}

/// Load layered config, run the unused-key guard and resolve the DB URL.
pub fn load_context(args: &GlobalArgs) -> Result<Context> {
    let path_refs: Vec<&str> = args.config_paths.iter().map(|s| s.as_str()).collect();
    let loaded = lvl_config::load_layered_yaml(&path_refs)?;

    let policy = if args.strict_config {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let report = report_unused_keys(&loaded.config_json, policy)?;
    if !report.is_clean() {
        eprintln!(
            "WARN: CONFIG_UNUSED_KEYS unused_leaf_keys={}",
            report.unused_leaf_pointers.len()
        );
        for p in report.unused_leaf_pointers.iter().take(50) {
            eprintln!("  unused={}", p);
        }
    }

    let settings = LevelSettings::from_config_json(&loaded.config_json)?;
    let db_url = resolve_db_url(
        args.db_url.as_deref(),
        std::env::var(lvl_db::ENV_DB_URL).ok().as_deref(),
        settings.db_url.as_deref(),
    );
    debug!(db_url = %db_url, config_hash = %loaded.config_hash, "context resolved");

    Ok(Context {
        db_url,
        config_hash: loaded.config_hash,
        json: args.json || settings.json_output,
        policy: RecordPolicy {
            record_silent_readings: settings.record_silent_readings,
            require_benchmark: settings.require_benchmark,
        },
    })
}

/// Flag, then env, then config, then the default file.
fn resolve_db_url(flag: Option<&str>, env: Option<&str>, config: Option<&str>) -> String {
    [flag, env, config]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or(DEFAULT_DB_URL)
        .to_string()
}

/// Open the store, applying migrations first.
pub async fn open_store(ctx: &Context) -> Result<SqliteStore> {
    SqliteStore::open(&ctx.db_url).await
}

pub fn parse_project_id(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s.trim()).context("invalid project_id uuid")
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value).context("json serialize failed")?;
    println!("{s}");
    Ok(())
}

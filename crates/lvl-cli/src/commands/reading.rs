//! `lvl reading` handlers.

use anyhow::{Context as _, Result};
use lvl_core::{FieldInput, Reading};
use lvl_db::fieldbook;
use lvl_db::{ReadingStore, Recorded};
use serde::Serialize;
use std::path::Path;

use super::{open_store, parse_project_id, print_json, Context};

#[derive(Serialize)]
struct ListedReading<'a> {
    seq: usize,
    observed: bool,
    #[serde(flatten)]
    reading: &'a Reading,
}

fn reading_line(seq: usize, r: &Reading) -> String {
    format!(
        "seq={} bs={} is={} fs={} rise={} fall={} rl={} distance={} rule={} remarks={:?}",
        seq,
        r.back_sight,
        r.intermediate_sight,
        r.fore_sight,
        r.rise,
        r.fall,
        r.reduced_level,
        r.distance,
        r.rule.as_str(),
        r.remarks
    )
}

fn print_recorded(project_id: uuid::Uuid, rec: &Recorded) {
    let r = &rec.reading;
    println!("project_id={}", project_id);
    match rec.seq {
        Some(seq) => println!("seq={}", seq),
        None => println!("seq=none"),
    }
    println!("observed={}", rec.observed);
    println!("rule={}", r.rule.as_str());
    println!("bs={}", r.back_sight);
    println!("is={}", r.intermediate_sight);
    println!("fs={}", r.fore_sight);
    println!("rise={}", r.rise);
    println!("fall={}", r.fall);
    println!("rl={}", r.reduced_level);
    println!("distance={}", r.distance);
    println!("remarks={}", r.remarks);
}

pub async fn add(ctx: &Context, project_id: &str, input: FieldInput<'_>) -> Result<()> {
    let project_id = parse_project_id(project_id)?;
    // Validate every field before touching the database.
    let raw = input.parse()?;

    let store = open_store(ctx).await?;
    lvl_db::fetch_project(store.pool(), project_id).await?;

    let rec = lvl_db::record_reading(&store, project_id, &raw, ctx.policy).await?;
    if ctx.json {
        print_json(&rec)
    } else {
        print_recorded(project_id, &rec);
        Ok(())
    }
}

pub async fn list(ctx: &Context, project_id: &str, all: bool) -> Result<()> {
    let project_id = parse_project_id(project_id)?;
    let store = open_store(ctx).await?;
    lvl_db::fetch_project(store.pool(), project_id).await?;

    let history = store.history(project_id).await?;
    let rows: Vec<ListedReading<'_>> = history
        .iter()
        .enumerate()
        .map(|(i, r)| ListedReading {
            seq: i + 1,
            observed: r.is_observed(),
            reading: r,
        })
        .filter(|row| all || row.observed)
        .collect();

    if ctx.json {
        return print_json(&rows);
    }
    for row in &rows {
        println!("{}", reading_line(row.seq, row.reading));
    }
    Ok(())
}

pub async fn import(ctx: &Context, project_id: &str, csv_path: &str) -> Result<()> {
    let project_id = parse_project_id(project_id)?;
    let raws = fieldbook::parse_fieldbook_file(Path::new(csv_path))
        .with_context(|| format!("import failed: {csv_path}"))?;

    let store = open_store(ctx).await?;
    lvl_db::fetch_project(store.pool(), project_id).await?;

    let recs = lvl_db::record_readings(&store, project_id, &raws, ctx.policy).await?;
    let recorded = recs.iter().filter(|r| r.seq.is_some()).count();
    let last_rl = recs.last().map(|r| r.reading.reduced_level.to_string());

    println!(
        "imported=true project_id={} rows={} recorded={}",
        project_id,
        raws.len(),
        recorded
    );
    if let Some(rl) = last_rl {
        println!("last_rl={}", rl);
    }
    Ok(())
}

pub async fn export(ctx: &Context, project_id: &str, csv_path: &str) -> Result<()> {
    let project_id = parse_project_id(project_id)?;
    let store = open_store(ctx).await?;
    lvl_db::fetch_project(store.pool(), project_id).await?;

    let history = store.history(project_id).await?;
    let file = std::fs::File::create(csv_path)
        .with_context(|| format!("create export file failed: {csv_path}"))?;
    fieldbook::write_fieldbook(file, &history)?;

    println!(
        "exported=true project_id={} rows={} path={}",
        project_id,
        history.len(),
        csv_path
    );
    Ok(())
}

//! `lvl project` handlers.

use anyhow::{bail, Result};
use lvl_db::{NewProject, ProjectRow, ReadingStore};
use serde::Serialize;

use super::{open_store, parse_project_id, print_json, Context};

#[derive(Serialize)]
struct ProjectView<'a> {
    #[serde(flatten)]
    project: &'a ProjectRow,
    readings: i64,
}

fn print_project(p: &ProjectRow, readings: i64) {
    println!("project_id={}", p.project_id);
    println!("title={}", p.title);
    println!("description={}", p.description);
    println!("area_of_study={}", p.area_of_study);
    println!("carried_by={}", p.carried_by);
    println!("date_of_study={}", p.date_of_study);
    println!("created_at_utc={}", p.created_at_utc.to_rfc3339());
    println!("config_hash={}", p.config_hash);
    println!("readings={}", readings);
}

pub async fn create(ctx: &Context, p: NewProject) -> Result<()> {
    if !p.has_any_detail() {
        bail!("REFUSING CREATE: project details are empty. Pass at least one of --title, --description, --area, --carried-by, --date");
    }

    let store = open_store(ctx).await?;
    let project_id = lvl_db::insert_project(store.pool(), &p).await?;
    let row = lvl_db::fetch_project(store.pool(), project_id).await?;

    if ctx.json {
        print_json(&ProjectView {
            project: &row,
            readings: 0,
        })?;
    } else {
        print_project(&row, 0);
    }
    Ok(())
}

pub async fn list(ctx: &Context) -> Result<()> {
    let store = open_store(ctx).await?;
    let projects = lvl_db::list_projects(store.pool()).await?;

    let mut views = Vec::with_capacity(projects.len());
    for p in &projects {
        let n = lvl_db::count_readings(store.pool(), p.project_id).await?;
        views.push(ProjectView {
            project: p,
            readings: n,
        });
    }

    if ctx.json {
        return print_json(&views);
    }
    for v in &views {
        println!(
            "project_id={} title={:?} date_of_study={:?} readings={}",
            v.project.project_id, v.project.title, v.project.date_of_study, v.readings
        );
    }
    Ok(())
}

pub async fn show(ctx: &Context, project_id: &str) -> Result<()> {
    let project_id = parse_project_id(project_id)?;
    let store = open_store(ctx).await?;
    let row = lvl_db::fetch_project(store.pool(), project_id).await?;
    let n = lvl_db::count_readings(store.pool(), project_id).await?;

    if ctx.json {
        print_json(&ProjectView {
            project: &row,
            readings: n,
        })
    } else {
        print_project(&row, n);
        Ok(())
    }
}

pub async fn clear(ctx: &Context, project_id: &str, yes: bool) -> Result<()> {
    let project_id = parse_project_id(project_id)?;
    let store = open_store(ctx).await?;
    // Unknown ids are an error, not a silent no-op.
    lvl_db::fetch_project(store.pool(), project_id).await?;

    if !yes {
        let n = lvl_db::count_readings(store.pool(), project_id).await?;
        bail!(
            "REFUSING CLEAR: project {} has {} reading(s). Re-run with: `lvl project clear --project-id {} --yes`",
            project_id,
            n,
            project_id
        );
    }

    let removed = store.clear(project_id).await?;
    println!("cleared=true project_id={} removed={}", project_id, removed);
    Ok(())
}

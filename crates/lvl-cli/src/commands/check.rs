use anyhow::Result;
use serde::Serialize;
use uuid::Uuid;

use super::{open_store, parse_project_id, print_json, Context};

#[derive(Serialize)]
struct CheckView {
    project_id: Uuid,
    #[serde(flatten)]
    result: lvl_core::ClosureResult,
}

/// A failed closure is a result, not an error: exit status stays 0.
pub async fn run(ctx: &Context, project_id: &str) -> Result<()> {
    let project_id = parse_project_id(project_id)?;
    let store = open_store(ctx).await?;
    lvl_db::fetch_project(store.pool(), project_id).await?;

    let res = lvl_db::run_check(&store, project_id).await?;

    if ctx.json {
        return print_json(&CheckView {
            project_id,
            result: res,
        });
    }

    let s = &res.summation;
    println!("project_id={}", project_id);
    println!("sum_bs={}", s.sum_bs);
    println!("sum_fs={}", s.sum_fs);
    println!("sum_rise={}", s.sum_rise);
    println!("sum_fall={}", s.sum_fall);
    println!("bs_minus_fs={}", res.bs_minus_fs);
    println!("rise_minus_fall={}", res.rise_minus_fall);
    println!("rl_last_minus_first={}", res.rl_last_minus_first);
    println!("check_passed={}", res.passed);
    Ok(())
}

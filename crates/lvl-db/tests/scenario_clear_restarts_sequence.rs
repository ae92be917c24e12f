use lvl_core::{Mm, RawReading, ReductionRule};
use lvl_db::{NewProject, ReadingStore, RecordPolicy, SqliteStore};

#[tokio::test]
async fn clear_empties_history_and_next_reading_is_a_benchmark() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let pool = lvl_db::testkit_db_pool(dir.path()).await?;
    let store = SqliteStore::new(pool.clone());
    let pid = lvl_db::insert_project(&pool, &NewProject { title: "Reset".into(), ..Default::default() }).await?;

    let policy = RecordPolicy::default();
    for raw in [
        RawReading { back_sight: Mm::new(1_500), reduced_level: Mm::new(100_000), ..Default::default() },
        RawReading { intermediate_sight: Mm::new(1_000), ..Default::default() },
        RawReading { fore_sight: Mm::new(1_200), ..Default::default() },
    ] {
        lvl_db::record_reading(&store, pid, &raw, policy).await?;
    }

    assert_eq!(store.clear(pid).await?, 3);
    assert!(store.history(pid).await?.is_empty());
    assert!(lvl_db::run_check(&store, pid).await.is_err());

    let rec = lvl_db::record_reading(
        &store,
        pid,
        &RawReading { back_sight: Mm::new(900), reduced_level: Mm::new(80_000), ..Default::default() },
        policy,
    )
    .await?;
    assert_eq!(rec.seq, Some(1));
    assert_eq!(rec.reading.rule, ReductionRule::Benchmark);
    assert_eq!(rec.reading.reduced_level, Mm::new(80_000));

    // The project row itself survives a reset.
    assert_eq!(lvl_db::fetch_project(&pool, pid).await?.title, "Reset");
    Ok(())
}

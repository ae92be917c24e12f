use lvl_core::*;

/// Three-line field book whose BS/FS totals deliberately disagree with the
/// derived rises: the check must report failure, not correct anything.
#[test]
fn scenario_worked_example_unbalanced() {
    let raws = [
        RawReading {
            back_sight: Mm::new(1_500),
            reduced_level: Mm::new(100_000),
            ..Default::default()
        },
        RawReading {
            intermediate_sight: Mm::new(1_250),
            ..Default::default()
        },
        RawReading {
            back_sight: Mm::new(2_000),
            fore_sight: Mm::new(800),
            ..Default::default()
        },
    ];

    let history = reduce_all(&raws);

    assert_eq!(history[0].rule, ReductionRule::Benchmark);
    assert_eq!(history[0].reduced_level, Mm::new(100_000));

    assert_eq!(history[1].rise, Mm::new(250));
    assert_eq!(history[1].fall, Mm::ZERO);
    assert_eq!(history[1].reduced_level, Mm::new(100_250));

    assert_eq!(history[2].rule, ReductionRule::ForeSightFromIntermediate);
    assert_eq!(history[2].rise, Mm::new(450));
    assert_eq!(history[2].reduced_level, Mm::new(100_700));

    let res = check(&history).expect("non-empty history");
    assert_eq!(res.summation.sum_bs, Mm::new(3_500));
    assert_eq!(res.summation.sum_fs, Mm::new(800));
    assert_eq!(res.summation.sum_rise, Mm::new(700));
    assert_eq!(res.summation.sum_fall, Mm::ZERO);
    assert_eq!(res.bs_minus_fs, Mm::new(2_700));
    assert_eq!(res.rise_minus_fall, Mm::new(700));
    assert_eq!(res.rl_last_minus_first, Mm::new(700));
    assert!(!res.passed);
}

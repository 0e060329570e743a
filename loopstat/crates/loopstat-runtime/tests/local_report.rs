//! Local report integration tests

mod common;

use common::StatFixture;
use loopstat_runtime::{ReportFormat, StatValue};

#[test]
fn two_threads_sum_into_one_row() {
    let fx = StatFixture::with_threads(2);
    fx.collector.begin_loop_instance("mainLoop").unwrap();
    fx.record(0, "mainLoop", "time", 5);
    fx.record(1, "mainLoop", "time", 7);

    assert_eq!(fx.rows(), vec!["STAT,0,mainLoop,0,time,2,12,5,7"]);
}

#[test]
fn host_id_comes_from_config() {
    let fx = StatFixture::with_config(
        loopstat_runtime::CollectorConfig::default()
            .with_threads(1)
            .with_host_id(3),
    );
    fx.record(0, "L", "c", 1);
    assert_eq!(fx.rows(), vec!["STAT,3,L,0,c,1,1,1"]);
}

#[test]
fn empty_slots_contribute_nothing() {
    let fx = StatFixture::with_threads(8);
    assert!(fx.rows().is_empty());

    fx.record(1, "L", "c", 2);
    let text = fx.tabular();
    assert!(text.starts_with("STATTYPE,HOST,LOOP,INSTANCE,CATEGORY,N,SUM,T0,T1\n"));
    assert_eq!(fx.rows(), vec!["STAT,0,L,0,c,1,2,0,2"]);
}

#[test]
fn sum_is_order_independent() {
    let forward = StatFixture::with_threads(3);
    let backward = StatFixture::with_threads(3);
    let samples = [(0usize, 4i64), (2, -1), (1, 10), (0, 3)];

    for &(tid, v) in &samples {
        forward.record(tid, "L", "c", v);
    }
    for &(tid, v) in samples.iter().rev() {
        backward.record(tid, "L", "c", v);
    }

    assert_eq!(forward.rows(), vec!["STAT,0,L,0,c,3,16,7,10,-1"]);
    assert_eq!(forward.rows(), backward.rows());
}

#[test]
fn rows_follow_first_use_of_names() {
    let fx = StatFixture::with_threads(1);
    fx.record(0, "outer", "b", 1);
    fx.record(0, "inner", "a", 1);
    fx.record(0, "outer", "a", 1);

    assert_eq!(
        fx.rows(),
        vec![
            "STAT,0,outer,0,b,1,1,1",
            "STAT,0,outer,0,a,1,1,1",
            "STAT,0,inner,0,a,1,1,1",
        ]
    );
}

#[test]
fn each_instance_gets_its_own_row() {
    let fx = StatFixture::with_threads(1);
    for i in 0..3 {
        fx.collector.begin_loop_instance("solver").unwrap();
        fx.record(0, "solver", "iters", 10 * (i + 1));
    }

    assert_eq!(
        fx.rows(),
        vec![
            "STAT,0,solver,0,iters,1,10,10",
            "STAT,0,solver,1,iters,1,20,20",
            "STAT,0,solver,2,iters,1,30,30",
        ]
    );
}

#[test]
fn non_integer_values_only_in_per_record_forms() {
    let fx = StatFixture::with_threads(2);
    fx.collector.record(0, "L", "ratio", 0.5f64).unwrap();
    fx.collector.record(1, "L", "mode", "push").unwrap();

    assert!(fx.rows().is_empty());

    let records = fx.report(ReportFormat::Records);
    assert!(records.contains("0,L,0,ratio,0,0.5\n"));
    assert!(records.contains("0,L,0,mode,1,push\n"));

    let json: serde_json::Value =
        serde_json::from_str(&fx.report(ReportFormat::Structured)).unwrap();
    assert_eq!(json[0]["VALUE"], serde_json::json!(0.5));
    assert_eq!(json[1]["VALUE"], serde_json::json!("push"));
    assert_eq!(json[1]["THREAD"], serde_json::json!(1));
}

#[test]
fn mixed_kinds_keep_first_kind() {
    let fx = StatFixture::with_threads(2);
    fx.collector.record(0, "L", "x", 2i64).unwrap();
    fx.collector.record(1, "L", "x", StatValue::Float(9.0)).unwrap();
    fx.collector.record(1, "L", "x", 3i64).unwrap();

    let report = fx.collector.render_local_report(ReportFormat::Tabular).unwrap();
    assert_eq!(report.summary.skipped, 1);
    assert!(report.text.contains("STAT,0,L,0,x,2,5,2,3\n"));
}

#[test]
fn cross_thread_posting_lands_in_target_slot() {
    let fx = StatFixture::with_threads(3);
    // a coordinator thread posts on behalf of slot 2
    let collector = fx.collector.clone();
    std::thread::spawn(move || collector.record(2, "L", "c", 6i64).unwrap())
        .join()
        .unwrap();

    assert_eq!(fx.rows(), vec!["STAT,0,L,0,c,1,6,0,0,6"]);
}

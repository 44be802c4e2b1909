#![cfg(test)]
use std::net::IpAddr;
use std::thread;
use std::time::Duration;

use echoscan_common::config::RunConfig;
use echoscan_core::control::RunControl;
use echoscan_core::scheduler::ProbeScheduler;

use crate::support::{MemoryReporter, ScriptedProber, ips};

fn config(count: Option<u64>, concurrency: usize, interval: Duration) -> RunConfig {
    RunConfig {
        count,
        interval,
        concurrency,
        resolve_names: false,
    }
}

fn sweep() -> Vec<IpAddr> {
    ips(&["10.0.0.1", "10.0.0.2", "10.0.0.3", "10.0.0.4", "10.0.0.5"])
}

#[test]
fn every_target_gets_exactly_count_probes_for_any_pool_size() {
    let targets = sweep();
    for pool_size in 1..=targets.len() + 1 {
        let prober = ScriptedProber::new(&targets[..2]);
        let scheduler = ProbeScheduler::new(targets.clone(), prober, MemoryReporter::default(), RunControl::new())
            .with_run_config(config(Some(3), pool_size, Duration::ZERO));

        let summary = scheduler.run();
        for row in &summary.rows {
            assert_eq!(row.counts.sent, 3, "pool size {pool_size}, target {}", row.addr);
        }
        assert_eq!(summary.totals.sent, 15);
        assert_eq!(summary.totals.received, 6);
    }
}

#[test]
fn prober_calls_match_sent_counters() {
    let targets = sweep();
    let scheduler = ProbeScheduler::new(targets.clone(), ScriptedProber::new(&[]), MemoryReporter::default(), RunControl::new())
        .with_run_config(config(Some(2), 3, Duration::ZERO));
    let summary = scheduler.run();

    for addr in &targets {
        assert_eq!(scheduler.prober().calls(*addr), 2);
    }
    let reporter = scheduler.into_reporter();
    assert_eq!(reporter.lines.len(), 10);
    assert!(reporter.lines.iter().all(|line| line.starts_with("Request timed out ")));
    assert_eq!(summary.offline, targets);
    assert!(summary.online.is_empty());
    assert!(!summary.any_reply());
}

#[test]
fn duplicates_are_independent_targets() {
    let targets = ips(&["10.0.0.1", "10.0.0.1"]);
    let scheduler = ProbeScheduler::new(targets, ScriptedProber::new(&ips(&["10.0.0.1"])), MemoryReporter::default(), RunControl::new())
        .with_run_config(config(Some(2), 2, Duration::ZERO));
    let summary = scheduler.run();

    assert_eq!(summary.rows.len(), 2);
    assert!(summary.rows.iter().all(|row| row.counts.sent == 2));
    assert_eq!(summary.online.len(), 2);
}

#[test]
fn in_flight_probes_never_exceed_pool_size() {
    let targets = sweep();
    let prober = ScriptedProber::new(&targets).with_delay(Duration::from_millis(5));
    let scheduler = ProbeScheduler::new(targets, prober, MemoryReporter::default(), RunControl::new())
        .with_run_config(config(Some(4), 2, Duration::ZERO));
    let summary = scheduler.run();

    assert_eq!(summary.totals.sent, 20);
    assert!(scheduler.prober().max_in_flight() <= 2);
    let reporter = scheduler.into_reporter();
    assert_eq!(reporter.lines.len(), 20);
}

#[test]
fn continuous_run_stops_on_request() {
    let control = RunControl::new();
    let scheduler = ProbeScheduler::new(sweep(), ScriptedProber::new(&sweep()), MemoryReporter::default(), control.clone())
        .with_run_config(config(None, 3, Duration::from_millis(5)));

    let stopper = thread::spawn(move || {
        thread::sleep(Duration::from_millis(300));
        control.stop();
    });
    let summary = scheduler.run();
    stopper.join().unwrap();

    assert!(summary.rows.iter().all(|row| row.counts.sent >= 1));
    assert_eq!(summary.totals.sent, summary.totals.received);
    assert_eq!(summary.online.len(), 5);
}

#[test]
fn snapshot_request_is_reported_without_stopping() {
    let control = RunControl::new();
    control.request_snapshot();
    let scheduler = ProbeScheduler::new(sweep(), ScriptedProber::new(&[]), MemoryReporter::default(), control.clone())
        .with_run_config(config(None, 1, Duration::from_millis(10)));

    let stopper = thread::spawn(move || {
        thread::sleep(Duration::from_millis(500));
        control.stop();
    });
    let summary = scheduler.run();
    stopper.join().unwrap();

    let reporter = scheduler.into_reporter();
    assert_eq!(reporter.snapshots.len(), 1);
    assert!(reporter.snapshots[0].sent <= summary.totals.sent);
    assert_eq!(reporter.snapshots[0].received, 0);
}

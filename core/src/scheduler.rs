//! # Probe Scheduler
//!
//! A fixed pool of worker threads probes the target set round-robin.
//!
//! Each worker loops: pick the next index from a shared cursor, claim one
//! probe from that target's budget, probe, record, print, then wait out the
//! interval. In finite mode every target has a budget of `count` probes and a
//! claim only succeeds while budget remains, so a target is never probed more
//! than `count` times. In continuous mode claims always succeed.
//!
//! The calling thread becomes the coordinator: it waits for the stop flag and
//! prints interim totals whenever a snapshot is requested.

use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread;
use std::time::Duration;

use echoscan_common::config::{ProbeOptions, RunConfig};
use tracing::debug;

use crate::control::RunControl;
use crate::prober::Prober;
use crate::report::{ProbeRecord, Reporter};
use crate::resolver::ReverseResolver;
use crate::stats::{StatsAggregator, Summary};

pub const SNAPSHOT_POLL: Duration = Duration::from_millis(200);
pub const CLAIM_BACKOFF: Duration = Duration::from_millis(10);

/// Remaining probes per target, `None` when the run is continuous.
struct Budget {
    remaining: Option<Box<[AtomicU64]>>,
}

impl Budget {
    fn new(targets: usize, count: Option<u64>) -> Self {
        let remaining = count.map(|count| (0..targets).map(|_| AtomicU64::new(count)).collect());
        Self { remaining }
    }

    /// Takes one probe from `index`'s budget. Never drops below zero.
    fn claim(&self, index: usize) -> bool {
        match &self.remaining {
            None => true,
            Some(remaining) => remaining[index]
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |left| left.checked_sub(1))
                .is_ok(),
        }
    }

    fn exhausted(&self) -> bool {
        match &self.remaining {
            None => false,
            Some(remaining) => remaining.iter().all(|left| left.load(Ordering::Acquire) == 0),
        }
    }
}

pub struct ProbeScheduler<P, R> {
    prober: P,
    reporter: Mutex<R>,
    reverse: Option<Box<dyn ReverseResolver>>,
    hostnames: Box<[OnceLock<Option<String>>]>,
    stats: StatsAggregator,
    options: ProbeOptions,
    config: RunConfig,
    control: RunControl,
    cursor: AtomicUsize,
}

impl<P, R> ProbeScheduler<P, R>
where
    P: Prober,
    R: Reporter + Send,
{
    pub fn new(targets: Vec<IpAddr>, prober: P, reporter: R, control: RunControl) -> Self {
        let hostnames = targets.iter().map(|_| OnceLock::new()).collect();
        Self {
            prober,
            reporter: Mutex::new(reporter),
            reverse: None,
            hostnames,
            stats: StatsAggregator::new(targets),
            options: ProbeOptions::default(),
            config: RunConfig::default(),
            control,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn with_probe_options(mut self, options: ProbeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_run_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    /// Used only when the run config asks for names.
    pub fn with_reverse_resolver(mut self, resolver: impl ReverseResolver + 'static) -> Self {
        self.reverse = Some(Box::new(resolver));
        self
    }

    pub fn prober(&self) -> &P {
        &self.prober
    }

    /// Consumes the scheduler and returns the reporter, e.g. to inspect
    /// captured output.
    pub fn into_reporter(self) -> R {
        self.reporter.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs until every budget is spent or the run is stopped, and returns
    /// the final statistics. All workers have joined when this returns.
    pub fn run(&self) -> Summary {
        if self.stats.is_empty() {
            return self.stats.finalize();
        }

        let budget = Budget::new(self.stats.len(), self.config.count);
        let pool_size: usize = self.config.concurrency.clamp(1, self.stats.len());
        debug!(
            pool_size,
            targets = self.stats.len(),
            count = ?self.config.count,
            "starting probe workers"
        );

        thread::scope(|scope| {
            for worker_id in 0..pool_size {
                let budget = &budget;
                scope.spawn(move || self.worker(worker_id, budget));
            }
            self.coordinate();
        });

        debug!("all probe workers joined");
        self.stats.finalize()
    }

    fn coordinate(&self) {
        while !self.control.is_stopped() {
            if self.control.take_snapshot_request() {
                let totals = self.stats.snapshot();
                self.lock_reporter().snapshot(totals);
            }
            thread::sleep(SNAPSHOT_POLL);
        }
    }

    fn worker(&self, worker_id: usize, budget: &Budget) {
        debug!(worker_id, "worker started");
        while !self.control.is_stopped() {
            let index: usize = self.cursor.fetch_add(1, Ordering::Relaxed) % self.stats.len();

            if !budget.claim(index) {
                if budget.exhausted() {
                    self.control.stop();
                    break;
                }
                self.control.sleep(CLAIM_BACKOFF);
                continue;
            }

            self.probe_once(index);

            if budget.exhausted() {
                self.control.stop();
                break;
            }
            self.control.sleep(self.config.interval);
        }
        debug!(worker_id, "worker finished");
    }

    fn probe_once(&self, index: usize) {
        let addr: IpAddr = self.stats.target(index);
        let target_stats = self.stats.stats(index);

        target_stats.record_sent();
        let reply = self.prober.probe(addr, &self.options);
        if reply.is_some() {
            target_stats.record_received();
        }

        // Lookup stays outside the output lock.
        let hostname: Option<&str> = self.hostname(index);
        let record = ProbeRecord {
            addr,
            hostname,
            reply: reply.as_ref(),
        };
        self.lock_reporter().probe_completed(&record);
    }

    fn hostname(&self, index: usize) -> Option<&str> {
        if !self.config.resolve_names {
            return None;
        }
        let resolver = self.reverse.as_deref()?;
        self.hostnames[index]
            .get_or_init(|| resolver.lookup(self.stats.target(index)))
            .as_deref()
    }

    fn lock_reporter(&self) -> MutexGuard<'_, R> {
        self.reporter.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prober::EchoReply;
    use crate::report::LineReporter;

    struct AlwaysReply;

    impl Prober for AlwaysReply {
        fn probe(&self, _addr: IpAddr, options: &ProbeOptions) -> Option<EchoReply> {
            Some(EchoReply {
                rtt: Duration::from_millis(1),
                ttl: Some(64),
                bytes: options.payload_size,
                route_hops: Vec::new(),
                timestamps: Vec::new(),
            })
        }
    }

    struct FixedName;

    impl ReverseResolver for FixedName {
        fn lookup(&self, _addr: IpAddr) -> Option<String> {
            Some("host.lan".to_string())
        }
    }

    fn quick_config(count: Option<u64>, concurrency: usize) -> RunConfig {
        RunConfig {
            count,
            interval: Duration::ZERO,
            concurrency,
            resolve_names: false,
        }
    }

    fn targets(n: u8) -> Vec<IpAddr> {
        (1..=n).map(|i| IpAddr::from([10, 0, 0, i])).collect()
    }

    #[test]
    fn test_budget_never_goes_negative() {
        let budget = Budget::new(1, Some(2));
        assert!(budget.claim(0));
        assert!(!budget.exhausted());
        assert!(budget.claim(0));
        assert!(!budget.claim(0));
        assert!(budget.exhausted());
    }

    #[test]
    fn test_continuous_budget_always_claims() {
        let budget = Budget::new(3, None);
        assert!((0..100).all(|_| budget.claim(1)));
        assert!(!budget.exhausted());
    }

    #[test]
    fn test_finite_run_sends_exact_count() {
        let scheduler = ProbeScheduler::new(targets(5), AlwaysReply, LineReporter::new(Vec::new()), RunControl::new())
            .with_run_config(quick_config(Some(3), 2));
        let summary = scheduler.run();

        assert!(summary.rows.iter().all(|row| row.counts.sent == 3 && row.counts.received == 3));
        assert_eq!(summary.online.len(), 5);

        let output = String::from_utf8(scheduler.into_reporter().into_inner()).unwrap();
        assert_eq!(output.lines().filter(|line| line.starts_with("Reply from")).count(), 15);
    }

    #[test]
    fn test_pool_larger_than_target_set() {
        let scheduler = ProbeScheduler::new(targets(2), AlwaysReply, LineReporter::new(Vec::new()), RunControl::new())
            .with_run_config(quick_config(Some(1), 100));
        let summary = scheduler.run();
        assert_eq!(summary.totals.sent, 2);
    }

    #[test]
    fn test_reply_lines_carry_cached_hostname() {
        let config = RunConfig {
            resolve_names: true,
            ..quick_config(Some(2), 1)
        };
        let scheduler = ProbeScheduler::new(targets(1), AlwaysReply, LineReporter::new(Vec::new()), RunControl::new())
            .with_run_config(config)
            .with_reverse_resolver(FixedName);
        scheduler.run();

        let output = String::from_utf8(scheduler.into_reporter().into_inner()).unwrap();
        assert_eq!(output.matches("Reply from host.lan [10.0.0.1]").count(), 2);
    }

    #[test]
    fn test_stopped_before_start_sends_nothing() {
        let control = RunControl::new();
        control.stop();
        let scheduler = ProbeScheduler::new(targets(3), AlwaysReply, LineReporter::new(Vec::new()), control)
            .with_run_config(quick_config(None, 3));
        let summary = scheduler.run();
        assert_eq!(summary.totals.sent, 0);
        assert_eq!(summary.offline.len(), 3);
    }
}

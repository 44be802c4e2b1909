#![cfg(test)]
use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use echoscan_common::config::{FamilyPreference, ProbeOptions};
use echoscan_core::prober::{EchoReply, Prober};
use echoscan_core::report::{ProbeRecord, Reporter};
use echoscan_core::resolver::ForwardResolver;
use echoscan_core::stats::Counts;

pub fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

pub fn ips(list: &[&str]) -> Vec<IpAddr> {
    list.iter().map(|s| ip(s)).collect()
}

pub fn strings(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Replies for `online` addresses, times out for the rest, and counts calls.
pub struct ScriptedProber {
    online: HashSet<IpAddr>,
    delay: Duration,
    calls: Mutex<HashMap<IpAddr, u64>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedProber {
    pub fn new(online: &[IpAddr]) -> Self {
        Self {
            online: online.iter().copied().collect(),
            delay: Duration::ZERO,
            calls: Mutex::new(HashMap::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self, addr: IpAddr) -> u64 {
        self.calls.lock().unwrap().get(&addr).copied().unwrap_or(0)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Prober for ScriptedProber {
    fn probe(&self, addr: IpAddr, options: &ProbeOptions) -> Option<EchoReply> {
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);
        *self.calls.lock().unwrap().entry(addr).or_insert(0) += 1;

        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.online.contains(&addr).then(|| EchoReply {
            rtt: Duration::from_millis(1),
            ttl: Some(64),
            bytes: options.payload_size,
            route_hops: Vec::new(),
            timestamps: Vec::new(),
        })
    }
}

/// Keeps every printed line and every snapshot in memory.
#[derive(Default)]
pub struct MemoryReporter {
    pub lines: Vec<String>,
    pub snapshots: Vec<Counts>,
}

impl Reporter for MemoryReporter {
    fn probe_completed(&mut self, record: &ProbeRecord<'_>) {
        self.lines.push(record.to_string());
    }

    fn snapshot(&mut self, totals: Counts) {
        self.snapshots.push(totals);
    }
}

/// Fixed host table; unknown names do not resolve.
#[derive(Default)]
pub struct StaticResolver {
    hosts: HashMap<String, Vec<IpAddr>>,
}

impl StaticResolver {
    pub fn with_host(mut self, name: &str, addrs: &[&str]) -> Self {
        self.hosts.insert(name.to_string(), ips(addrs));
        self
    }
}

/// Ignores the family preference on purpose, like a resolver returning
/// everything it has.
#[async_trait]
impl ForwardResolver for StaticResolver {
    async fn resolve(&self, host: &str, _family: FamilyPreference) -> Vec<IpAddr> {
        self.hosts.get(host).cloned().unwrap_or_default()
    }
}

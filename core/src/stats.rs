//! # Probe Statistics
//!
//! One pair of counters per target, updated by many workers without locking.
//! A target row is only meaningful once the run has finished; the interim
//! snapshot reads the counters while workers are still moving them.

use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct TargetStats {
    sent: AtomicU64,
    received: AtomicU64,
}

impl TargetStats {
    pub fn record_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn counts(&self) -> Counts {
        Counts {
            sent: self.sent.load(Ordering::Relaxed),
            received: self.received.load(Ordering::Relaxed),
        }
    }
}

/// A sent / received pair with the derived loss figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Counts {
    pub sent: u64,
    pub received: u64,
}

impl Counts {
    pub fn lost(&self) -> u64 {
        self.sent.saturating_sub(self.received)
    }

    /// Percentage of sent probes that got no reply, `0.0` when nothing was sent.
    pub fn loss_percent(&self) -> f64 {
        if self.sent == 0 {
            0.0
        } else {
            self.lost() as f64 * 100.0 / self.sent as f64
        }
    }
}

impl std::ops::AddAssign for Counts {
    fn add_assign(&mut self, other: Self) {
        self.sent += other.sent;
        self.received += other.received;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetRow {
    pub addr: IpAddr,
    pub counts: Counts,
}

/// End-of-run view produced by [`StatsAggregator::finalize`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Summary {
    /// In target-set order.
    pub rows: Vec<TargetRow>,
    pub online: Vec<IpAddr>,
    pub offline: Vec<IpAddr>,
    pub totals: Counts,
}

impl Summary {
    pub fn any_reply(&self) -> bool {
        self.totals.received > 0
    }
}

/// Owns the target list and one [`TargetStats`] per entry, index-aligned.
#[derive(Debug)]
pub struct StatsAggregator {
    targets: Vec<IpAddr>,
    stats: Box<[TargetStats]>,
}

impl StatsAggregator {
    pub fn new(targets: Vec<IpAddr>) -> Self {
        let stats = targets.iter().map(|_| TargetStats::default()).collect();
        Self { targets, stats }
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn target(&self, index: usize) -> IpAddr {
        self.targets[index]
    }

    pub fn stats(&self, index: usize) -> &TargetStats {
        &self.stats[index]
    }

    /// Totals across all targets at this instant.
    pub fn snapshot(&self) -> Counts {
        let mut totals = Counts::default();
        for stats in self.stats.iter() {
            totals += stats.counts();
        }
        totals
    }

    /// Per-target rows plus the online / offline split. Call after all
    /// workers have joined.
    pub fn finalize(&self) -> Summary {
        let mut summary = Summary::default();
        for (addr, stats) in self.targets.iter().zip(self.stats.iter()) {
            let counts = stats.counts();
            summary.totals += counts;
            summary.rows.push(TargetRow { addr: *addr, counts });
            if counts.received > 0 {
                summary.online.push(*addr);
            } else {
                summary.offline.push(*addr);
            }
        }
        summary
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

//! # Report Lines
//!
//! Every line a run prints, as plain text. Ordering and locking are the
//! scheduler's concern; a [`Reporter`] only decides where lines go.

use std::fmt;
use std::io::Write;
use std::net::IpAddr;

use echoscan_common::network::compress;
use tracing::debug;

use crate::prober::EchoReply;
use crate::stats::{Counts, Summary, TargetRow};

pub const SNAPSHOT_HEADER: &str = "--- Interim statistics ---";
pub const STATISTICS_HEADER: &str = "--- Ping statistics ---";

/// Outcome of one probe, as handed to the reporter.
#[derive(Debug, Clone, Copy)]
pub struct ProbeRecord<'a> {
    pub addr: IpAddr,
    pub hostname: Option<&'a str>,
    pub reply: Option<&'a EchoReply>,
}

impl ProbeRecord<'_> {
    pub fn is_reply(&self) -> bool {
        self.reply.is_some()
    }

    fn write_peer(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.hostname {
            Some(name) => write!(f, "{name} [{}]", self.addr),
            None => write!(f, "{}", self.addr),
        }
    }
}

/// May span several lines: route and timestamp details follow the reply line.
impl fmt::Display for ProbeRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(reply) = self.reply else {
            f.write_str("Request timed out ")?;
            return self.write_peer(f);
        };

        f.write_str("Reply from ")?;
        self.write_peer(f)?;
        write!(f, ": bytes={} time={}ms TTL=", reply.bytes, reply.rtt.as_millis())?;
        match reply.ttl {
            Some(ttl) => write!(f, "{ttl}")?,
            None => f.write_str("?")?,
        }

        if !reply.route_hops.is_empty() {
            let hops: Vec<String> = reply.route_hops.iter().map(|hop| hop.to_string()).collect();
            write!(f, "\n    Route: {}", hops.join(" -> "))?;
        }
        if !reply.timestamps.is_empty() {
            let stamps: Vec<String> = reply.timestamps.iter().map(|ts| format!("{ts}ms")).collect();
            write!(f, "\n    Timestamps: {}", stamps.join(", "))?;
        }
        Ok(())
    }
}

/// Receives output while a run is in progress. Calls are serialized by the
/// scheduler.
pub trait Reporter {
    fn probe_completed(&mut self, record: &ProbeRecord<'_>);
    fn snapshot(&mut self, totals: Counts);
}

pub fn snapshot_lines(totals: Counts) -> [String; 2] {
    [
        SNAPSHOT_HEADER.to_string(),
        format!("Total: sent={}, received={}", totals.sent, totals.received),
    ]
}

pub fn target_line(row: &TargetRow) -> String {
    format!("{} : {}", row.addr, counts_text(&row.counts))
}

pub fn packets_line(totals: &Counts) -> String {
    format!("Packets: {}", counts_text(totals))
}

pub fn online_line(addrs: &[IpAddr]) -> String {
    format!("Online ({}): {}", addrs.len(), compress::compress(addrs))
}

pub fn offline_line(addrs: &[IpAddr]) -> String {
    format!("Offline ({}): {}", addrs.len(), compress::compress(addrs))
}

pub fn total_targets_line(count: usize) -> String {
    format!("Total targets: {count}")
}

fn counts_text(counts: &Counts) -> String {
    format!(
        "sent={}, received={}, lost={} ({:.1}%)",
        counts.sent,
        counts.received,
        counts.lost(),
        counts.loss_percent()
    )
}

/// The final block: header, one row per target, totals, online and offline.
pub fn summary_lines(summary: &Summary) -> Vec<String> {
    let mut lines: Vec<String> = Vec::with_capacity(summary.rows.len() + 4);
    lines.push(STATISTICS_HEADER.to_string());
    lines.extend(summary.rows.iter().map(target_line));
    lines.push(packets_line(&summary.totals));
    lines.push(online_line(&summary.online));
    lines.push(offline_line(&summary.offline));
    lines
}

/// Plain-text reporter over any writer. Write failures are logged and dropped.
pub struct LineReporter<W: Write> {
    out: W,
}

impl<W: Write> LineReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &dyn fmt::Display) {
        if let Err(e) = writeln!(self.out, "{text}").and_then(|_| self.out.flush()) {
            debug!("failed to write report line: {e}");
        }
    }
}

impl<W: Write> Reporter for LineReporter<W> {
    fn probe_completed(&mut self, record: &ProbeRecord<'_>) {
        self.emit(record);
    }

    fn snapshot(&mut self, totals: Counts) {
        for line in snapshot_lines(totals) {
            self.emit(&line);
        }
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

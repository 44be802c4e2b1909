use std::fmt::Display;
use std::io::{self, IsTerminal, Stdout, Write};

use colored::*;
use echoscan_core::report::{self, ProbeRecord, Reporter};
use echoscan_core::stats::{Counts, Summary};

/// Drops colors when stdout is redirected.
pub fn initialize() {
    if !io::stdout().is_terminal() {
        colored::control::set_override(false);
    }
}

/// Writes one line to stdout. A closed stdout (e.g. `| head`) is not an error.
pub fn line<T: Display>(msg: T) {
    let mut out = io::stdout().lock();
    let _ = writeln!(out, "{msg}");
}

pub fn summary(summary: &Summary) {
    line(report::STATISTICS_HEADER.bright_black());
    for row in &summary.rows {
        line(report::target_line(row));
    }
    line(report::packets_line(&summary.totals).bold());
    line(report::online_line(&summary.online).green());
    line(report::offline_line(&summary.offline).red());
}

pub struct ConsoleReporter {
    out: Stdout,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self { out: io::stdout() }
    }

    fn emit(&mut self, msg: impl Display) {
        let mut out = self.out.lock();
        let _ = writeln!(out, "{msg}").and_then(|_| out.flush());
    }
}

impl Reporter for ConsoleReporter {
    fn probe_completed(&mut self, record: &ProbeRecord<'_>) {
        let text: String = record.to_string();
        if record.is_reply() {
            self.emit(text);
        } else {
            self.emit(text.yellow());
        }
    }

    fn snapshot(&mut self, totals: Counts) {
        let [header, total] = report::snapshot_lines(totals);
        self.emit(header.bright_black());
        self.emit(total.bold());
    }
}

//! # Range Compression
//!
//! The inverse of target expansion: summarizes a collection of addresses as
//! the shortest readable range list, e.g. `192.168.1.1-3, 192.168.1.5`.
//!
//! Only IPv4 addresses are merged. IPv6 addresses are listed verbatim after
//! all IPv4 output. A repeated IPv4 address merges into the run containing it.

use std::net::{IpAddr, Ipv6Addr};

use crate::network::address;
use crate::network::range::Ipv4Range;

/// Rendered for an empty collection.
pub const NONE_PLACEHOLDER: &str = "(none)";

pub fn compress<'a>(addrs: impl IntoIterator<Item = &'a IpAddr>) -> String {
    let mut v4: Vec<u32> = Vec::new();
    let mut v6: Vec<Ipv6Addr> = Vec::new();
    for addr in addrs {
        match addr {
            IpAddr::V4(ipv4_addr) => v4.push(address::to_u32(*ipv4_addr)),
            IpAddr::V6(ipv6_addr) => v6.push(*ipv6_addr),
        }
    }

    let mut parts: Vec<String> = contiguous_runs(v4).iter().map(render_run).collect();
    parts.extend(v6.iter().map(Ipv6Addr::to_string));

    if parts.is_empty() {
        NONE_PLACEHOLDER.to_string()
    } else {
        parts.join(", ")
    }
}

/// Sorts and deduplicates `values`, then groups them into maximal runs of
/// consecutive addresses.
pub fn contiguous_runs(mut values: Vec<u32>) -> Vec<Ipv4Range> {
    values.sort_unstable();
    values.dedup();

    let mut runs: Vec<Ipv4Range> = Vec::new();
    let mut iter = values.into_iter();
    let Some(first) = iter.next() else {
        return runs;
    };

    let (mut start, mut end) = (first, first);
    for value in iter {
        if end.checked_add(1) == Some(value) {
            end = value;
        } else {
            runs.push(Ipv4Range::new(address::from_u32(start), address::from_u32(end)));
            (start, end) = (value, value);
        }
    }
    runs.push(Ipv4Range::new(address::from_u32(start), address::from_u32(end)));
    runs
}

fn render_run(run: &Ipv4Range) -> String {
    let start: u32 = address::to_u32(run.start_addr);
    let end: u32 = address::to_u32(run.end_addr);

    if start == end {
        run.start_addr.to_string()
    } else if start >> 8 == end >> 8 {
        format!("{}-{}", run.start_addr, end & 0xFF)
    } else {
        format!("{}-{}", run.start_addr, run.end_addr)
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

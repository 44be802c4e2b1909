//! # IPv4 Range Model
//!
//! Inclusive ranges of IPv4 addresses, plus the usable host range of a CIDR block.

use std::net::Ipv4Addr;

use pnet::ipnetwork::{IpNetworkError, Ipv4Network};

/// A continuous range of IPv4 addresses, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Range {
    pub start_addr: Ipv4Addr,
    pub end_addr: Ipv4Addr,
}

impl Ipv4Range {
    pub fn new(start_addr: Ipv4Addr, end_addr: Ipv4Addr) -> Self {
        Self {
            start_addr,
            end_addr,
        }
    }

    /// Builds a range from two endpoints given in either order.
    pub fn ordered(a: Ipv4Addr, b: Ipv4Addr) -> Self {
        if a <= b { Self::new(a, b) } else { Self::new(b, a) }
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = Ipv4Addr> + Clone {
        let start: u32 = u32::from(self.start_addr);
        let end: u32 = u32::from(self.end_addr);
        (start..=end).map(Ipv4Addr::from)
    }

    pub fn len(&self) -> u64 {
        let start = u64::from(u32::from(self.start_addr));
        let end = u64::from(u32::from(self.end_addr));
        if start > end { 0 } else { end - start + 1 }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        self.start_addr <= addr && addr <= self.end_addr
    }
}

/// Returns the probe-able hosts of `ip/prefix`.
///
/// * `/32` is the single address.
/// * `/31` is a point-to-point pair, both addresses are hosts.
/// * anything shorter excludes the network and broadcast addresses.
pub fn cidr_hosts(ip: Ipv4Addr, prefix: u8) -> Result<Ipv4Range, IpNetworkError> {
    let network = Ipv4Network::new(ip, prefix)?;
    let first: u32 = u32::from(network.network());
    let last: u32 = u32::from(network.broadcast());

    let range = match prefix {
        32 => Ipv4Range::new(ip, ip),
        31 => Ipv4Range::new(Ipv4Addr::from(first), Ipv4Addr::from(last)),
        _ => Ipv4Range::new(Ipv4Addr::from(first + 1), Ipv4Addr::from(last - 1)),
    };
    Ok(range)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

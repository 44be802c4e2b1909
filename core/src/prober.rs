//! # Probers
//!
//! A [`Prober`] sends one echo request and waits for the matching reply.
//! [`IcmpProber`] is the real one; tests plug in scripted probers.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Once;
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

use echoscan_common::config::ProbeOptions;
use is_root::is_root;
use tracing::{debug, warn};

use crate::network::icmp::{self, SocketMode};

/// A successful echo exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoReply {
    pub rtt: Duration,
    /// `None` when the socket does not expose the reply's IP header.
    pub ttl: Option<u8>,
    /// Echo payload bytes in the reply.
    pub bytes: usize,
    /// Addresses from a record-route option, in hop order.
    pub route_hops: Vec<Ipv4Addr>,
    /// Values from a timestamp option, milliseconds since midnight UT.
    pub timestamps: Vec<u32>,
}

/// Sends one probe. `None` covers timeouts, unreachable hosts and local
/// send failures alike; the scheduler counts all of them as a loss.
pub trait Prober: Send + Sync {
    fn probe(&self, addr: IpAddr, options: &ProbeOptions) -> Option<EchoReply>;
}

/// ICMP echo over raw sockets when privileged, datagram ICMP sockets otherwise.
pub struct IcmpProber {
    mode: SocketMode,
    identifier: u16,
    sequence: AtomicU16,
    options_warning: Once,
}

impl IcmpProber {
    pub fn new() -> Self {
        let mode = if is_root() {
            SocketMode::Raw
        } else {
            warn!("Not running as root, falling back to unprivileged ICMP sockets");
            SocketMode::Datagram
        };
        Self::with_mode(mode)
    }

    fn with_mode(mode: SocketMode) -> Self {
        let identifier: u16 = rand::random();
        debug!(?mode, identifier, "ICMP prober ready");
        Self {
            mode,
            identifier,
            sequence: AtomicU16::new(0),
            options_warning: Once::new(),
        }
    }
}

impl Default for IcmpProber {
    fn default() -> Self {
        Self::new()
    }
}

impl Prober for IcmpProber {
    fn probe(&self, addr: IpAddr, options: &ProbeOptions) -> Option<EchoReply> {
        let sequence: u16 = self.sequence.fetch_add(1, Ordering::Relaxed);

        let result = match addr {
            IpAddr::V4(dst) => {
                if self.mode == SocketMode::Datagram && options.needs_ip_options() {
                    self.options_warning.call_once(|| {
                        warn!("IP options need raw sockets and are ignored without root");
                    });
                }
                icmp::echo_v4(dst, options, self.mode, self.identifier, sequence)
            }
            IpAddr::V6(dst) => icmp::echo_v6(dst, options, self.mode, self.identifier, sequence),
        };

        match result {
            Ok(reply) => reply,
            Err(e) => {
                debug!(%addr, sequence, "probe failed: {e:#}");
                None
            }
        }
    }
}

use std::net::IpAddr;
use std::time::Duration;

use crate::network::address::AddressFamily;

pub const DEFAULT_CONCURRENCY: usize = 100;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1_000);
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1_000);
pub const DEFAULT_PAYLOAD_SIZE: usize = 32;
pub const MAX_PAYLOAD_SIZE: usize = 65_500;
pub const DEFAULT_TTL: u8 = 128;
pub const MAX_HOSTS_DEFAULT: usize = 65_536;

pub const MAX_RECORD_ROUTE: u8 = 9;
pub const MAX_TIMESTAMP: u8 = 4;
pub const MAX_SOURCE_ROUTE: usize = 9;

/// Which address family the user forced with `-4` / `-6`, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FamilyPreference {
    #[default]
    Any,
    V4Only,
    V6Only,
}

impl FamilyPreference {
    pub fn allows(&self, addr: &IpAddr) -> bool {
        match self {
            Self::Any => true,
            Self::V4Only => addr.is_ipv4(),
            Self::V6Only => addr.is_ipv6(),
        }
    }

    pub fn forced_family(&self) -> Option<AddressFamily> {
        match self {
            Self::Any => None,
            Self::V4Only => Some(AddressFamily::V4),
            Self::V6Only => Some(AddressFamily::V6),
        }
    }
}

/// Per-probe settings handed to the prober.
///
/// Options marked IPv4-only are ignored for IPv6 targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOptions {
    pub timeout: Duration,
    pub payload_size: usize,
    pub ttl: u8,
    /// IPv4 only.
    pub tos: u8,
    /// IPv4 only.
    pub dont_fragment: bool,
    /// Number of record-route slots (0 disables). IPv4 only.
    pub record_route: u8,
    /// Number of timestamp slots (0 disables). IPv4 only.
    pub timestamp: u8,
    pub loose_source_route: Vec<IpAddr>,
    pub strict_source_route: Vec<IpAddr>,
    pub source_address: Option<IpAddr>,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            payload_size: DEFAULT_PAYLOAD_SIZE,
            ttl: DEFAULT_TTL,
            tos: 0,
            dont_fragment: false,
            record_route: 0,
            timestamp: 0,
            loose_source_route: Vec::new(),
            strict_source_route: Vec::new(),
            source_address: None,
        }
    }
}

impl ProbeOptions {
    /// True when the request needs a hand-built IPv4 header.
    pub fn needs_ip_options(&self) -> bool {
        self.dont_fragment
            || self.record_route > 0
            || self.timestamp > 0
            || !self.loose_source_route.is_empty()
            || !self.strict_source_route.is_empty()
    }
}

/// How the scheduler drives the probes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Probes per target, `None` keeps going until stopped.
    pub count: Option<u64>,
    pub interval: Duration,
    pub concurrency: usize,
    /// Annotate output lines with reverse-resolved hostnames.
    pub resolve_names: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            count: Some(1),
            interval: DEFAULT_INTERVAL,
            concurrency: DEFAULT_CONCURRENCY,
            resolve_names: false,
        }
    }
}

/// Limits applied while building the target set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetOptions {
    pub max_hosts: usize,
    /// Lifts `max_hosts` entirely.
    pub force: bool,
    pub family: FamilyPreference,
}

impl Default for TargetOptions {
    fn default() -> Self {
        Self {
            max_hosts: MAX_HOSTS_DEFAULT,
            force: false,
            family: FamilyPreference::Any,
        }
    }
}

impl TargetOptions {
    /// Emission cap handed to the expander for each token.
    pub fn expansion_cap(&self) -> usize {
        if self.force { usize::MAX } else { self.max_hosts }
    }
}

pub mod ping;

use std::net::IpAddr;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use echoscan_common::config::{
    DEFAULT_CONCURRENCY, DEFAULT_INTERVAL, DEFAULT_PAYLOAD_SIZE, DEFAULT_TIMEOUT, DEFAULT_TTL, FamilyPreference,
    MAX_HOSTS_DEFAULT, MAX_PAYLOAD_SIZE, MAX_RECORD_ROUTE, MAX_TIMESTAMP, ProbeOptions, RunConfig, TargetOptions,
};
use echoscan_core::network::packet;

#[derive(Parser, Debug)]
#[command(name = "echoscan", version)]
#[command(about = "Concurrent ICMP echo sweeps over addresses, hostnames and ranges.")]
pub struct CommandLine {
    /// Addresses, hostnames, CIDR blocks or ranges (192.168.1.1-10, 192.168.1-3, 192.168.1.1,5,9)
    #[arg(required = true, num_args = 1.., value_name = "TARGET")]
    pub targets: Vec<String>,

    /// Ping until stopped with Ctrl+C
    #[arg(short = 't', conflicts_with = "count")]
    pub continuous: bool,

    /// Echo requests per target
    #[arg(short = 'n', value_name = "COUNT", default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    pub count: u64,

    /// Resolve addresses to hostnames
    #[arg(short = 'a')]
    pub resolve: bool,

    /// Payload size in bytes
    #[arg(
        short = 'l',
        value_name = "SIZE",
        default_value_t = DEFAULT_PAYLOAD_SIZE as u32,
        value_parser = clap::value_parser!(u32).range(0..=MAX_PAYLOAD_SIZE as i64)
    )]
    pub size: u32,

    /// Set the don't-fragment flag (IPv4)
    #[arg(short = 'f')]
    pub dont_fragment: bool,

    /// Time to live
    #[arg(short = 'i', value_name = "TTL", default_value_t = DEFAULT_TTL, value_parser = clap::value_parser!(u8).range(1..=255))]
    pub ttl: u8,

    /// Type of service (IPv4)
    #[arg(short = 'v', value_name = "TOS", default_value_t = 0)]
    pub tos: u8,

    /// Record the route for up to COUNT hops (IPv4)
    #[arg(short = 'r', value_name = "COUNT", value_parser = clap::value_parser!(u8).range(1..=MAX_RECORD_ROUTE as i64))]
    pub record_route: Option<u8>,

    /// Request timestamps from up to COUNT hops (IPv4)
    #[arg(short = 's', value_name = "COUNT", value_parser = clap::value_parser!(u8).range(1..=MAX_TIMESTAMP as i64))]
    pub timestamp: Option<u8>,

    /// Loose source route along a comma-separated host list (IPv4)
    #[arg(short = 'j', value_name = "LIST", value_delimiter = ',', conflicts_with = "strict_route")]
    pub loose_route: Vec<IpAddr>,

    /// Strict source route along a comma-separated host list (IPv4)
    #[arg(short = 'k', value_name = "LIST", value_delimiter = ',')]
    pub strict_route: Vec<IpAddr>,

    /// Milliseconds to wait for each reply
    #[arg(
        short = 'w',
        value_name = "TIMEOUT",
        default_value_t = DEFAULT_TIMEOUT.as_millis() as u64,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: u64,

    /// Source address to send from
    #[arg(short = 'S', value_name = "ADDR")]
    pub source: Option<IpAddr>,

    /// Force IPv4
    #[arg(short = '4', conflicts_with = "ipv6")]
    pub ipv4: bool,

    /// Force IPv6
    #[arg(short = '6')]
    pub ipv6: bool,

    /// Number of concurrent workers
    #[arg(long, value_name = "N", default_value_t = DEFAULT_CONCURRENCY as u32, value_parser = clap::value_parser!(u32).range(1..))]
    pub concurrency: u32,

    /// Milliseconds each worker waits between probes
    #[arg(long, value_name = "MS", default_value_t = DEFAULT_INTERVAL.as_millis() as u64)]
    pub interval: u64,

    /// Comma-separated targets to leave out, same syntax as TARGET
    #[arg(long, value_name = "LIST")]
    pub exclude: Vec<String>,

    /// Allow more than the default host limit
    #[arg(long)]
    pub force: bool,

    /// Debug logging on stderr
    #[arg(long)]
    pub verbose: bool,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn probe_options(&self) -> anyhow::Result<ProbeOptions> {
        let options = ProbeOptions {
            timeout: Duration::from_millis(self.timeout),
            payload_size: self.size as usize,
            ttl: self.ttl,
            tos: self.tos,
            dont_fragment: self.dont_fragment,
            record_route: self.record_route.unwrap_or(0),
            timestamp: self.timestamp.unwrap_or(0),
            loose_source_route: self.loose_route.clone(),
            strict_source_route: self.strict_route.clone(),
            source_address: self.source,
        };
        packet::ip_options(&options).context("invalid IP options")?;
        Ok(options)
    }

    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            count: (!self.continuous).then_some(self.count),
            interval: Duration::from_millis(self.interval),
            concurrency: self.concurrency as usize,
            resolve_names: self.resolve,
        }
    }

    pub fn target_options(&self) -> TargetOptions {
        let family = if self.ipv4 {
            FamilyPreference::V4Only
        } else if self.ipv6 {
            FamilyPreference::V6Only
        } else {
            FamilyPreference::Any
        };
        TargetOptions {
            max_hosts: MAX_HOSTS_DEFAULT,
            force: self.force,
            family,
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

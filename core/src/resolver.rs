//! # Name Resolution
//!
//! Forward lookups happen once, while the target set is built, so they are
//! async. Reverse lookups happen on worker threads and block, bounded by a
//! timeout.

use std::net::IpAddr;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use echoscan_common::config::FamilyPreference;
use tracing::debug;

pub const REVERSE_LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);

#[async_trait]
pub trait ForwardResolver: Send + Sync {
    /// Addresses for `host` allowed by `family`, in resolver order. Empty
    /// when the name does not resolve.
    async fn resolve(&self, host: &str, family: FamilyPreference) -> Vec<IpAddr>;
}

pub trait ReverseResolver: Send + Sync {
    /// The name registered for `addr`, `None` on failure or timeout.
    fn lookup(&self, addr: IpAddr) -> Option<String>;
}

/// The operating system's resolver.
#[derive(Debug, Clone)]
pub struct SystemResolver {
    reverse_timeout: Duration,
}

impl SystemResolver {
    pub fn new() -> Self {
        Self {
            reverse_timeout: REVERSE_LOOKUP_TIMEOUT,
        }
    }
}

impl Default for SystemResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ForwardResolver for SystemResolver {
    async fn resolve(&self, host: &str, family: FamilyPreference) -> Vec<IpAddr> {
        let addrs = match tokio::net::lookup_host((host, 0)).await {
            Ok(addrs) => addrs,
            Err(e) => {
                debug!(host, "forward lookup failed: {e}");
                return Vec::new();
            }
        };

        let mut resolved: Vec<IpAddr> = Vec::new();
        for ip in addrs.map(|socket_addr| socket_addr.ip()) {
            if family.allows(&ip) && !resolved.contains(&ip) {
                resolved.push(ip);
            }
        }
        debug!(host, count = resolved.len(), "resolved host");
        resolved
    }
}

impl ReverseResolver for SystemResolver {
    fn lookup(&self, addr: IpAddr) -> Option<String> {
        let (tx, rx) = mpsc::channel();
        // A lookup that outlives the timeout finishes on its own thread and is discarded.
        thread::spawn(move || {
            let _ = tx.send(dns_lookup::lookup_addr(&addr));
        });

        match rx.recv_timeout(self.reverse_timeout) {
            Ok(Ok(name)) if name != addr.to_string() => Some(name),
            Ok(Ok(_)) => None,
            Ok(Err(e)) => {
                debug!(%addr, "reverse lookup failed: {e}");
                None
            }
            Err(_) => {
                debug!(%addr, "reverse lookup timed out");
                None
            }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_literal_respects_family() {
        let resolver = SystemResolver::new();
        let any = resolver.resolve("127.0.0.1", FamilyPreference::Any).await;
        assert_eq!(any, vec!["127.0.0.1".parse::<IpAddr>().unwrap()]);

        let v6_only = resolver.resolve("127.0.0.1", FamilyPreference::V6Only).await;
        assert!(v6_only.is_empty());
    }
}

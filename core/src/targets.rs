//! # Target Set
//!
//! Builds the ordered list of addresses a run probes: every argument is split
//! into tokens, each token is expanded or resolved, exclusions are removed and
//! the result is checked against the host limit. Duplicates are kept.

use std::collections::HashSet;
use std::net::IpAddr;

use echoscan_common::config::{FamilyPreference, TargetOptions};
use echoscan_common::error::TargetError;
use echoscan_common::network::address::AddressFamily;
use echoscan_common::network::target::{self, Coverage, TokenKind};
use tracing::{debug, info, warn};

use crate::resolver::ForwardResolver;

pub async fn build_target_set<R>(
    args: &[String],
    exclusions: &[String],
    resolver: &R,
    options: &TargetOptions,
) -> Result<Vec<IpAddr>, TargetError>
where
    R: ForwardResolver + ?Sized,
{
    let mut targets: Vec<IpAddr> = Vec::new();
    for token in args.iter().flat_map(|arg| target::split_argument(arg)) {
        targets.extend(expand_token(&token, resolver, options).await?);
    }

    if !exclusions.is_empty() {
        let excluded = Exclusions::build(exclusions, resolver).await?;
        let before: usize = targets.len();
        targets.retain(|addr| !excluded.contains(addr));
        debug!(removed = before - targets.len(), "applied exclusions");
    }

    if targets.is_empty() {
        return Err(TargetError::NoTargets);
    }
    if !options.force && targets.len() > options.max_hosts {
        return Err(TargetError::CapExceeded {
            count: targets.len(),
            max: options.max_hosts,
        });
    }

    info!("Built target set of {} addresses", targets.len());
    Ok(targets)
}

/// Addresses to drop from the target set, in any family.
///
/// Literal tokens are matched by span containment, so an exclusion is never
/// enumerated and never subject to the host limit.
struct Exclusions {
    resolved: HashSet<IpAddr>,
    literals: Vec<Coverage>,
}

impl Exclusions {
    async fn build<R>(exclusions: &[String], resolver: &R) -> Result<Self, TargetError>
    where
        R: ForwardResolver + ?Sized,
    {
        let mut resolved: HashSet<IpAddr> = HashSet::new();
        let mut literals: Vec<Coverage> = Vec::new();

        for token in exclusions.iter().flat_map(|arg| target::split_argument(arg)) {
            if target::classify(&token) == TokenKind::Hostname {
                let addrs = resolver.resolve(&token, FamilyPreference::Any).await;
                if addrs.is_empty() {
                    warn!("Exclusion '{}' did not resolve, skipping it", token);
                }
                resolved.extend(addrs);
            } else {
                literals.push(target::coverage(&token)?);
            }
        }
        Ok(Self { resolved, literals })
    }

    fn contains(&self, addr: &IpAddr) -> bool {
        self.resolved.contains(addr) || self.literals.iter().any(|coverage| coverage.contains(addr))
    }
}

async fn expand_token<R>(token: &str, resolver: &R, options: &TargetOptions) -> Result<Vec<IpAddr>, TargetError>
where
    R: ForwardResolver + ?Sized,
{
    if target::classify(token) == TokenKind::Hostname {
        let mut resolved = resolver.resolve(token, options.family).await;
        resolved.retain(|addr| options.family.allows(addr));
        if resolved.is_empty() {
            return Err(TargetError::Resolution {
                host: token.to_string(),
            });
        }
        return Ok(resolved);
    }

    let addrs = target::expand(token, options.expansion_cap())?;
    if let Some(family) = options.family.forced_family() {
        if let Some(addr) = addrs.iter().find(|addr| AddressFamily::of(addr) != family) {
            return Err(TargetError::FamilyMismatch { addr: *addr, family });
        }
    }
    Ok(addrs)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

//! # Target Expansion
//!
//! Turns one raw target token into the concrete addresses it denotes.
//!
//! Supported token forms, checked in this order:
//! * **IPv6**: a single literal, e.g. `2001:db8::1` (no ranges, no CIDR).
//! * **CIDR**: `192.168.1.0/24`, network and broadcast excluded below `/31`.
//! * **Last-octet range**: `192.168.1.1-10`.
//! * **Third-octet range**: `192.168.1-3`, each expanded to hosts `.1` to `.254`.
//! * **Full range**: `10.0.0.250-10.0.1.5`.
//! * **Comma list**: `192.168.2.1,3-5,10`, values of the last segment.
//! * **IPv4**: a single literal, e.g. `192.168.0.1`.
//!
//! Anything else that looks like a name is a [`TokenKind::Hostname`] and has to be
//! resolved by the caller. Expansion is all-or-nothing: one malformed component
//! fails the whole token.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use tracing::debug;

use crate::error::TargetError;
use crate::network::address::{self, AddressFamily};
use crate::network::range::{self, Ipv4Range};

/// Syntactic class of a target token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    SingleV6,
    Cidr,
    LastOctetRange,
    ThirdOctetRange,
    FullRange,
    CommaList,
    SingleV4,
    Hostname,
}

/// Classifies `token` without validating its components.
pub fn classify(token: &str) -> TokenKind {
    if address::is_ipv6_form(token) {
        return TokenKind::SingleV6;
    }
    if is_possible_hostname(token) {
        return TokenKind::Hostname;
    }
    if token.contains('/') {
        return TokenKind::Cidr;
    }
    if token.contains('-') && !token.contains(',') {
        if let Some(kind) = classify_dash_range(token) {
            return kind;
        }
    }
    if token.contains(',') {
        return TokenKind::CommaList;
    }
    TokenKind::SingleV4
}

fn classify_dash_range(token: &str) -> Option<TokenKind> {
    let segments: Vec<&str> = token.split('.').collect();
    match segments.len() {
        4 if segments[3].contains('-') => Some(TokenKind::LastOctetRange),
        3 if segments[2].contains('-') => Some(TokenKind::ThirdOctetRange),
        _ => {
            let (start, end) = token.split_once('-')?;
            let is_full = start.split('.').count() == 4 && end.split('.').count() == 4;
            is_full.then_some(TokenKind::FullRange)
        }
    }
}

/// The addresses a literal token denotes, before any cap is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Coverage {
    V6(Ipv6Addr),
    /// Inclusive IPv4 spans, in emission order.
    V4(Vec<Ipv4Range>),
}

impl Coverage {
    pub fn contains(&self, addr: &IpAddr) -> bool {
        match (self, addr) {
            (Coverage::V6(own), IpAddr::V6(other)) => own == other,
            (Coverage::V4(spans), IpAddr::V4(other)) => spans.iter().any(|span| span.contains(*other)),
            _ => false,
        }
    }
}

/// Parses `token` into the spans it covers without enumerating them.
///
/// Hostname tokens are rejected here.
pub fn coverage(token: &str) -> Result<Coverage, TargetError> {
    let spans: Vec<Ipv4Range> = match classify(token) {
        TokenKind::SingleV6 => {
            return match address::parse(token, AddressFamily::V6) {
                Ok(IpAddr::V6(addr)) => Ok(Coverage::V6(addr)),
                Ok(IpAddr::V4(_)) => Err(TargetError::syntax(token, "not an IPv6 address")),
                Err(e) => Err(TargetError::syntax(token, e.to_string())),
            };
        }
        TokenKind::Cidr => vec![cidr_span(token)?],
        TokenKind::LastOctetRange => vec![last_octet_span(token)?],
        TokenKind::ThirdOctetRange => third_octet_spans(token)?,
        TokenKind::FullRange => vec![full_range_span(token)?],
        TokenKind::CommaList => comma_list_spans(token)?,
        TokenKind::SingleV4 => {
            let addr = address::parse_v4(token)
                .map_err(|_| TargetError::syntax(token, "not a valid IP address or target format"))?;
            vec![Ipv4Range::new(addr, addr)]
        }
        TokenKind::Hostname => {
            return Err(TargetError::syntax(token, "hostnames must be resolved before expansion"));
        }
    };
    Ok(Coverage::V4(spans))
}

/// Expands `token` into at most `max_hosts` addresses.
///
/// The cap truncates silently; checking the merged set against the host limit
/// is the caller's job. Hostname tokens are rejected here.
pub fn expand(token: &str, max_hosts: usize) -> Result<Vec<IpAddr>, TargetError> {
    let mut out = Emitter::new(max_hosts);
    match coverage(token)? {
        Coverage::V6(addr) => out.push(IpAddr::V6(addr)),
        Coverage::V4(spans) => {
            for span in &spans {
                out.extend(span.iter());
            }
        }
    }

    debug!(token, kind = ?classify(token), count = out.addrs.len(), "expanded target token");
    Ok(out.addrs)
}

/// Collects addresses up to a fixed cap.
struct Emitter {
    addrs: Vec<IpAddr>,
    cap: usize,
}

impl Emitter {
    fn new(cap: usize) -> Self {
        Self {
            addrs: Vec::new(),
            cap,
        }
    }

    fn push(&mut self, addr: IpAddr) {
        if self.addrs.len() < self.cap {
            self.addrs.push(addr);
        }
    }

    fn extend(&mut self, addrs: impl Iterator<Item = Ipv4Addr>) {
        let room = self.cap.saturating_sub(self.addrs.len());
        self.addrs.extend(addrs.take(room).map(IpAddr::V4));
    }
}

fn cidr_span(token: &str) -> Result<Ipv4Range, TargetError> {
    let Some((ip_str, prefix_str)) = token.split_once('/') else {
        return Err(TargetError::syntax(token, "missing CIDR prefix"));
    };

    let prefix = address::parse_octet(prefix_str)
        .filter(|prefix| *prefix <= 32)
        .ok_or_else(|| TargetError::syntax(token, format!("invalid CIDR prefix '{prefix_str}'")))?;

    let ip = address::parse_v4(ip_str)
        .map_err(|_| TargetError::syntax(token, format!("invalid address '{ip_str}' in CIDR")))?;

    range::cidr_hosts(ip, prefix).map_err(|e| TargetError::syntax(token, e.to_string()))
}

fn last_octet_span(token: &str) -> Result<Ipv4Range, TargetError> {
    let segments: Vec<&str> = token.split('.').collect();
    let (start, end) = parse_octet_range(segments[3])
        .ok_or_else(|| TargetError::syntax(token, format!("invalid last-octet range '{}'", segments[3])))?;
    let [a, b, c] = parse_leading_octets::<3>(token, &segments[..3])?;

    Ok(Ipv4Range::new(Ipv4Addr::new(a, b, c, start), Ipv4Addr::new(a, b, c, end)))
}

fn third_octet_spans(token: &str) -> Result<Vec<Ipv4Range>, TargetError> {
    let segments: Vec<&str> = token.split('.').collect();
    let (start, end) = parse_octet_range(segments[2])
        .ok_or_else(|| TargetError::syntax(token, format!("invalid third-octet range '{}'", segments[2])))?;
    let [a, b] = parse_leading_octets::<2>(token, &segments[..2])?;

    // Every /24 in the range contributes .1 to .254, whatever the real subnet size is.
    let spans = (start..=end)
        .map(|c| Ipv4Range::new(Ipv4Addr::new(a, b, c, 1), Ipv4Addr::new(a, b, c, 254)))
        .collect();
    Ok(spans)
}

fn full_range_span(token: &str) -> Result<Ipv4Range, TargetError> {
    let Some((start_str, end_str)) = token.split_once('-') else {
        return Err(TargetError::syntax(token, "missing range separator"));
    };
    let start = address::parse_v4(start_str)
        .map_err(|_| TargetError::syntax(token, format!("invalid range start '{start_str}'")))?;
    let end = address::parse_v4(end_str)
        .map_err(|_| TargetError::syntax(token, format!("invalid range end '{end_str}'")))?;

    Ok(Ipv4Range::ordered(start, end))
}

fn comma_list_spans(token: &str) -> Result<Vec<Ipv4Range>, TargetError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 4 || !segments[3].contains(',') {
        return Err(TargetError::syntax(token, "a comma list is only allowed in the last segment"));
    }
    let [a, b, c] = parse_leading_octets::<3>(token, &segments[..3])?;

    let mut spans: Vec<Ipv4Range> = Vec::new();
    for part in segments[3].split(',').filter(|part| !part.is_empty()) {
        let (start, end) = if part.contains('-') {
            parse_octet_range(part)
        } else {
            address::parse_octet(part).map(|value| (value, value))
        }
        .ok_or_else(|| TargetError::syntax(token, format!("invalid last-segment value '{part}'")))?;

        spans.push(Ipv4Range::new(Ipv4Addr::new(a, b, c, start), Ipv4Addr::new(a, b, c, end)));
    }
    Ok(spans)
}

/// Parses `start-end` octet bounds, swapping them if reversed.
fn parse_octet_range(text: &str) -> Option<(u8, u8)> {
    let (left, right) = text.split_once('-')?;
    let start = address::parse_octet(left)?;
    let end = address::parse_octet(right)?;
    Some((start.min(end), start.max(end)))
}

fn parse_leading_octets<const N: usize>(token: &str, segments: &[&str]) -> Result<[u8; N], TargetError> {
    let mut octets = [0u8; N];
    if segments.len() != N {
        return Err(TargetError::syntax(token, "wrong number of address segments"));
    }
    for (octet, segment) in octets.iter_mut().zip(segments) {
        *octet = address::parse_octet(segment)
            .ok_or_else(|| TargetError::syntax(token, format!("invalid octet '{segment}'")))?;
    }
    Ok(octets)
}

/// Decides whether `token` should be handed to the forward resolver.
///
/// Literal addresses, CIDR blocks, comma lists and purely numeric ranges are not
/// hostnames. A token made only of digits and dots never is either, so a bad
/// octet surfaces as a syntax error instead of a failed DNS query.
pub fn is_possible_hostname(token: &str) -> bool {
    if token.is_empty() || token.contains(',') || token.contains('/') {
        return false;
    }
    if token.parse::<IpAddr>().is_ok() {
        return false;
    }
    if token.bytes().any(|b| b.is_ascii_alphabetic()) {
        return true;
    }
    if token.contains('-') {
        return !token.contains('.');
    }
    token.matches('.').count() >= 2 && !token.bytes().all(|b| b.is_ascii_digit() || b == b'.')
}

/// Splits one command-line argument into target tokens.
///
/// `192.168.1.1,10.0.0.1` and `a.com,b.com` are several independent targets,
/// while `192.168.2.1,3,5` is a single last-segment list.
pub fn split_argument(arg: &str) -> Vec<String> {
    if !arg.contains(',') {
        return vec![arg.to_string()];
    }

    if arg.split(',').all(is_complete_target) {
        arg.split(',')
            .filter(|part| !part.is_empty())
            .map(String::from)
            .collect()
    } else {
        vec![arg.to_string()]
    }
}

fn is_complete_target(part: &str) -> bool {
    part.is_empty()
        || part.contains('.')
        || part.contains(':')
        || part.bytes().any(|b| b.is_ascii_alphabetic())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

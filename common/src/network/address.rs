//! # Address Codec
//!
//! Conversions between textual addresses and their numeric form.
//!
//! Validation is strict: wrong segment counts, out-of-range octets or groups
//! and trailing garbage are all rejected. The canonical text of an address is
//! its [`std::fmt::Display`] output, so `format` and `parse` round-trip.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::error::AddressError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    V4,
    V6,
    /// The text failed validation for the family it implied.
    Unknown,
}

impl AddressFamily {
    pub fn of(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => Self::V4,
            IpAddr::V6(_) => Self::V6,
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::V4 => "IPv4",
            Self::V6 => "IPv6",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Parses `text` as an address of `family`.
///
/// `AddressFamily::Unknown` lets the text pick its family the same way
/// [`family_of`] does.
pub fn parse(text: &str, family: AddressFamily) -> Result<IpAddr, AddressError> {
    let family = match family {
        AddressFamily::Unknown => implied_family(text),
        known => known,
    };

    match family {
        AddressFamily::V6 => text
            .parse::<Ipv6Addr>()
            .map(IpAddr::V6)
            .map_err(|_| AddressError::InvalidV6(text.to_string())),
        _ => parse_v4(text).map(IpAddr::V4),
    }
}

pub fn parse_v4(text: &str) -> Result<Ipv4Addr, AddressError> {
    text.parse::<Ipv4Addr>()
        .map_err(|_| AddressError::InvalidV4(text.to_string()))
}

pub fn format(addr: &IpAddr) -> String {
    addr.to_string()
}

/// Colon presence implies an attempted IPv6 address, anything else an IPv4 one.
pub fn family_of(text: &str) -> AddressFamily {
    let implied = implied_family(text);
    match parse(text, implied) {
        Ok(_) => implied,
        Err(_) => AddressFamily::Unknown,
    }
}

pub fn is_ipv6_form(text: &str) -> bool {
    text.contains(':')
}

fn implied_family(text: &str) -> AddressFamily {
    if is_ipv6_form(text) {
        AddressFamily::V6
    } else {
        AddressFamily::V4
    }
}

pub fn to_u32(addr: Ipv4Addr) -> u32 {
    u32::from(addr)
}

pub fn from_u32(value: u32) -> Ipv4Addr {
    Ipv4Addr::from(value)
}

/// Parses a single decimal octet (0-255).
///
/// Only ASCII digits are accepted; signs, whitespace and empty input are not.
pub fn parse_octet(text: &str) -> Option<u8> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse::<u32>()
        .ok()
        .and_then(|value| u8::try_from(value).ok())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

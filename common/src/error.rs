//! Errors raised while turning raw input into a target set.
//!
//! Every variant of [`TargetError`] is fatal for the invocation and is detected
//! before the first probe is sent. Probe failures are not errors; they are
//! counted as losses by the scheduler.

use std::net::IpAddr;

use thiserror::Error;

use crate::network::address::AddressFamily;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("'{0}' is not a valid IPv4 address")]
    InvalidV4(String),
    #[error("'{0}' is not a valid IPv6 address")]
    InvalidV6(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TargetError {
    /// A token component is out of its domain (octet, prefix, range bound).
    #[error("invalid target '{token}': {reason}")]
    Syntax { token: String, reason: String },

    /// A hostname token yielded no usable address.
    #[error("could not resolve host '{host}'")]
    Resolution { host: String },

    /// The merged target set is larger than the configured maximum.
    #[error("target count ({count}) exceeds the limit of {max}, use --force to override")]
    CapExceeded { count: usize, max: usize },

    /// A literal address contradicts the forced address family.
    #[error("{addr} is not an {family} address")]
    FamilyMismatch { addr: IpAddr, family: AddressFamily },

    #[error("no targets were generated")]
    NoTargets,
}

impl TargetError {
    pub fn syntax(token: &str, reason: impl Into<String>) -> Self {
        Self::Syntax {
            token: token.to_string(),
            reason: reason.into(),
        }
    }
}

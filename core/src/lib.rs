//! # echoscan core
//!
//! The moving parts of a run:
//!
//! * **[`targets`]**: builds the final address set from raw tokens, exclusions and DNS.
//! * **[`scheduler`]**: the bounded worker pool that probes the set round-robin.
//! * **[`stats`]**: lock-free per-target counters and the end-of-run summary.
//! * **[`control`]**: stop / snapshot flags shared with signal handlers.
//! * **[`prober`]** and **[`network`]**: ICMP echo over raw or datagram sockets.
//! * **[`resolver`]**: forward and reverse name lookups.
//! * **[`report`]**: the textual output lines.

pub mod control;
pub mod network;
pub mod prober;
pub mod report;
pub mod resolver;
pub mod scheduler;
pub mod stats;
pub mod targets;

//! # echoscan common
//!
//! Everything that can be decided without touching the network:
//!
//! * **[`network`]**: address parsing, target expansion and range compression.
//! * **[`config`]**: probe, run and target options shared by the core and the CLI.
//! * **[`error`]**: the fatal error taxonomy raised before probing starts.

pub mod config;
pub mod error;
pub mod network;

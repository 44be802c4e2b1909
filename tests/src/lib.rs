//! Cross-crate tests. Nothing here touches the network: probing goes through
//! scripted probers and name lookups through in-memory resolvers.

mod support;

mod compression;
mod scheduler;
mod targets;

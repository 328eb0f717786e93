//! vaultwrap: Secret Server credential injection with proxy resolution and
//! output masking.
//!
//! The crate resolves secrets from a remote Secret Server vault, injects them
//! into a child command's environment, and guarantees that resolved values
//! never appear verbatim in the command's observed output streams.

pub mod cli;
pub mod config;
pub mod logging;
pub mod runner;
pub mod vault;

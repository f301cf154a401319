//! Error taxonomy for the probe core
//!
//! Resolution failures are fatal at startup but swallowed on mid-run retry
//! paths. A single failed probe is data, not an error. Cancellation is a
//! normal stop condition and has no error kind at all.

use std::time::Duration;
use thiserror::Error;

use crate::config::IpFamily;

/// Failure of one resolution attempt
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The lookup returned addresses, but none of the requested family
    #[error("no {family} address found for '{host}'")]
    NoFamilyAddress { host: String, family: IpFamily },

    /// The lookup returned an empty candidate set
    #[error("no addresses found for '{host}'")]
    NoAddresses { host: String },

    /// The underlying lookup failed or timed out
    #[error("hostname lookup for '{host}' failed")]
    Lookup {
        host: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Fatal outcome of a probe run
#[derive(Debug, Error)]
pub enum RunError {
    /// The overall run bound elapsed before a single probe succeeded
    #[error("no successful probe within {0:?}")]
    Timeout(Duration),
}

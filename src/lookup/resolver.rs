//! Hostname resolution with address-family filtering
//!
//! Resolution happens once at startup and, when enabled, again after a run
//! of consecutive probe failures. Literal IP addresses short-circuit the
//! lookup entirely.

use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use rand::seq::SliceRandom;
use std::net::IpAddr;
use std::time::Duration;

use crate::config::IpFamily;
use crate::error::ResolveError;

/// Resolve a hostname or literal address to a single usable IP.
///
/// The lookup is bounded by `timeout`; literal addresses are returned
/// immediately without a lookup and without the timeout applying. When the
/// lookup yields several usable candidates one is picked uniformly at
/// random, so repeated runs exercise DNS-based load distribution instead of
/// pinning the first record.
pub async fn resolve(
    host: &str,
    family: IpFamily,
    timeout: Duration,
) -> Result<IpAddr, ResolveError> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(ip);
    }

    let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());

    let lookup = match tokio::time::timeout(timeout, resolver.lookup_ip(host)).await {
        Ok(Ok(lookup)) => lookup,
        Ok(Err(e)) => {
            return Err(ResolveError::Lookup {
                host: host.to_string(),
                source: Box::new(e),
            })
        }
        Err(elapsed) => {
            return Err(ResolveError::Lookup {
                host: host.to_string(),
                source: Box::new(elapsed),
            })
        }
    };

    let all: Vec<IpAddr> = lookup.iter().collect();
    if all.is_empty() {
        return Err(ResolveError::NoAddresses {
            host: host.to_string(),
        });
    }

    let candidates = filter_candidates(all, family);

    candidates
        .choose(&mut rand::thread_rng())
        .copied()
        .ok_or_else(|| ResolveError::NoFamilyAddress {
            host: host.to_string(),
            family,
        })
}

/// Apply the address-family constraint to a candidate set.
///
/// Statically-linked builds may only see IPv4 addresses in their
/// IPv4-mapped-IPv6 form (`::ffff:a.b.c.d`), so the IPv4 filter accepts
/// those and unmaps them. The IPv6 filter rejects them for the same reason:
/// a mapped address is not a native IPv6 destination. Unconstrained lookups
/// keep everything, unmapped for display consistency.
pub fn filter_candidates(addrs: Vec<IpAddr>, family: IpFamily) -> Vec<IpAddr> {
    let mut out = Vec::with_capacity(addrs.len());
    for addr in addrs {
        match family {
            IpFamily::V4 => match addr {
                IpAddr::V4(_) => out.push(addr),
                IpAddr::V6(v6) => {
                    if let Some(v4) = v6.to_ipv4_mapped() {
                        out.push(IpAddr::V4(v4));
                    }
                }
            },
            IpFamily::V6 => {
                if let IpAddr::V6(v6) = addr {
                    if v6.to_ipv4_mapped().is_none() {
                        out.push(addr);
                    }
                }
            }
            IpFamily::Any => out.push(unmap(addr)),
        }
    }
    out
}

/// Unmap an IPv4-mapped-IPv6 address to its plain IPv4 form
fn unmap(addr: IpAddr) -> IpAddr {
    if let IpAddr::V6(v6) = addr {
        if let Some(v4) = v6.to_ipv4_mapped() {
            return IpAddr::V4(v4);
        }
    }
    addr
}

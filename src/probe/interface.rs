//! Source-interface discovery for probe binding
//!
//! A `--interface` name is turned into a concrete source address: the first
//! IP assigned to that interface matching the target's family, excluding
//! link-local IPv6 addresses (they require scope IDs and cannot reach
//! Internet targets). Binding itself happens by address in the probe.

use anyhow::{anyhow, Result};
use pnet::datalink;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Check if an IPv6 address is link-local (fe80::/10)
pub fn is_link_local_ipv6(addr: &Ipv6Addr) -> bool {
    let first_seg = addr.segments()[0];
    (0xfe80..=0xfebf).contains(&first_seg)
}

/// Validated interface information
#[derive(Debug, Clone)]
pub struct InterfaceInfo {
    /// Interface name (e.g., "eth0", "wlan0")
    pub name: String,
    /// First usable IPv4 address on the interface (if any)
    pub ipv4: Option<Ipv4Addr>,
    /// First usable IPv6 address on the interface (if any)
    pub ipv6: Option<Ipv6Addr>,
}

/// Validate that an interface exists and collect its usable addresses
///
/// Returns an error if the interface does not exist; unknown names get the
/// list of available interfaces appended for a usable error message.
pub fn validate_interface(name: &str) -> Result<InterfaceInfo> {
    for iface in datalink::interfaces() {
        if iface.name != name {
            continue;
        }

        let mut ipv4 = None;
        let mut ipv6 = None;
        let is_loopback = iface.is_loopback();

        for addr in &iface.ips {
            match addr.ip() {
                IpAddr::V4(v4) if ipv4.is_none() && !v4.is_loopback() => {
                    ipv4 = Some(v4);
                }
                IpAddr::V6(v6) if ipv6.is_none() && !v6.is_loopback() => {
                    if !is_link_local_ipv6(&v6) {
                        ipv6 = Some(v6);
                    }
                }
                _ => {}
            }
        }

        // The loopback interface only carries loopback addresses; accept them
        if is_loopback && ipv4.is_none() && ipv6.is_none() {
            for addr in &iface.ips {
                match addr.ip() {
                    IpAddr::V4(v4) if ipv4.is_none() => ipv4 = Some(v4),
                    IpAddr::V6(v6) if ipv6.is_none() => ipv6 = Some(v6),
                    _ => {}
                }
            }
        }

        return Ok(InterfaceInfo {
            name: name.to_string(),
            ipv4,
            ipv6,
        });
    }

    let available: Vec<_> = datalink::interfaces()
        .iter()
        .filter(|i| !i.ips.is_empty())
        .map(|i| i.name.clone())
        .collect();

    Err(anyhow!(
        "Interface '{}' not found. Available interfaces: {}",
        name,
        if available.is_empty() {
            "(none with IP addresses)".to_string()
        } else {
            available.join(", ")
        }
    ))
}

/// Get the source IP address from an interface for a given IP family
///
/// Returns the first address of the requested family, or an error if none exists.
pub fn interface_source_ip(info: &InterfaceInfo, ipv6: bool) -> Result<IpAddr> {
    if ipv6 {
        info.ipv6.map(IpAddr::V6).ok_or_else(|| {
            anyhow!(
                "Interface '{}' has no usable IPv6 address. Use -4 to force IPv4.",
                info.name
            )
        })
    } else {
        info.ipv4.map(IpAddr::V4).ok_or_else(|| {
            anyhow!(
                "Interface '{}' has no usable IPv4 address. Use -6 to force IPv6.",
                info.name
            )
        })
    }
}

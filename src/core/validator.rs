//! Destination gate: only private or reserved addresses are eligible targets.
//!
//! Hostnames are never eligible because they cannot be verified without a
//! resolution step. The caller can bypass the gate explicitly; the decision is
//! taken once, before any job is scheduled.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use tracing::warn;

use crate::core::error::LoadError;

/// IPv4 ranges considered private or reserved, as `(network, prefix length)`.
const PRIVATE_V4: &[([u8; 4], u32)] = &[
    ([0, 0, 0, 0], 8),
    ([10, 0, 0, 0], 8),
    ([127, 0, 0, 0], 8),
    ([169, 254, 0, 0], 16),
    ([172, 16, 0, 0], 12),
    ([192, 0, 0, 0], 24),
    ([192, 0, 0, 170], 31),
    ([192, 0, 2, 0], 24),
    ([192, 168, 0, 0], 16),
    ([198, 18, 0, 0], 15),
    ([198, 51, 100, 0], 24),
    ([203, 0, 113, 0], 24),
    ([240, 0, 0, 0], 4),
    ([255, 255, 255, 255], 32),
];

/// Globally reachable carve-outs inside [`PRIVATE_V4`].
const PUBLIC_V4_EXCEPTIONS: &[([u8; 4], u32)] = &[([192, 0, 0, 9], 32), ([192, 0, 0, 10], 32)];

/// IPv6 ranges considered private or reserved, as `(network, prefix length)`.
/// IPv4-mapped addresses are handled separately.
const PRIVATE_V6: &[([u16; 8], u32)] = &[
    ([0, 0, 0, 0, 0, 0, 0, 1], 128),
    ([0, 0, 0, 0, 0, 0, 0, 0], 128),
    ([0x0064, 0xff9b, 0x0001, 0, 0, 0, 0, 0], 48),
    ([0x0100, 0, 0, 0, 0, 0, 0, 0], 64),
    ([0x2001, 0, 0, 0, 0, 0, 0, 0], 23),
    ([0x2001, 0x0db8, 0, 0, 0, 0, 0, 0], 32),
    ([0x2002, 0, 0, 0, 0, 0, 0, 0], 16),
    ([0x3fff, 0, 0, 0, 0, 0, 0, 0], 20),
    ([0xfc00, 0, 0, 0, 0, 0, 0, 0], 7),
    ([0xfe80, 0, 0, 0, 0, 0, 0, 0], 10),
];

/// Globally reachable carve-outs inside [`PRIVATE_V6`].
const PUBLIC_V6_EXCEPTIONS: &[([u16; 8], u32)] = &[
    ([0x2001, 0x0001, 0, 0, 0, 0, 0, 1], 128),
    ([0x2001, 0x0001, 0, 0, 0, 0, 0, 2], 128),
    ([0x2001, 0x0003, 0, 0, 0, 0, 0, 0], 32),
    ([0x2001, 0x0004, 0x0112, 0, 0, 0, 0, 0], 48),
    ([0x2001, 0x0020, 0, 0, 0, 0, 0, 0], 28),
    ([0x2001, 0x0030, 0, 0, 0, 0, 0, 0], 28),
];

/// Returns true iff `destination` is a literal IP address in a private or
/// reserved range. Hostnames and anything unparsable are rejected.
#[must_use]
pub fn is_eligible(destination: &str) -> bool {
    let literal = destination
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']');
    match literal.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => is_private_v4(v4),
        Ok(IpAddr::V6(v6)) => is_private_v6(v6),
        Err(_) => parse_scoped_v6(literal).is_some_and(is_private_v6),
    }
}

/// `fe80::1%eth0` style literal; the zone does not affect the address class.
fn parse_scoped_v6(literal: &str) -> Option<Ipv6Addr> {
    let (addr, zone) = literal.split_once('%')?;
    if zone.is_empty() {
        return None;
    }
    addr.parse().ok()
}

/// Apply the destination gate once for a run.
///
/// # Errors
///
/// Returns `LoadError::Validation` when `host` is not eligible and
/// `allow_non_private` is not set.
pub fn check_target(host: &str, allow_non_private: bool) -> Result<(), LoadError> {
    if is_eligible(host) {
        return Ok(());
    }
    if allow_non_private {
        warn!(host = host, "Sending to a non-private target (override enabled)");
        return Ok(());
    }
    Err(LoadError::Validation(host.to_string()))
}

fn is_private_v4(addr: Ipv4Addr) -> bool {
    let bits = u32::from(addr);
    let within = |&(net, prefix): &([u8; 4], u32)| {
        let mask = u32::MAX.checked_shl(32 - prefix).unwrap_or(0);
        bits & mask == u32::from_be_bytes(net) & mask
    };
    PRIVATE_V4.iter().any(within) && !PUBLIC_V4_EXCEPTIONS.iter().any(within)
}

fn is_private_v6(addr: Ipv6Addr) -> bool {
    if let Some(mapped) = addr.to_ipv4_mapped() {
        return is_private_v4(mapped);
    }
    let bits = u128::from(addr);
    let within = |&(net, prefix): &([u16; 8], u32)| {
        let mask = u128::MAX.checked_shl(128 - prefix).unwrap_or(0);
        bits & mask == u128::from(Ipv6Addr::from(net)) & mask
    };
    PRIVATE_V6.iter().any(within) && !PUBLIC_V6_EXCEPTIONS.iter().any(within)
}

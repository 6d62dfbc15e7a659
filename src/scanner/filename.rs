//! Filename token parsing.
//!
//! Measurement files carry their metadata positionally:
//!
//! ```text
//! <namespace>_<ip-tokens...>_<ipvX>_<duration>.txt         ping
//! <namespace>_<ip-tokens...>[_<tcp|udp>]_<duration>.json   iperf3
//! ```
//!
//! IPv6 addresses are written with `:` replaced by `_`, so `::` becomes
//! `__` and survives the split as an empty token.

use crate::error::SkipReason;
use crate::models::{IpVersion, MeasurementName};
use std::collections::HashMap;

/// Protocol tokens recognized in iperf3 filenames.
const PROTOCOLS: [&str; 2] = ["tcp", "udp"];

/// Parse a ping log stem: `namespace_ip..._ipvX_duration`.
pub fn parse_ping_name(
    stem: &str,
    overrides: &HashMap<String, String>,
) -> Result<MeasurementName, SkipReason> {
    let parts: Vec<&str> = stem.split('_').collect();
    if parts.len() < 4 {
        return Err(SkipReason::TooFewParts(parts.len(), 4));
    }

    let n = parts.len();
    let version_token = parts[n - 2];
    let ip_version = IpVersion::from_token(version_token)
        .ok_or_else(|| SkipReason::UnknownIpVersion(version_token.to_string()))?;

    let raw_address = parts[1..n - 2].join("_");

    Ok(MeasurementName {
        namespace: parts[0].to_string(),
        address: address_label(&raw_address, ip_version, overrides),
        ip_version,
        duration: parts[n - 1].to_string(),
        protocol: None,
    })
}

/// Parse an iperf3 log stem: `namespace_ip..._[proto_]duration`.
pub fn parse_iperf_name(
    stem: &str,
    overrides: &HashMap<String, String>,
) -> Result<MeasurementName, SkipReason> {
    let parts: Vec<&str> = stem.split('_').collect();
    if parts.len() < 3 {
        return Err(SkipReason::TooFewParts(parts.len(), 3));
    }

    let n = parts.len();
    let candidate = parts[n - 2].to_lowercase();
    let (protocol, address_end) = if n >= 4 && PROTOCOLS.contains(&candidate.as_str()) {
        (Some(candidate), n - 2)
    } else {
        (None, n - 1)
    };

    let raw_address = parts[1..address_end].join("_");
    let ip_version = IpVersion::from_address(&raw_address)
        .ok_or_else(|| SkipReason::UnknownIpVersion(raw_address.clone()))?;

    Ok(MeasurementName {
        namespace: parts[0].to_string(),
        address: address_label(&raw_address, ip_version, overrides),
        ip_version,
        duration: parts[n - 1].to_string(),
        protocol,
    })
}

/// Reject names whose protocol token is not `expected`.
pub fn require_protocol(name: &MeasurementName, expected: &str) -> Result<(), SkipReason> {
    match name.protocol.as_deref() {
        Some(p) if p == expected => Ok(()),
        other => Err(SkipReason::ProtocolMismatch {
            found: other.unwrap_or("none").to_string(),
            expected: expected.to_string(),
        }),
    }
}

/// Pretty address for a filename's address tokens.
///
/// IPv4 tokens are used verbatim; IPv6 tokens go through the override
/// table first and are reconstructed otherwise.
pub fn address_label(
    raw: &str,
    ip_version: IpVersion,
    overrides: &HashMap<String, String>,
) -> String {
    match ip_version {
        IpVersion::V4 => raw.to_string(),
        IpVersion::V6 => overrides
            .get(raw)
            .cloned()
            .unwrap_or_else(|| reconstruct_ipv6(raw)),
    }
}

/// Undo the filename encoding of an IPv6 address (`__` -> `::`, `_` -> `:`).
pub fn reconstruct_ipv6(raw: &str) -> String {
    raw.split("__")
        .map(|chunk| chunk.replace('_', ":"))
        .collect::<Vec<_>>()
        .join("::")
}

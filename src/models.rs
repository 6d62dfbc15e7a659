//! Data models for the measurement analysis.
//!
//! This module contains the core data structures used throughout
//! the application for representing parsed filenames, sample series
//! and per-file summaries.

use serde::{Deserialize, Serialize};
use std::fmt;

/// IP version of a measurement.
///
/// IPv4 runs go through the translator under test; IPv6 runs are the
/// native baseline through the same namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IpVersion {
    #[serde(rename = "IPv4")]
    V4,
    #[serde(rename = "IPv6")]
    V6,
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpVersion::V4 => write!(f, "IPv4"),
            IpVersion::V6 => write!(f, "IPv6"),
        }
    }
}

impl IpVersion {
    /// Both versions in plotting order.
    pub const ALL: [IpVersion; 2] = [IpVersion::V4, IpVersion::V6];

    /// Normalize an explicit version token such as `ipv4`, `v6` or `4`.
    pub fn from_token(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "ipv4" | "v4" | "4" => Some(IpVersion::V4),
            "ipv6" | "v6" | "6" => Some(IpVersion::V6),
            _ => None,
        }
    }

    /// Infer the version from the address tokens of a filename.
    ///
    /// `tokens` is the `_`-joined address part, e.g. `192.0.0.171` or
    /// `fd00_64_64_5f00_20d2__400`.
    pub fn from_address(tokens: &str) -> Option<Self> {
        if tokens.contains('.') {
            Some(IpVersion::V4)
        } else if tokens.contains(':') || tokens.contains('_') {
            Some(IpVersion::V6)
        } else {
            None
        }
    }

    /// Role of the version in the comparison ("IPv4 Transition").
    pub fn role(&self) -> &'static str {
        match self {
            IpVersion::V4 => "IPv4 Transition",
            IpVersion::V6 => "IPv6 Baseline",
        }
    }

    /// Panel title used by the same-scale throughput layout.
    pub fn panel_title(&self) -> &'static str {
        match self {
            IpVersion::V4 => "IPv4 Translation",
            IpVersion::V6 => "IPv6 Baseline",
        }
    }
}

/// Translator implementation recognized from a namespace name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Tundra,
    Jool,
    Tayga,
    Other,
}

impl Tool {
    /// Classify a namespace by substring (`jool-app-ns` is Jool).
    pub fn from_namespace(namespace: &str) -> Self {
        if namespace.contains("tundra") {
            Tool::Tundra
        } else if namespace.contains("jool") {
            Tool::Jool
        } else if namespace.contains("tayga") {
            Tool::Tayga
        } else {
            Tool::Other
        }
    }

    /// Label of the tool when it carries the IPv6 baseline.
    pub fn hop_label(&self) -> Option<&'static str> {
        match self {
            Tool::Tundra | Tool::Tayga => Some("1 Hop"),
            Tool::Jool => Some("2 Hops"),
            Tool::Other => None,
        }
    }
}

/// Strip namespace decorations for display (`jool-app-ns` -> `jool`).
pub fn display_namespace(namespace: &str) -> String {
    namespace.replace("-ns", "").replace("-app", "")
}

/// Metadata recovered from a measurement filename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementName {
    /// Network namespace the measurement ran in (e.g. `tundra-ns`).
    pub namespace: String,
    /// Human readable target address.
    pub address: String,
    /// IP version of the target.
    pub ip_version: IpVersion,
    /// Duration label, the last filename token (`30s`, `2min`).
    pub duration: String,
    /// Protocol token when present (`tcp`, `udp`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
}

impl MeasurementName {
    /// Translator implementation behind the namespace.
    pub fn tool(&self) -> Tool {
        Tool::from_namespace(&self.namespace)
    }

    /// Series label used by the RTT plots: `namespace (address)`.
    pub fn series_label(&self) -> String {
        format!("{} ({})", self.namespace, self.address)
    }
}

/// Bucket key for grouping measurements.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CaseKey {
    pub ip_version: IpVersion,
    pub duration: String,
}

impl CaseKey {
    pub fn new(ip_version: IpVersion, duration: impl Into<String>) -> Self {
        Self {
            ip_version,
            duration: duration.into(),
        }
    }
}

/// An ordered sequence of `(x, y)` samples from one file.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    /// Legend label.
    pub label: String,
    /// Namespace the samples came from (drives colour selection).
    pub namespace: String,
    /// Samples in x order.
    pub points: Vec<(f64, f64)>,
}

impl Series {
    /// Samples with NaN coordinates removed; with `positive_only` also
    /// drops non-positive values so the series can go on a log axis.
    pub fn finite_points(&self, positive_only: bool) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .copied()
            .filter(|(x, y)| !x.is_nan() && !y.is_nan())
            .filter(|(_, y)| !positive_only || *y > 0.0)
            .collect()
    }

    /// The y values alone.
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|(_, y)| *y).collect()
    }
}

/// RTT statistics for one ping log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PingSummary {
    /// Values reported on the `rtt min/avg/max/mdev` line.
    pub min: f64,
    pub avg: f64,
    pub max: f64,
    pub mdev: f64,
    /// Computed over the per-packet RTTs.
    pub std_dev: f64,
    pub median: f64,
    pub p95: f64,
    /// Number of per-packet RTTs found.
    pub packet_count: usize,
    /// Per-packet RTTs in file order.
    pub raw_rtts: Vec<f64>,
}

/// Throughput statistics for one iperf3 TCP run, in Gbit/s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThroughputSummary {
    pub min: f64,
    pub avg: f64,
    pub max: f64,
    /// End-to-end throughput from the iperf3 summary block.
    pub overall: f64,
    pub std_dev: f64,
    pub p95: f64,
    pub p5: f64,
    pub duration_seconds: f64,
    pub total_gb: f64,
    pub retransmits: u64,
    pub sample_count: usize,
    /// Interval throughputs in file order.
    pub raw_throughputs: Vec<f64>,
}

/// A parsed iperf3 UDP run.
#[derive(Debug, Clone, PartialEq)]
pub struct UdpRun {
    /// Throughput over time.
    pub series: Series,
    /// Overall loss percentage, when iperf3 reported it.
    pub lost_percent: Option<f64>,
    /// Overall jitter in milliseconds, when iperf3 reported it.
    pub jitter_ms: Option<f64>,
}

/// A ping summary attributed to a scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RttRecord {
    pub scenario: String,
    pub file: String,
    #[serde(flatten)]
    pub name: MeasurementName,
    #[serde(flatten)]
    pub stats: PingSummary,
}

/// A throughput summary attributed to a scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThroughputRecord {
    pub scenario: String,
    pub file: String,
    #[serde(flatten)]
    pub name: MeasurementName,
    #[serde(flatten)]
    pub stats: ThroughputSummary,
}

/// Common view of summary records for comparison charts and insights.
pub trait SummaryRecord {
    fn scenario(&self) -> &str;
    fn name(&self) -> &MeasurementName;
    fn min(&self) -> f64;
    fn avg(&self) -> f64;
    fn max(&self) -> f64;
}

impl SummaryRecord for RttRecord {
    fn scenario(&self) -> &str {
        &self.scenario
    }
    fn name(&self) -> &MeasurementName {
        &self.name
    }
    fn min(&self) -> f64 {
        self.stats.min
    }
    fn avg(&self) -> f64 {
        self.stats.avg
    }
    fn max(&self) -> f64 {
        self.stats.max
    }
}

impl SummaryRecord for ThroughputRecord {
    fn scenario(&self) -> &str {
        &self.scenario
    }
    fn name(&self) -> &MeasurementName {
        &self.name
    }
    fn min(&self) -> f64 {
        self.stats.min
    }
    fn avg(&self) -> f64 {
        self.stats.avg
    }
    fn max(&self) -> f64 {
        self.stats.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ip_version_from_token() {
        assert_eq!(IpVersion::from_token("IPv4"), Some(IpVersion::V4));
        assert_eq!(IpVersion::from_token(" v6 "), Some(IpVersion::V6));
        assert_eq!(IpVersion::from_token("4"), Some(IpVersion::V4));
        assert_eq!(IpVersion::from_token("tcp"), None);
    }

    #[test]
    fn test_ip_version_from_address() {
        assert_eq!(IpVersion::from_address("192.0.0.171"), Some(IpVersion::V4));
        assert_eq!(
            IpVersion::from_address("fd00_64_64_5f00_20d2__400"),
            Some(IpVersion::V6)
        );
        assert_eq!(IpVersion::from_address("localhost"), None);
    }

    #[test]
    fn test_ip_version_serializes_as_label() {
        let json = serde_json::to_string(&IpVersion::V6).unwrap();
        assert_eq!(json, "\"IPv6\"");
    }

    #[test]
    fn test_tool_from_namespace() {
        assert_eq!(Tool::from_namespace("tundra-ns"), Tool::Tundra);
        assert_eq!(Tool::from_namespace("jool-app-ns"), Tool::Jool);
        assert_eq!(Tool::from_namespace("tayga-ns"), Tool::Tayga);
        assert_eq!(Tool::from_namespace("clat-ns"), Tool::Other);
        assert_eq!(Tool::Jool.hop_label(), Some("2 Hops"));
    }

    #[test]
    fn test_display_namespace() {
        assert_eq!(display_namespace("jool-app-ns"), "jool");
        assert_eq!(display_namespace("tundra-ns"), "tundra");
    }

    #[test]
    fn test_finite_points() {
        let series = Series {
            label: "x".to_string(),
            namespace: "tundra-ns".to_string(),
            points: vec![(0.0, 1.0), (1.0, f64::NAN), (f64::NAN, 2.0), (3.0, 0.0)],
        };

        assert_eq!(series.finite_points(false), vec![(0.0, 1.0), (3.0, 0.0)]);
        assert_eq!(series.finite_points(true), vec![(0.0, 1.0)]);
    }
}

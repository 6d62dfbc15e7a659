//! iperf3 JSON log extraction.
//!
//! Only the handful of fields the charts need are modelled; everything
//! else in the iperf3 document is ignored. Missing fields fall back to
//! the same defaults iperf3 consumers usually assume (start = NaN,
//! rates and counters = 0).

use crate::analysis::stats;
use crate::error::SkipReason;
use crate::models::{Series, ThroughputSummary};
use serde::Deserialize;
use std::path::Path;

/// Bits per second in one Gbit/s.
pub const BITS_PER_GBIT: f64 = 1e9;

/// Top-level iperf3 `--json` document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IperfReport {
    #[serde(default)]
    pub intervals: Vec<Interval>,
    #[serde(default)]
    pub end: End,
}

/// One reporting interval.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Interval {
    pub sum: Option<IntervalSum>,
}

/// Aggregate over all streams for one interval.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IntervalSum {
    pub start: Option<f64>,
    pub bits_per_second: Option<f64>,
}

impl IntervalSum {
    fn point(&self) -> (f64, f64) {
        (
            self.start.unwrap_or(f64::NAN),
            self.bits_per_second.unwrap_or(0.0) / BITS_PER_GBIT,
        )
    }
}

/// The `end` block.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct End {
    /// TCP sender totals.
    pub sum_sent: Option<StreamTotals>,
    /// TCP receiver totals.
    pub sum_received: Option<StreamTotals>,
    /// UDP totals.
    pub sum: Option<UdpTotals>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamTotals {
    pub seconds: Option<f64>,
    pub bytes: Option<f64>,
    pub bits_per_second: Option<f64>,
    pub retransmits: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UdpTotals {
    pub lost_percent: Option<f64>,
    pub jitter_ms: Option<f64>,
}

impl IperfReport {
    /// Parse a report from a JSON string.
    pub fn from_json(content: &str) -> Result<Self, SkipReason> {
        Ok(serde_json::from_str(content)?)
    }

    /// Read and parse a report file.
    pub fn load(path: &Path) -> Result<Self, SkipReason> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// `(interval start seconds, Gbit/s)` pairs in file order. Intervals
    /// without a `sum` block are left out.
    pub fn throughput_points(&self) -> Vec<(f64, f64)> {
        self.intervals
            .iter()
            .filter_map(|i| i.sum.as_ref())
            .map(IntervalSum::point)
            .collect()
    }

    /// One point per interval; a missing `sum` block counts as a 0 Gbit/s
    /// sample with no start time.
    pub fn interval_points(&self) -> Vec<(f64, f64)> {
        self.intervals
            .iter()
            .map(|i| i.sum.as_ref().map_or((f64::NAN, 0.0), IntervalSum::point))
            .collect()
    }

    /// Throughput series labelled after the namespace.
    pub fn throughput_series(&self, label: &str, namespace: &str) -> Series {
        Series {
            label: label.to_string(),
            namespace: namespace.to_string(),
            points: self.throughput_points(),
        }
    }

    /// Series over every interval, as used by the UDP charts.
    pub fn interval_series(&self, label: &str, namespace: &str) -> Series {
        Series {
            label: label.to_string(),
            namespace: namespace.to_string(),
            points: self.interval_points(),
        }
    }

    /// Overall UDP loss percentage.
    pub fn lost_percent(&self) -> Option<f64> {
        self.end.sum.as_ref().and_then(|s| s.lost_percent)
    }

    /// Overall UDP jitter in milliseconds.
    pub fn jitter_ms(&self) -> Option<f64> {
        self.end.sum.as_ref().and_then(|s| s.jitter_ms)
    }

    /// End-to-end throughput in Gbit/s, receiver side preferred.
    pub fn overall_gbps(&self) -> f64 {
        let received = self
            .end
            .sum_received
            .as_ref()
            .and_then(|s| s.bits_per_second);
        let sent = self.end.sum_sent.as_ref().and_then(|s| s.bits_per_second);

        received.or(sent).unwrap_or(0.0) / BITS_PER_GBIT
    }

    /// Summarize a TCP run. Fails when the run has no intervals.
    pub fn tcp_summary(&self) -> Result<ThroughputSummary, SkipReason> {
        let values: Vec<f64> = self.interval_points().into_iter().map(|(_, y)| y).collect();
        let summary = stats::Summary::from_values(&values).ok_or(SkipReason::NoSamples)?;

        let sent = self.end.sum_sent.clone().unwrap_or_default();

        Ok(ThroughputSummary {
            min: summary.min,
            avg: summary.mean,
            max: summary.max,
            overall: self.overall_gbps(),
            std_dev: summary.std_dev,
            p95: stats::percentile(&values, 95.0).unwrap_or(0.0),
            p5: stats::percentile(&values, 5.0).unwrap_or(0.0),
            duration_seconds: sent.seconds.unwrap_or(0.0),
            total_gb: sent.bytes.unwrap_or(0.0) / 1e9,
            retransmits: sent.retransmits.unwrap_or(0),
            sample_count: values.len(),
            raw_throughputs: values,
        })
    }
}

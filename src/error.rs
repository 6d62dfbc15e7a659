//! Reasons a measurement file is skipped.
//!
//! Per-file problems never abort a run: they are logged and the file is
//! left out of the aggregation.

use thiserror::Error;

/// Why a measurement file was left out.
#[derive(Error, Debug)]
pub enum SkipReason {
    #[error("not enough parts in filename (got {0}, need {1})")]
    TooFewParts(usize, usize),

    #[error("cannot determine IP type from '{0}'")]
    UnknownIpVersion(String),

    #[error("protocol '{found}' does not match '{expected}'")]
    ProtocolMismatch { found: String, expected: String },

    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid iperf3 JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no datapoints found")]
    NoSamples,

    #[error("no 'rtt min/avg/max/mdev' summary line")]
    MissingSummary,
}

impl SkipReason {
    /// Whether the file simply does not belong to the current selection
    /// (wrong protocol) rather than being broken.
    pub fn is_filtered(&self) -> bool {
        matches!(self, SkipReason::ProtocolMismatch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            SkipReason::TooFewParts(2, 4).to_string(),
            "not enough parts in filename (got 2, need 4)"
        );
        assert_eq!(
            SkipReason::UnknownIpVersion("tcp".to_string()).to_string(),
            "cannot determine IP type from 'tcp'"
        );
    }

    #[test]
    fn test_is_filtered() {
        let mismatch = SkipReason::ProtocolMismatch {
            found: "udp".to_string(),
            expected: "tcp".to_string(),
        };
        assert!(mismatch.is_filtered());
        assert!(!SkipReason::NoSamples.is_filtered());
    }
}

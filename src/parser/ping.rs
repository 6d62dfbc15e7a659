//! Ping text log extraction.
//!
//! Only reply lines are considered, i.e. lines mentioning `icmp`:
//!
//! ```text
//! 64 bytes from 192.0.0.171: icmp_seq=1 ttl=63 time=0.412 ms
//! rtt min/avg/max/mdev = 0.301/0.412/0.655/0.051 ms
//! ```

use crate::analysis::stats;
use crate::error::SkipReason;
use crate::models::PingSummary;
use regex::Regex;
use std::sync::OnceLock;

fn seq_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)icmp[_-]seq=(\d+)").expect("valid sequence regex"))
}

fn time_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)time[=<]?([\d.]+)\s*ms").expect("valid time regex"))
}

fn summary_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"rtt min/avg/max/mdev = ([\d.]+)/([\d.]+)/([\d.]+)/([\d.]+) ms")
            .expect("valid summary regex")
    })
}

/// One echo reply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PingSample {
    pub seq: u32,
    pub rtt_ms: f64,
}

fn is_reply_line(line: &str) -> bool {
    line.to_lowercase().contains("icmp")
}

fn rtt_of(line: &str) -> Option<f64> {
    time_regex()
        .captures(line)
        .and_then(|c| c[1].parse::<f64>().ok())
}

/// Extract `(icmp_seq, rtt)` samples, sorted by sequence number.
///
/// Lines lacking either the sequence or the time are ignored.
pub fn parse_ping_samples(content: &str) -> Vec<PingSample> {
    let mut samples: Vec<PingSample> = content
        .lines()
        .filter(|line| is_reply_line(line))
        .filter_map(|line| {
            let seq = seq_regex()
                .captures(line)
                .and_then(|c| c[1].parse::<u32>().ok())?;
            let rtt_ms = rtt_of(line)?;
            Some(PingSample { seq, rtt_ms })
        })
        .collect();

    samples.sort_by_key(|s| s.seq);
    samples
}

/// Build the RTT summary of a ping log.
///
/// The min/avg/max/mdev figures come from ping's own summary line, which
/// must be present; median, std-dev and p95 are computed over every reply
/// line that carries a time.
pub fn parse_ping_summary(content: &str) -> Result<PingSummary, SkipReason> {
    let caps = summary_regex()
        .captures(content)
        .ok_or(SkipReason::MissingSummary)?;

    let field = |i: usize| caps[i].parse::<f64>().map_err(|_| SkipReason::MissingSummary);
    let (min, avg, max, mdev) = (field(1)?, field(2)?, field(3)?, field(4)?);

    let rtts: Vec<f64> = content
        .lines()
        .filter(|line| is_reply_line(line))
        .filter_map(rtt_of)
        .collect();

    Ok(PingSummary {
        min,
        avg,
        max,
        mdev,
        std_dev: stats::std_dev(&rtts).unwrap_or(0.0),
        median: stats::median(&rtts).unwrap_or(0.0),
        p95: stats::percentile(&rtts, 95.0).unwrap_or(0.0),
        packet_count: rtts.len(),
        raw_rtts: rtts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "\
PING 192.0.0.171 (192.0.0.171) 56(84) bytes of data.
64 bytes from 192.0.0.171: icmp_seq=2 ttl=63 time=0.500 ms
64 bytes from 192.0.0.171: icmp_seq=1 ttl=63 time=0.300 ms
64 bytes from 192.0.0.171: icmp_seq=3 ttl=63 time=0.400 ms
From 192.0.0.1 icmp_seq=4 Destination Host Unreachable

--- 192.0.0.171 ping statistics ---
4 packets transmitted, 3 received, 25% packet loss, time 3004ms
rtt min/avg/max/mdev = 0.300/0.400/0.500/0.082 ms
";

    #[test]
    fn test_parse_samples_sorted() {
        let samples = parse_ping_samples(LOG);

        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0], PingSample { seq: 1, rtt_ms: 0.3 });
        assert_eq!(samples[2], PingSample { seq: 3, rtt_ms: 0.4 });
    }

    #[test]
    fn test_parse_samples_case_and_separator() {
        let log = "64 bytes from x: ICMP-SEQ=7 ttl=1 TIME<1 ms\n";
        let samples = parse_ping_samples(log);

        assert_eq!(samples, vec![PingSample { seq: 7, rtt_ms: 1.0 }]);
    }

    #[test]
    fn test_parse_samples_ignores_non_icmp_lines() {
        let log = "time=5 ms without a sequence\nseq=1 time=2 ms\n";
        assert!(parse_ping_samples(log).is_empty());
    }

    #[test]
    fn test_parse_summary() {
        let summary = parse_ping_summary(LOG).unwrap();

        assert_eq!(summary.min, 0.3);
        assert_eq!(summary.avg, 0.4);
        assert_eq!(summary.max, 0.5);
        assert_eq!(summary.mdev, 0.082);
        assert_eq!(summary.packet_count, 3);
        assert!((summary.median - 0.4).abs() < 1e-12);
        assert!((summary.p95 - 0.49).abs() < 1e-9);
        assert!((summary.std_dev - 0.081_649_658).abs() < 1e-6);
    }

    #[test]
    fn test_parse_summary_requires_summary_line() {
        let log = "64 bytes from x: icmp_seq=1 ttl=63 time=0.3 ms\n";
        assert!(matches!(
            parse_ping_summary(log),
            Err(SkipReason::MissingSummary)
        ));
    }
}

//! Extraction of numeric samples from raw measurement logs.

pub mod iperf;
pub mod ping;

pub use iperf::IperfReport;
pub use ping::{parse_ping_samples, parse_ping_summary};

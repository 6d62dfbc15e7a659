//! Analysis modules.
//!
//! Statistics over sample slices plus the grouping and axis-limit logic
//! shared by every chart.

pub mod aggregator;
pub mod stats;

pub use aggregator::*;

//! Series aggregation, axis limits and summary insights.
//!
//! This module groups parsed series by `(IP version, duration)` and
//! derives the axis ranges and best/worst rankings the renderers need.

use crate::analysis::stats;
use crate::models::{CaseKey, IpVersion, Series, SummaryRecord, Tool};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Lower bound for log-scale axes.
pub const LOG_FLOOR: f64 = 1e-6;

/// Y axis scale of a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scale {
    Linear,
    Log,
}

impl Scale {
    /// Both scales, in rendering order.
    pub const ALL: [Scale; 2] = [Scale::Linear, Scale::Log];

    /// Lowercase name used in file names and RTT titles.
    pub fn name(&self) -> &'static str {
        match self {
            Scale::Linear => "linear",
            Scale::Log => "log",
        }
    }

    /// Capitalized name used in chart titles.
    pub fn title(&self) -> &'static str {
        match self {
            Scale::Linear => "Linear",
            Scale::Log => "Log",
        }
    }

    /// Log axes can only show strictly positive values.
    pub fn positive_only(&self) -> bool {
        matches!(self, Scale::Log)
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A closed axis interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Range used when a panel has nothing to show.
    pub fn fallback(scale: Scale) -> Self {
        match scale {
            Scale::Linear => Self::new(0.0, 1.0),
            Scale::Log => Self::new(1e-3, 1.0),
        }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

/// Series grouped per `(IP version, duration)`, each group in file order.
pub type Buckets = BTreeMap<CaseKey, Vec<Series>>;

/// Group items by their case key, keeping insertion order inside a group.
pub fn group_by_case<T>(items: impl IntoIterator<Item = (CaseKey, T)>) -> BTreeMap<CaseKey, Vec<T>> {
    let mut grouped: BTreeMap<CaseKey, Vec<T>> = BTreeMap::new();

    for (key, item) in items {
        grouped.entry(key).or_default().push(item);
    }

    grouped
}

/// X range pinned at zero with a relative margin on the right.
pub fn x_range<'a>(series: impl IntoIterator<Item = &'a Series>, margin: f64) -> AxisRange {
    let xmax = series
        .into_iter()
        .flat_map(|s| s.points.iter().map(|(x, _)| *x))
        .filter(|x| x.is_finite())
        .reduce(f64::max);

    match xmax {
        Some(x) if x > 0.0 => AxisRange::new(0.0, x * (1.0 + margin)),
        _ => AxisRange::new(0.0, 1.0),
    }
}

/// Y range for `values` on the given scale.
///
/// Linear ranges start at zero; log ranges pad multiplicatively around the
/// positive values. Returns `None` when there is nothing to plot.
pub fn y_range(values: &[f64], scale: Scale, margin: f64) -> Option<AxisRange> {
    let usable: Vec<f64> = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .filter(|v| !scale.positive_only() || *v > 0.0)
        .collect();

    let vmax = stats::max(&usable)?;

    match scale {
        Scale::Linear => {
            let ymax = vmax * (1.0 + margin);
            if !ymax.is_finite() || ymax <= 0.0 {
                Some(AxisRange::fallback(Scale::Linear))
            } else {
                Some(AxisRange::new(0.0, ymax))
            }
        }
        Scale::Log => {
            let vmin = stats::min(&usable)?;
            let mut ymin = vmin / (1.0 + margin);
            if ymin <= 0.0 {
                ymin = vmin.max(LOG_FLOOR);
            }
            Some(AxisRange::new(ymin.max(LOG_FLOOR), vmax * (1.0 + margin)))
        }
    }
}

/// Y range of one group of series.
pub fn series_y_range(series: &[Series], scale: Scale, margin: f64) -> Option<AxisRange> {
    let values: Vec<f64> = series.iter().flat_map(|s| s.values()).collect();
    y_range(&values, scale, margin)
}

/// One Y range per duration, shared by both IP versions.
pub fn shared_y_per_duration(
    buckets: &Buckets,
    durations: &[String],
    scale: Scale,
    margin: f64,
) -> HashMap<String, AxisRange> {
    durations
        .iter()
        .filter_map(|duration| {
            let values: Vec<f64> = IpVersion::ALL
                .iter()
                .filter_map(|ip| buckets.get(&CaseKey::new(*ip, duration.as_str())))
                .flatten()
                .flat_map(|s| s.values())
                .collect();
            y_range(&values, scale, margin).map(|r| (duration.clone(), r))
        })
        .collect()
}

/// One Y range per IP version for a single duration.
pub fn y_per_ip_version(
    buckets: &Buckets,
    duration: &str,
    scale: Scale,
    margin: f64,
) -> HashMap<IpVersion, AxisRange> {
    IpVersion::ALL
        .iter()
        .filter_map(|ip| {
            let series = buckets.get(&CaseKey::new(*ip, duration))?;
            series_y_range(series, scale, margin).map(|r| (*ip, r))
        })
        .collect()
}

/// Whether a record belongs in the comparison bar charts.
///
/// Tayga duplicates the single-hop baseline on IPv6 and was not deployed
/// in the AWS scenarios.
pub fn include_in_comparison(scenario: &str, ip_version: IpVersion, namespace: &str) -> bool {
    let tayga = Tool::from_namespace(namespace) == Tool::Tayga;
    match ip_version {
        IpVersion::V6 => !tayga,
        IpVersion::V4 => !(tayga && scenario.starts_with("AWS")),
    }
}

/// Which end of the average is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preference {
    /// Latency: lower is better.
    Lower,
    /// Throughput: higher is better.
    Higher,
}

/// Best and worst record of one IP version.
#[derive(Debug)]
pub struct Insight<'a, R> {
    pub ip_version: IpVersion,
    pub best: &'a R,
    pub worst: &'a R,
}

/// Best/worst records per IP version, IPv4 first.
///
/// Ties keep the first record in input order.
pub fn insights<R: SummaryRecord>(records: &[R], preference: Preference) -> Vec<Insight<'_, R>> {
    IpVersion::ALL
        .iter()
        .filter_map(|ip| {
            let subset: Vec<&R> = records
                .iter()
                .filter(|r| r.name().ip_version == *ip)
                .collect();
            let avgs: Vec<f64> = subset.iter().map(|r| r.avg()).collect();

            let (best, worst) = match preference {
                Preference::Lower => (stats::argmin(&avgs)?, stats::argmax(&avgs)?),
                Preference::Higher => (stats::argmax(&avgs)?, stats::argmin(&avgs)?),
            };

            Some(Insight {
                ip_version: *ip,
                best: subset[best],
                worst: subset[worst],
            })
        })
        .collect()
}

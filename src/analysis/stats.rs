//! Descriptive statistics over sample slices.
//!
//! Every function returns `None` for an empty slice. Standard deviation
//! is the population one (divisor n) and percentiles interpolate linearly
//! between the closest ranks.

use std::cmp::Ordering;

/// Smallest value.
pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

/// Largest value.
pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

/// Arithmetic mean.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let mean = mean(values)?;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// The 50th percentile.
pub fn median(values: &[f64]) -> Option<f64> {
    percentile(values, 50.0)
}

/// Percentile `p` (0-100) with linear interpolation, `rank = p/100 * (n-1)`.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Index of the first maximum.
pub fn argmax(values: &[f64]) -> Option<usize> {
    extremum_index(values, Ordering::Greater)
}

/// Index of the first minimum.
pub fn argmin(values: &[f64]) -> Option<usize> {
    extremum_index(values, Ordering::Less)
}

fn extremum_index(values: &[f64], wanted: Ordering) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some(b) if v.partial_cmp(&values[b]) != Some(wanted) => {}
            _ => best = Some(i),
        }
    }
    best
}

/// Min, max, mean and population std-dev computed in one go.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl Summary {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        Some(Self {
            min: min(values)?,
            max: max(values)?,
            mean: mean(values)?,
            std_dev: std_dev(values)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(min(&[]), None);
        assert_eq!(mean(&[]), None);
        assert_eq!(percentile(&[], 50.0), None);
        assert_eq!(argmax(&[]), None);
        assert!(Summary::from_values(&[]).is_none());
    }

    #[test]
    fn test_basic_stats() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];

        assert_eq!(min(&values), Some(2.0));
        assert_eq!(max(&values), Some(9.0));
        assert_eq!(mean(&values), Some(5.0));
        assert_eq!(std_dev(&values), Some(2.0));
        assert_eq!(median(&values), Some(4.5));
    }

    #[test]
    fn test_percentile_interpolates() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];

        assert_eq!(percentile(&values, 0.0), Some(1.0));
        assert_eq!(percentile(&values, 100.0), Some(5.0));
        assert!((percentile(&values, 95.0).unwrap() - 4.8).abs() < 1e-12);
        assert!((percentile(&values, 5.0).unwrap() - 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_single_value() {
        assert_eq!(percentile(&[3.5], 95.0), Some(3.5));
        assert_eq!(std_dev(&[3.5]), Some(0.0));
    }

    #[test]
    fn test_extrema_indices() {
        let values = [3.0, 9.0, 1.0, 9.0, 1.0];

        assert_eq!(argmax(&values), Some(1));
        assert_eq!(argmin(&values), Some(2));
        assert_eq!(argmax(&[f64::NAN, 2.0]), Some(1));
    }
}

//! Collapsing year series onto decision years.
//!
//! Every year-indexed parameter is resolved to one value per [`YearBucket`]
//! from the values at the bucket's sampled years. The configured
//! [`AggregationMethod`] picks the reduction; under
//! [`AggregationMethod::Combined`] the reduction depends on what the
//! parameter measures.

use crate::indices::YearBucket;
use mep_core::AggregationMethod;

/// What a year series measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Levels reached in a year: capacity and fraction bounds, utilization, emission limits
    Level,
    /// Changes within a year: capacity and fraction increase bounds
    Increment,
    /// Per-unit prices and other yearly intensities: capex, opex, fuel cost, usage
    Price,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reduction {
    Last,
    Mean,
    Sum,
}

fn reduction(method: AggregationMethod, kind: ParamKind) -> Reduction {
    match (method, kind) {
        (AggregationMethod::Last, _) => Reduction::Last,
        (AggregationMethod::Mean, _) => Reduction::Mean,
        (AggregationMethod::Combined, ParamKind::Level) => Reduction::Last,
        (AggregationMethod::Combined, ParamKind::Increment) => Reduction::Sum,
        (AggregationMethod::Combined, ParamKind::Price) => Reduction::Mean,
    }
}

/// Resolve a series with optional entries. Unset years are skipped; the
/// result is `None` when no sampled year of the bucket is set (for `Last`,
/// when the last sampled year is unset).
pub fn aggregate_optional(
    series: &[Option<f64>],
    bucket: &YearBucket,
    method: AggregationMethod,
    kind: ParamKind,
) -> Option<f64> {
    let value_at = |year: usize| series.get(year).copied().flatten();
    match reduction(method, kind) {
        Reduction::Last => value_at(bucket.last_sampled()),
        Reduction::Mean | Reduction::Sum => {
            let values: Vec<f64> = bucket
                .sampled_years
                .iter()
                .filter_map(|&year| value_at(year))
                .collect();
            if values.is_empty() {
                return None;
            }
            let total: f64 = values.iter().sum();
            if reduction(method, kind) == Reduction::Sum {
                Some(total)
            } else {
                Some(total / values.len() as f64)
            }
        }
    }
}

/// Resolve a fully specified series; years past its end count as zero.
pub fn aggregate(
    series: &[f64],
    bucket: &YearBucket,
    method: AggregationMethod,
    kind: ParamKind,
) -> f64 {
    let value_at = |year: usize| series.get(year).copied().unwrap_or(0.0);
    match reduction(method, kind) {
        Reduction::Last => value_at(bucket.last_sampled()),
        Reduction::Sum => bucket.sampled_years.iter().map(|&y| value_at(y)).sum(),
        Reduction::Mean => {
            let total: f64 = bucket.sampled_years.iter().map(|&y| value_at(y)).sum();
            total / bucket.sampled_years.len().max(1) as f64
        }
    }
}

/// Resolve a series for every bucket.
pub fn per_bucket(
    series: &[f64],
    buckets: &[YearBucket],
    method: AggregationMethod,
    kind: ParamKind,
) -> Vec<f64> {
    buckets
        .iter()
        .map(|bucket| aggregate(series, bucket, method, kind))
        .collect()
}

pub fn per_bucket_optional(
    series: &[Option<f64>],
    buckets: &[YearBucket],
    method: AggregationMethod,
    kind: ParamKind,
) -> Vec<Option<f64>> {
    buckets
        .iter()
        .map(|bucket| aggregate_optional(series, bucket, method, kind))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(years: &[usize]) -> YearBucket {
        YearBucket {
            sampled_years: years.to_vec(),
            start: years[0],
            end: *years.last().unwrap(),
            discount_weight: years.len() as f64,
        }
    }

    #[test]
    fn last_takes_final_sampled_year() {
        let series = [1.0, 2.0, 3.0, 4.0];
        let b = bucket(&[0, 1, 2]);
        assert_eq!(aggregate(&series, &b, AggregationMethod::Last, ParamKind::Price), 3.0);
        assert_eq!(aggregate(&series, &b, AggregationMethod::Mean, ParamKind::Level), 2.0);
    }

    #[test]
    fn combined_depends_on_parameter_kind() {
        let series = [Some(1.0), Some(2.0), Some(6.0)];
        let b = bucket(&[0, 1, 2]);
        let m = AggregationMethod::Combined;
        assert_eq!(aggregate_optional(&series, &b, m, ParamKind::Level), Some(6.0));
        assert_eq!(aggregate_optional(&series, &b, m, ParamKind::Increment), Some(9.0));
        assert_eq!(aggregate_optional(&series, &b, m, ParamKind::Price), Some(3.0));
    }

    #[test]
    fn unset_entries_are_skipped() {
        let series = [None, Some(4.0), None];
        let b = bucket(&[0, 1, 2]);
        assert_eq!(
            aggregate_optional(&series, &b, AggregationMethod::Last, ParamKind::Level),
            None
        );
        assert_eq!(
            aggregate_optional(&series, &b, AggregationMethod::Mean, ParamKind::Level),
            Some(4.0)
        );
        assert_eq!(
            aggregate_optional(&[], &b, AggregationMethod::Mean, ParamKind::Level),
            None
        );
    }
}

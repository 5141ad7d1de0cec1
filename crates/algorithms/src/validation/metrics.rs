//! Error metrics over validation records and paired estimates

use super::loocv::ValidationRecord;
use serde::Serialize;

/// Half-width multiplier of the 95% prediction interval
const Z_95: f64 = 1.96;

/// Point-level error summary for one indicator
///
/// Metrics use predicted records only; unlocated records are counted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ErrorSummary {
    pub total: usize,
    pub predicted: usize,
    pub unlocated: usize,
    /// mean(pred − obs)
    pub bias: f64,
    pub mae: f64,
    pub rmse: f64,
    /// Fraction of observations inside pred ± 1.96·std
    pub p95_coverage: f64,
    /// mean(pred) / mean(obs), NaN unless mean(obs) > 0
    pub ratio: f64,
}

impl ErrorSummary {
    /// Summary with every metric undefined, for indicators without a result
    pub fn empty() -> Self {
        Self {
            total: 0,
            predicted: 0,
            unlocated: 0,
            bias: f64::NAN,
            mae: f64::NAN,
            rmse: f64::NAN,
            p95_coverage: f64::NAN,
            ratio: f64::NAN,
        }
    }

    pub fn from_records(records: &[ValidationRecord]) -> Self {
        let predicted: Vec<&ValidationRecord> = records.iter().filter(|r| r.is_predicted()).collect();
        let mut summary = Self {
            total: records.len(),
            predicted: predicted.len(),
            unlocated: records.len() - predicted.len(),
            ..Self::empty()
        };
        if predicted.is_empty() {
            return summary;
        }

        let n = predicted.len() as f64;
        let mut err_sum = 0.0;
        let mut abs_sum = 0.0;
        let mut sq_sum = 0.0;
        let mut covered = 0usize;
        let mut pred_sum = 0.0;
        let mut obs_sum = 0.0;

        for r in &predicted {
            let err = r.predicted_mean - r.observed;
            err_sum += err;
            abs_sum += err.abs();
            sq_sum += err * err;
            let half = Z_95 * r.predicted_std;
            if r.predicted_mean - half <= r.observed && r.observed <= r.predicted_mean + half {
                covered += 1;
            }
            pred_sum += r.predicted_mean;
            obs_sum += r.observed;
        }

        summary.bias = err_sum / n;
        summary.mae = abs_sum / n;
        summary.rmse = (sq_sum / n).sqrt();
        summary.p95_coverage = covered as f64 / n;
        let mean_obs = obs_sum / n;
        if mean_obs > 0.0 {
            summary.ratio = (pred_sum / n) / mean_obs;
        }
        summary
    }
}

/// Differences between two estimates of the same zones (`a − b`)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DifferenceSummary {
    /// Pairs where both values are finite
    pub count: usize,
    pub mean: f64,
    /// Population standard deviation of the differences
    pub std: f64,
    pub mean_abs: f64,
}

impl DifferenceSummary {
    pub fn between(a: &[f64], b: &[f64]) -> Self {
        let diffs: Vec<f64> = finite_pairs(a, b).map(|(x, y)| x - y).collect();
        if diffs.is_empty() {
            return Self {
                count: 0,
                mean: f64::NAN,
                std: f64::NAN,
                mean_abs: f64::NAN,
            };
        }
        let n = diffs.len() as f64;
        let mean = diffs.iter().sum::<f64>() / n;
        let var = diffs.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n;
        Self {
            count: diffs.len(),
            mean,
            std: var.sqrt(),
            mean_abs: diffs.iter().map(|d| d.abs()).sum::<f64>() / n,
        }
    }
}

fn finite_pairs<'a>(a: &'a [f64], b: &'a [f64]) -> impl Iterator<Item = (f64, f64)> + 'a {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| (x, y))
        .filter(|(x, y)| x.is_finite() && y.is_finite())
}

/// Root-mean-square deviation over pairs where both values are finite.
///
/// NaN when there is no such pair.
pub fn rmsd(a: &[f64], b: &[f64]) -> f64 {
    let (n, sq) = finite_pairs(a, b).fold((0usize, 0.0), |(n, sq), (x, y)| (n + 1, sq + (x - y).powi(2)));
    if n == 0 {
        f64::NAN
    } else {
        (sq / n as f64).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::RecordStatus;
    use approx::assert_abs_diff_eq;

    fn record(observed: f64, mean: f64, std: f64) -> ValidationRecord {
        ValidationRecord {
            cluster: 0,
            observed,
            predicted_mean: mean,
            predicted_std: std,
            status: RecordStatus::Predicted,
        }
    }

    #[test]
    fn test_error_summary() {
        let records = vec![
            record(0.5, 0.6, 0.1),  // err 0.1, covered
            record(0.4, 0.2, 0.05), // err -0.2, not covered
            record(0.3, 0.3, 0.0),  // err 0, covered
        ];
        let s = ErrorSummary::from_records(&records);
        assert_eq!(s.total, 3);
        assert_eq!(s.predicted, 3);
        assert_abs_diff_eq!(s.bias, -0.1 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(s.mae, 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(s.rmse, (0.05f64 / 3.0).sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(s.p95_coverage, 2.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(s.ratio, 1.1 / 1.2, epsilon = 1e-12);
    }

    #[test]
    fn test_unlocated_counted_not_scored() {
        let mut lost = record(0.9, f64::NAN, f64::NAN);
        lost.status = RecordStatus::Unlocated;
        let records = vec![record(0.5, 0.5, 0.0), lost];
        let s = ErrorSummary::from_records(&records);
        assert_eq!(s.total, 2);
        assert_eq!(s.predicted, 1);
        assert_eq!(s.unlocated, 1);
        assert_eq!(s.rmse, 0.0);
    }

    #[test]
    fn test_ratio_undefined_for_zero_observations() {
        let s = ErrorSummary::from_records(&[record(0.0, 0.1, 0.0)]);
        assert!(s.ratio.is_nan());
    }

    #[test]
    fn test_no_records() {
        let s = ErrorSummary::from_records(&[]);
        assert_eq!(s.total, 0);
        assert!(s.bias.is_nan() && s.rmse.is_nan());
    }

    #[test]
    fn test_difference_summary() {
        let a = [0.5, 0.7, f64::NAN, 0.2];
        let b = [0.4, 0.9, 0.3, 0.2];
        let d = DifferenceSummary::between(&a, &b);
        assert_eq!(d.count, 3);
        assert_abs_diff_eq!(d.mean, (0.1 - 0.2 + 0.0) / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(d.mean_abs, 0.1, epsilon = 1e-12);
        assert!(d.std > 0.0);
    }

    #[test]
    fn test_rmsd() {
        assert_abs_diff_eq!(rmsd(&[1.0, 2.0, f64::NAN], &[1.0, 4.0, 0.0]), 2.0f64.sqrt(), epsilon = 1e-12);
        assert!(rmsd(&[f64::NAN], &[1.0]).is_nan());
    }
}

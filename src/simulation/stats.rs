use serde::{Deserialize, Serialize};

/// z-score of a two-sided 95% normal interval.
const Z_95: f64 = 1.959_963_984_540_054;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct SummaryStats {
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub p25: f64,
    pub p75: f64,
    /// 95% normal confidence interval of the mean, floored at zero.
    pub ci95_low: f64,
    pub ci95_high: f64,
}

/// Descriptive statistics of `values`. An empty slice summarizes to zeros.
pub fn summarize(values: &[f64]) -> SummaryStats {
    if values.is_empty() {
        return SummaryStats::default();
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let sq_dev = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
    let std_dev = (sq_dev / n).sqrt();

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let (ci95_low, ci95_high) = if values.len() > 1 {
        let sample_sd = (sq_dev / (n - 1.0)).sqrt();
        let half_width = Z_95 * sample_sd / n.sqrt();
        ((mean - half_width).max(0.0), mean + half_width)
    } else {
        (mean, mean)
    };

    SummaryStats {
        mean,
        median: percentile(&sorted, 0.5),
        std_dev,
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        p25: percentile(&sorted, 0.25),
        p75: percentile(&sorted, 0.75),
        ci95_low,
        ci95_high,
    }
}

/// Linear-interpolated quantile `q` in [0, 1] of an ascending slice.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_summarizes_to_zero() {
        assert_eq!(summarize(&[]), SummaryStats::default());
    }

    #[test]
    fn basic_statistics() {
        let stats = summarize(&[4.0, 1.0, 3.0, 2.0]);
        assert!((stats.mean - 2.5).abs() < 1e-12);
        assert!((stats.median - 2.5).abs() < 1e-12);
        assert!((stats.std_dev - 1.25_f64.sqrt()).abs() < 1e-12);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 4.0);
        assert!((stats.p25 - 1.75).abs() < 1e-12);
        assert!((stats.p75 - 3.25).abs() < 1e-12);
        assert!(stats.ci95_low <= stats.mean && stats.mean <= stats.ci95_high);
    }

    #[test]
    fn single_value_has_degenerate_interval() {
        let stats = summarize(&[5.0]);
        assert_eq!(stats.ci95_low, 5.0);
        assert_eq!(stats.ci95_high, 5.0);
        assert_eq!(stats.std_dev, 0.0);
    }

    #[test]
    fn confidence_interval_floored_at_zero() {
        let stats = summarize(&[0.0, 0.0, 0.0, 100.0]);
        assert!(stats.ci95_low >= 0.0);
    }

    #[test]
    fn percentile_handles_endpoints() {
        let sorted = [1.0, 2.0, 10.0];
        assert_eq!(percentile(&sorted, 0.0), 1.0);
        assert_eq!(percentile(&sorted, 1.0), 10.0);
        assert_eq!(percentile(&[], 0.5), 0.0);
    }
}

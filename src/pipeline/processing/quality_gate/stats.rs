use serde::Serialize;

/// Descriptive statistics over the non-null values of a numeric column
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryStats {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1); undefined for a single value
    pub std_dev: Option<f64>,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Describe `values`; `None` when there is nothing to describe
pub fn describe(values: &[f64]) -> Option<SummaryStats> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let count = sorted.len();
    let mean = sorted.iter().sum::<f64>() / count as f64;
    let std_dev = if count > 1 {
        let sum_sq: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
        Some((sum_sq / (count - 1) as f64).sqrt())
    } else {
        None
    };

    Some(SummaryStats {
        count,
        mean,
        std_dev,
        min: sorted[0],
        q1: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q3: quantile(&sorted, 0.75),
        max: sorted[count - 1],
    })
}

/// Linear-interpolated quantile of an ascending, non-empty slice
fn quantile(sorted: &[f64], p: f64) -> f64 {
    let position = p * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_describe_matches_interpolated_quartiles() {
        let stats = describe(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(stats.count, 4);
        assert!(close(stats.mean, 2.5));
        assert!(close(stats.min, 1.0));
        assert!(close(stats.q1, 1.75));
        assert!(close(stats.median, 2.5));
        assert!(close(stats.q3, 3.25));
        assert!(close(stats.max, 4.0));
        assert!(close(stats.std_dev.unwrap(), (5.0f64 / 3.0).sqrt()));
    }

    #[test]
    fn test_single_value_has_no_spread() {
        let stats = describe(&[7.5]).unwrap();
        assert!(stats.std_dev.is_none());
        assert!(close(stats.median, 7.5));
    }

    #[test]
    fn test_empty_input_is_undescribed() {
        assert!(describe(&[]).is_none());
    }
}

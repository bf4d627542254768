//! Summary statistics.

/// Mean and population standard deviation of `values`.
///
/// Returns `None` for an empty slice.
#[must_use]
pub fn mean_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }

    #[allow(clippy::cast_precision_loss)]
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    Some((mean, variance.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_population_std() {
        let (mean, std) = mean_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((mean - 5.0).abs() < 1e-12);
        assert!((std - 2.0).abs() < 1e-12);
    }

    #[test]
    fn constant_values_have_zero_std() {
        let (mean, std) = mean_std(&[3.5, 3.5, 3.5]).unwrap();
        assert!((mean - 3.5).abs() < 1e-12);
        assert!(std.abs() < 1e-12);
    }

    #[test]
    fn empty_has_no_stats() {
        assert!(mean_std(&[]).is_none());
    }
}

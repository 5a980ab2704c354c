//! Exponential moving average used for smoothed history views.

/// Smooths `series` (oldest first) with responsiveness `alpha`.
///
/// `alpha <= 0` returns the input unchanged, values above 1 are treated as 1.
/// The output always has the same length as the input.
pub fn ema(series: &[f64], alpha: f64) -> Vec<f64> {
    if alpha.is_nan() || alpha <= 0.0 {
        return series.to_vec();
    }
    let alpha = alpha.min(1.0);

    let mut out = Vec::with_capacity(series.len());
    let mut last = match series.first() {
        Some(first) => *first,
        None => return out,
    };
    out.push(last);
    for &v in &series[1..] {
        last = alpha * v + (1.0 - alpha) * last;
        out.push(last);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_alpha_is_passthrough() {
        let data = [1.0, 5.0, 2.0];
        assert_eq!(ema(&data, 0.0), data.to_vec());
        assert_eq!(ema(&data, -3.0), data.to_vec());
    }

    #[test]
    fn full_alpha_tracks_input() {
        let data = [1.0, 5.0, 2.0];
        assert_eq!(ema(&data, 1.0), data.to_vec());
        assert_eq!(ema(&data, 7.5), data.to_vec());
    }

    #[test]
    fn half_alpha_blends() {
        let out = ema(&[0.0, 10.0, 10.0], 0.5);
        assert_eq!(out, vec![0.0, 5.0, 7.5]);
    }

    #[test]
    fn empty_series() {
        assert!(ema(&[], 0.4).is_empty());
    }
}

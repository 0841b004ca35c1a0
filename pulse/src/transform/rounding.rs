//! Rounding rules shared by the aggregator and the privacy filter.
//!
//! All rounding is half away from zero (`f64::round`).

/// Rate grid in dollars.
pub const RATE_STEP: f64 = 25.0;

/// Sentiment grid.
pub const SENTIMENT_STEP: f64 = 0.05;

/// Round `x` to the nearest multiple of `step`, ties away from zero.
///
/// `round_to_nearest(-5.0, 25.0)` is `-0.0`.
pub fn round_to_nearest(x: f64, step: f64) -> f64 {
    (x / step).round() * step
}

/// Round to `decimals` places, ties away from zero.
pub fn round_dp(x: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (x * factor).round() / factor
}

/// `100 * part / whole` rounded to one decimal. `whole` must be non-zero.
pub fn share_pct(part: usize, whole: usize) -> f64 {
    round_dp(100.0 * part as f64 / whole as f64, 1)
}

/// Snap to the $25 grid and return whole dollars.
pub fn round_rate(x: f64) -> i64 {
    round_to_nearest(x, RATE_STEP) as i64
}

/// Snap to the 0.05 grid, clamped to [-1, 1].
///
/// Computed as `round(x * 20) / 20` so grid values print exactly
/// (`0.15`, not `0.15000000000000002`). Negative zero is folded to zero.
pub fn round_sentiment(x: f64) -> f64 {
    let steps = (1.0 / SENTIMENT_STEP).round();
    let snapped = (x.clamp(-1.0, 1.0) * steps).round() / steps;
    snapped + 0.0
}

/// Median of a non-empty slice; mean of the two middle values for even lengths.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to_nearest_25() {
        assert_eq!(round_to_nearest(12.0, 25.0), 0.0);
        assert_eq!(round_to_nearest(12.5, 25.0), 25.0);
        assert_eq!(round_to_nearest(13.0, 25.0), 25.0);
        assert_eq!(round_to_nearest(37.0, 25.0), 25.0);
        assert_eq!(round_to_nearest(38.0, 25.0), 50.0);
        assert_eq!(round_to_nearest(-12.5, 25.0), -25.0);

        let neg = round_to_nearest(-5.0, 25.0);
        assert_eq!(neg, 0.0);
        assert!(neg.is_sign_negative());
    }

    #[test]
    fn test_round_rate_median_tie() {
        // 162.5 / 25 = 6.5 rounds away from zero to 7
        assert_eq!(round_rate(162.5), 175);
        assert_eq!(round_rate(-5.0), 0);
    }

    #[test]
    fn test_share_pct() {
        assert_eq!(share_pct(3, 6), 50.0);
        assert_eq!(share_pct(4, 6), 66.7);
        assert_eq!(share_pct(2, 6), 33.3);
        assert_eq!(share_pct(0, 6), 0.0);
        assert_eq!(share_pct(6, 6), 100.0);
    }

    #[test]
    fn test_round_sentiment() {
        assert_eq!(round_sentiment(0.16), 0.15);
        assert_eq!(round_sentiment(0.18), 0.2);
        assert_eq!(round_sentiment(-0.024), 0.0);
        assert!(!round_sentiment(-0.024).is_sign_negative());
        assert_eq!(round_sentiment(1.7), 1.0);
        assert_eq!(round_sentiment(-1.2), -1.0);
        assert_eq!(format!("{:.2}", round_sentiment(0.3)), "0.30");
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[3.0]), Some(3.0));
        assert_eq!(median(&[225.0, 100.0, 175.0, 125.0, 200.0, 150.0]), Some(162.5));
        assert_eq!(median(&[5.0, 1.0, 3.0]), Some(3.0));
    }
}

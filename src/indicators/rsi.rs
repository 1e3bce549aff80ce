// =============================================================================
// Relative Strength Index (RSI) — trailing simple averages
// =============================================================================
//
// Averages gains and losses over the last `period` close-to-close deltas:
//   RS  = avgGain / avgLoss
//   RSI = 100 - 100 / (1 + RS)
//
// When the window contains no losses the RSI is exactly 100 (no division by
// zero).  This is the plain trailing-window convention, not Wilder smoothing.

/// Compute the current RSI over the last `period` deltas of `closes`.
///
/// # Edge cases
/// - `period == 0` => `None`
/// - `closes.len() < period + 1` => `None` (need `period` deltas)
/// - `avg_loss == 0` (all deltas non-negative, including a flat window)
///   => exactly `100.0`
/// - Non-finite result => `None`
pub fn calculate_rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let window = &closes[closes.len() - period - 1..];
    let (mut gains, mut losses) = (0.0_f64, 0.0_f64);
    for pair in window.windows(2) {
        let delta = pair[1] - pair[0];
        if delta > 0.0 {
            gains += delta;
        } else {
            losses += delta.abs();
        }
    }

    let period_f = period as f64;
    let avg_gain = gains / period_f;
    let avg_loss = losses / period_f;

    let rsi = if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    };

    rsi.is_finite().then_some(rsi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_data() {
        assert!(calculate_rsi(&[], 14).is_none());
        let closes: Vec<f64> = (1..=14).map(|x| x as f64).collect();
        assert!(calculate_rsi(&closes, 14).is_none());
    }

    #[test]
    fn period_zero() {
        assert!(calculate_rsi(&[1.0, 2.0, 3.0], 0).is_none());
    }

    #[test]
    fn all_gains_is_exactly_100() {
        let closes: Vec<f64> = (1..=30).map(|x| x as f64).collect();
        let rsi = calculate_rsi(&closes, 14).unwrap();
        assert_eq!(rsi, 100.0);
    }

    #[test]
    fn flat_window_is_exactly_100() {
        // Zero losses, zero gains: the no-loss rule wins.
        let rsi = calculate_rsi(&[100.0; 30], 14).unwrap();
        assert_eq!(rsi, 100.0);
    }

    #[test]
    fn all_losses_is_zero() {
        let closes: Vec<f64> = (1..=30).rev().map(|x| x as f64).collect();
        let rsi = calculate_rsi(&closes, 14).unwrap();
        assert!(rsi.abs() < 1e-10, "expected 0, got {rsi}");
    }

    #[test]
    fn balanced_moves_near_fifty() {
        // Alternating +1/-1 deltas: avg gain == avg loss.
        let mut closes = vec![100.0];
        for i in 0..20 {
            let last = *closes.last().unwrap();
            closes.push(if i % 2 == 0 { last + 1.0 } else { last - 1.0 });
        }
        let rsi = calculate_rsi(&closes, 14).unwrap();
        assert!((rsi - 50.0).abs() < 5.0, "expected near 50, got {rsi}");
    }

    #[test]
    fn only_trailing_window_counts() {
        // A crash before the window must not affect the result.
        let mut closes = vec![1_000.0, 10.0];
        closes.extend((1..=20).map(|x| 10.0 + x as f64));
        let rsi = calculate_rsi(&closes, 14).unwrap();
        assert_eq!(rsi, 100.0);
    }

    #[test]
    fn always_in_range() {
        let closes = vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84,
            46.08, 45.89, 46.03, 44.18, 44.22, 44.57, 43.42, 42.66, 43.13,
        ];
        let rsi = calculate_rsi(&closes, 14).unwrap();
        assert!((0.0..=100.0).contains(&rsi));
    }
}

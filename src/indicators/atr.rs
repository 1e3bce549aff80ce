// =============================================================================
// Average True Range (ATR) — Wilder's Smoothing
// =============================================================================
//
// True Range per bar:
//   TR = max(H - L, |H - prevClose|, |L - prevClose|)
//
// ATR seeds with the simple mean of the first `period` TR values, then:
//   ATR_t = (ATR_{t-1} * (period - 1) + TR_t) / period

use crate::market_data::Candle;

/// Compute the most recent ATR value over `candles` (oldest first).
///
/// # Edge cases
/// - `period == 0` => `None`
/// - Fewer than `period + 1` candles (each TR needs a previous close) => `None`
/// - Non-finite intermediates => `None`
pub fn calculate_atr(candles: &[Candle], period: usize) -> Option<f64> {
    if period == 0 || candles.len() < period + 1 {
        return None;
    }

    let mut true_ranges = Vec::with_capacity(candles.len() - 1);
    for pair in candles.windows(2) {
        let prev_close = pair[0].close;
        let c = &pair[1];
        let tr = (c.high - c.low)
            .max((c.high - prev_close).abs())
            .max((c.low - prev_close).abs());
        true_ranges.push(tr);
    }

    let seed: f64 = true_ranges[..period].iter().sum::<f64>() / period as f64;
    if !seed.is_finite() {
        return None;
    }

    let period_f = period as f64;
    let mut atr = seed;
    for &tr in &true_ranges[period..] {
        atr = (atr * (period_f - 1.0) + tr) / period_f;
        if !atr.is_finite() {
            return None;
        }
    }

    Some(atr)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle {
            open_time: 0,
            open,
            high,
            low,
            close,
            volume: 100.0,
            is_closed: true,
        }
    }

    #[test]
    fn period_zero() {
        let candles = vec![candle(100.0, 105.0, 95.0, 102.0); 20];
        assert!(calculate_atr(&candles, 0).is_none());
    }

    #[test]
    fn insufficient_data() {
        let candles = vec![candle(100.0, 105.0, 95.0, 102.0); 10];
        assert!(calculate_atr(&candles, 14).is_none());
    }

    #[test]
    fn constant_range_converges() {
        // Every bar spans 10 with closes inside the range: TR is constant 10.
        let mut candles = Vec::new();
        for i in 0..30 {
            let base = 100.0 + i as f64 * 0.1;
            candles.push(candle(base, base + 5.0, base - 5.0, base));
        }
        let atr = calculate_atr(&candles, 14).unwrap();
        assert!((atr - 10.0).abs() < 1.0, "expected ATR near 10, got {atr}");
    }

    #[test]
    fn gap_uses_previous_close() {
        // Gap up: |H - prevClose| = 20 dominates H - L = 7.
        let candles = vec![
            candle(100.0, 105.0, 95.0, 95.0),
            candle(110.0, 115.0, 108.0, 112.0),
            candle(112.0, 118.0, 110.0, 115.0),
            candle(115.0, 120.0, 113.0, 118.0),
        ];
        let atr = calculate_atr(&candles, 3).unwrap();
        assert!(atr > 7.0, "ATR should reflect the gap, got {atr}");
    }

    #[test]
    fn flat_candles_give_zero() {
        let flat = Candle {
            open_time: 0,
            open: 100.0,
            high: 100.0,
            low: 100.0,
            close: 100.0,
            volume: 0.0,
            is_closed: true,
        };
        let atr = calculate_atr(&vec![flat; 20], 14).unwrap();
        assert!(atr.abs() < 1e-12);
    }

    #[test]
    fn nan_returns_none() {
        let mut candles = vec![candle(100.0, 105.0, 95.0, 100.0); 4];
        candles[1].high = f64::NAN;
        assert!(calculate_atr(&candles, 3).is_none());
    }
}

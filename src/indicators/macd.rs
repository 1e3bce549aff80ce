// =============================================================================
// Moving Average Convergence / Divergence (MACD)
// =============================================================================
//
// MACD line  = EMA(close, 12) - EMA(close, 26), computed as aligned series.
// Signal     = 9-period EMA of the MACD line series.
// Histogram  = MACD - signal.
//
// The signal line is an EMA over the MACD *history*, so it only becomes
// defined once the MACD series itself has 9 elements.

use serde::{Deserialize, Serialize};

use super::ema::calculate_ema;

const FAST_PERIOD: usize = 12;
const SLOW_PERIOD: usize = 26;
const SIGNAL_PERIOD: usize = 9;

/// Current MACD snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdOutput {
    /// EMA12 - EMA26 at the latest close.
    pub macd: f64,
    /// 9-period EMA of the MACD line history; `None` until enough history.
    pub signal: Option<f64>,
    /// MACD - signal; `None` while the signal line is undefined.
    pub histogram: Option<f64>,
}

/// Compute the current MACD values over `closes` (oldest first).
///
/// Returns `None` below 26 closes or when the EMA series come back empty.
pub fn calculate_macd(closes: &[f64]) -> Option<MacdOutput> {
    if closes.len() < SLOW_PERIOD {
        return None;
    }

    let fast = calculate_ema(closes, FAST_PERIOD);
    let slow = calculate_ema(closes, SLOW_PERIOD);
    if fast.is_empty() || slow.is_empty() {
        return None;
    }

    // fast[i] covers close index FAST_PERIOD-1+i, slow[j] covers
    // SLOW_PERIOD-1+j; drop the fast head so both start at the same close.
    let offset = SLOW_PERIOD - FAST_PERIOD;
    if fast.len() <= offset {
        return None;
    }
    let macd_series: Vec<f64> = fast[offset..]
        .iter()
        .zip(&slow)
        .map(|(f, s)| f - s)
        .collect();

    let macd = *macd_series.last()?;
    let signal = calculate_ema(&macd_series, SIGNAL_PERIOD).last().copied();
    let histogram = signal.map(|s| macd - s);

    Some(MacdOutput {
        macd,
        signal,
        histogram,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_data() {
        let closes: Vec<f64> = (1..=25).map(|x| x as f64).collect();
        assert!(calculate_macd(&closes).is_none());
    }

    #[test]
    fn minimum_history_has_no_signal_line() {
        // Exactly 26 closes: one MACD point, far short of the 9 the signal
        // line needs.
        let closes: Vec<f64> = (1..=26).map(|x| x as f64).collect();
        let out = calculate_macd(&closes).unwrap();
        assert!(out.signal.is_none());
        assert!(out.histogram.is_none());
    }

    #[test]
    fn signal_line_appears_with_history() {
        // 26 + 8 extra closes: MACD series has 9 elements.
        let closes: Vec<f64> = (1..=34).map(|x| x as f64).collect();
        let out = calculate_macd(&closes).unwrap();
        assert!(out.signal.is_some());
        let hist = out.histogram.unwrap();
        assert!((hist - (out.macd - out.signal.unwrap())).abs() < 1e-10);
    }

    #[test]
    fn flat_series_is_all_zero() {
        let out = calculate_macd(&[100.0; 60]).unwrap();
        assert!(out.macd.abs() < 1e-10);
        assert!(out.signal.unwrap().abs() < 1e-10);
        assert!(out.histogram.unwrap().abs() < 1e-10);
    }

    #[test]
    fn uptrend_has_positive_macd() {
        let closes: Vec<f64> = (1..=120).map(|x| x as f64).collect();
        let out = calculate_macd(&closes).unwrap();
        assert!(out.macd > 0.0);
    }

    #[test]
    fn signal_lags_macd_after_reversal() {
        // Long uptrend then a sharp drop: the MACD line falls through its own
        // smoothed signal, so the histogram turns negative.
        let mut closes: Vec<f64> = (1..=80).map(|x| x as f64).collect();
        closes.extend((0..15).map(|i| 80.0 - 3.0 * i as f64));
        let out = calculate_macd(&closes).unwrap();
        assert!(out.histogram.unwrap() < 0.0);
    }
}

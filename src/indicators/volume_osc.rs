// =============================================================================
// Volume Oscillator — short vs long EMA spread of traded volume
// =============================================================================
//
//   osc = 100 * (EMA(last 5 volumes, 5) - EMA(last 10 volumes, 10))
//             / EMA(last 10 volumes, 10)
//
// A burst of volume lifts the short EMA above the long one; the oscillator
// reads the spread as a percentage.  The window EMAs here seed with the first
// value of the window and iterate across it, which keeps a single-bar spike
// visible (an SMA-seeded EMA over an exactly-window-sized input would just be
// the SMA).

/// Compute the volume oscillator over `volumes` (oldest first).
///
/// # Edge cases
/// - Fewer than 10 volumes => `0.0`
/// - Long EMA zero or non-finite => `0.0`
pub fn volume_oscillator(volumes: &[f64]) -> f64 {
    if volumes.len() < 10 {
        return 0.0;
    }

    let window = &volumes[volumes.len() - 10..];
    let short = running_ema(&window[5..], 5);
    let long = running_ema(window, 10);

    if long == 0.0 || !long.is_finite() || !short.is_finite() {
        return 0.0;
    }

    100.0 * (short - long) / long
}

/// EMA seeded with the first element and folded across the rest.
fn running_ema(values: &[f64], period: usize) -> f64 {
    let multiplier = 2.0 / (period + 1) as f64;
    let mut ema = values[0];
    for &value in &values[1..] {
        ema = value * multiplier + ema * (1.0 - multiplier);
    }
    ema
}

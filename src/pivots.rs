// =============================================================================
// Pivot Extraction — local price extrema over a symmetric window
// =============================================================================
//
// A candle is a pivot high when its high beats every neighbor within
// `left` candles before and `right` candles after it; symmetric for pivot
// lows.  Pivots are recomputed from scratch on every evaluation — the buffer
// is small and bounded, so incremental maintenance buys nothing.

use serde::{Deserialize, Serialize};

use crate::market_data::Candle;

/// Whether a pivot marks a local high or a local low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PivotKind {
    High,
    Low,
}

/// A local extremum derived from the current buffer contents.
///
/// Never persisted independently of the candles it was derived from; the
/// `index` is only meaningful against that same slice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PivotPoint {
    pub price: f64,
    pub index: usize,
    pub time: i64,
    pub kind: PivotKind,
}

/// How a candidate compares against its neighbors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PivotMode {
    /// A neighbor matching the candidate's extreme disqualifies it
    /// (ties break the pivot).
    #[default]
    Strict,
    /// Only a neighbor strictly beyond the candidate disqualifies it.
    Inclusive,
}

/// Find all pivot highs across `candles` (oldest first).
///
/// A buffer shorter than `left + right + 1` yields no pivots.
pub fn find_pivot_highs(
    candles: &[Candle],
    left: usize,
    right: usize,
    mode: PivotMode,
) -> Vec<PivotPoint> {
    find_pivots(candles, left, right, mode, PivotKind::High)
}

/// Find all pivot lows across `candles` (oldest first).
pub fn find_pivot_lows(
    candles: &[Candle],
    left: usize,
    right: usize,
    mode: PivotMode,
) -> Vec<PivotPoint> {
    find_pivots(candles, left, right, mode, PivotKind::Low)
}

fn find_pivots(
    candles: &[Candle],
    left: usize,
    right: usize,
    mode: PivotMode,
    kind: PivotKind,
) -> Vec<PivotPoint> {
    if candles.len() < left + right + 1 {
        return Vec::new();
    }

    let mut pivots = Vec::new();
    for i in left..candles.len() - right {
        let candidate = match kind {
            PivotKind::High => candles[i].high,
            PivotKind::Low => candles[i].low,
        };

        let beaten = candles[i - left..=i + right]
            .iter()
            .enumerate()
            .filter(|(j, _)| i - left + j != i)
            .any(|(_, neighbor)| {
                let value = match kind {
                    PivotKind::High => neighbor.high,
                    PivotKind::Low => neighbor.low,
                };
                match (kind, mode) {
                    (PivotKind::High, PivotMode::Strict) => value >= candidate,
                    (PivotKind::High, PivotMode::Inclusive) => value > candidate,
                    (PivotKind::Low, PivotMode::Strict) => value <= candidate,
                    (PivotKind::Low, PivotMode::Inclusive) => value < candidate,
                }
            });

        if !beaten {
            pivots.push(PivotPoint {
                price: candidate,
                index: i,
                time: candles[i].open_time,
                kind,
            });
        }
    }
    pivots
}

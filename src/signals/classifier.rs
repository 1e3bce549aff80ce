// =============================================================================
// Signal Classifier — break and wick detection on the latest closed candle
// =============================================================================
//
// Break rule: the candle closed beyond a previously identified pivot level
// AND the volume oscillator clears the configured threshold.  The broken
// level is the nearest pivot on the crossed side of the close; the next
// pivot beyond the close becomes the target.
//
// Wick rule: the candle's range is dominated by one wick (> 60%) with a
// small body (< 30%).  Wicks ignore the volume filter.
//
// A single candle emits at most one break signal and at most one wick
// signal.  The families are independent by default;
// `wick_suppresses_break` switches to the mutually-exclusive variant.

use crate::engine_config::EngineConfig;
use crate::indicators::MacdOutput;
use crate::market_data::Candle;
use crate::pivots::PivotPoint;

use super::{Signal, SignalDetail};

/// Share of the range one wick must exceed to qualify.
const WICK_MIN_RATIO: f64 = 0.6;
/// Share of the range the body must stay under for a wick signal.
const BODY_MAX_RATIO: f64 = 0.3;

/// Everything the classifier looks at for one evaluation of one symbol.
pub struct ClassifierInput<'a> {
    pub symbol: &'a str,
    /// Latest closed candle.
    pub candle: &'a Candle,
    pub pivot_highs: &'a [PivotPoint],
    pub pivot_lows: &'a [PivotPoint],
    pub volume_oscillator: f64,
    pub rsi: Option<f64>,
    pub macd: Option<MacdOutput>,
    pub atr: Option<f64>,
}

/// Classify the latest closed candle into zero, one, or two signals.
pub fn classify(input: &ClassifierInput<'_>, config: &EngineConfig) -> Vec<Signal> {
    let mut signals = Vec::with_capacity(2);

    let wick = classify_wick(input);

    let suppress_break = config.wick_suppresses_break && wick.is_some();
    if !suppress_break {
        if let Some(break_signal) = classify_break(input, config) {
            signals.push(break_signal);
        }
    }

    if let Some(wick_signal) = wick {
        signals.push(wick_signal);
    }

    signals
}

// ---------------------------------------------------------------------------
// Break classification
// ---------------------------------------------------------------------------

fn classify_break(input: &ClassifierInput<'_>, config: &EngineConfig) -> Option<Signal> {
    if input.volume_oscillator <= config.volume_threshold {
        return None;
    }

    let close = input.candle.close;

    // Resistance wins when both sides broke on the same candle.
    if let Some(resistance) = broken_resistance(input.pivot_highs, close) {
        let level = resistance.price;
        return Some(make_signal(
            input,
            SignalDetail::BreakResistance {
                level,
                change_pct: (close - level) / level * 100.0,
                volume_oscillator: input.volume_oscillator,
                volume: input.candle.volume,
                next_target: next_resistance_target(input.pivot_highs, close),
            },
        ));
    }

    if let Some(support) = broken_support(input.pivot_lows, close) {
        let level = support.price;
        return Some(make_signal(
            input,
            SignalDetail::BreakSupport {
                level,
                change_pct: (level - close) / level * 100.0,
                volume_oscillator: input.volume_oscillator,
                volume: input.candle.volume,
                next_target: next_support_target(input.pivot_lows, close),
            },
        ));
    }

    None
}

/// The pivot high the close broke through: largest price strictly below it.
fn broken_resistance(pivot_highs: &[PivotPoint], close: f64) -> Option<&PivotPoint> {
    pivot_highs
        .iter()
        .filter(|p| p.price < close)
        .max_by(|a, b| a.price.total_cmp(&b.price))
}

/// The pivot low the close fell through: smallest price strictly above it.
fn broken_support(pivot_lows: &[PivotPoint], close: f64) -> Option<&PivotPoint> {
    pivot_lows
        .iter()
        .filter(|p| p.price > close)
        .min_by(|a, b| a.price.total_cmp(&b.price))
}

/// Nearest pivot high still above the close.
fn next_resistance_target(pivot_highs: &[PivotPoint], close: f64) -> Option<f64> {
    pivot_highs
        .iter()
        .filter(|p| p.price > close)
        .min_by(|a, b| a.price.total_cmp(&b.price))
        .map(|p| p.price)
}

/// Nearest pivot low still below the close.
fn next_support_target(pivot_lows: &[PivotPoint], close: f64) -> Option<f64> {
    pivot_lows
        .iter()
        .filter(|p| p.price < close)
        .max_by(|a, b| a.price.total_cmp(&b.price))
        .map(|p| p.price)
}

// ---------------------------------------------------------------------------
// Wick classification
// ---------------------------------------------------------------------------

fn classify_wick(input: &ClassifierInput<'_>) -> Option<Signal> {
    let c = input.candle;
    let range = c.range();
    if range == 0.0 {
        return None;
    }

    let body = (c.close - c.open).abs() / range;
    if body >= BODY_MAX_RATIO {
        return None;
    }

    let lower = (c.open.min(c.close) - c.low) / range;
    let upper = (c.high - c.open.max(c.close)) / range;

    let detail = if lower > WICK_MIN_RATIO {
        SignalDetail::BullWick {
            wick_pct: lower * 100.0,
            body_pct: body * 100.0,
        }
    } else if upper > WICK_MIN_RATIO {
        SignalDetail::BearWick {
            wick_pct: upper * 100.0,
            body_pct: body * 100.0,
        }
    } else {
        return None;
    };

    Some(make_signal(input, detail))
}

fn make_signal(input: &ClassifierInput<'_>, detail: SignalDetail) -> Signal {
    Signal {
        symbol: input.symbol.to_string(),
        price: input.candle.close,
        time: input.candle.open_time,
        is_persistent: false,
        rsi: input.rsi,
        macd: input.macd,
        atr: input.atr,
        detail,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

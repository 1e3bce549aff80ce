// =============================================================================
// Signal Engine — per-symbol orchestration of buffer, pivots, and signals
// =============================================================================
//
// Owns one SymbolState (candle buffer + persistent tracker) per symbol.  The
// symbol map is the only shared structure; it guards creation of new entries.
// Each SymbolState sits behind its own lock, so writers for different symbols
// never contend and a fault in one symbol cannot touch another's state.
//
// Evaluation runs on closed candles only:
//   reversal check -> pivot extraction -> indicators -> classifier ->
//   persistence merge.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::engine_config::EngineConfig;
use crate::indicators::atr::calculate_atr;
use crate::indicators::macd::calculate_macd;
use crate::indicators::rsi::calculate_rsi;
use crate::indicators::sma::calculate_sma;
use crate::indicators::volume_osc::volume_oscillator;
use crate::market_data::{Candle, CandleBuffer, IngestError, IngestOutcome};
use crate::pivots::{find_pivot_highs, find_pivot_lows};
use crate::signals::{classify, ClassifierInput, PersistentTracker, Signal};

/// All mutable state for one tracked symbol.
struct SymbolState {
    buffer: CandleBuffer,
    tracker: PersistentTracker,
}

impl SymbolState {
    fn new(capacity: usize) -> Self {
        Self {
            buffer: CandleBuffer::new(capacity),
            tracker: PersistentTracker::new(),
        }
    }
}

/// The streaming signal-detection engine.
///
/// Shared across tasks via `Arc<Engine>`; all methods take `&self`.
pub struct Engine {
    config: RwLock<EngineConfig>,
    symbols: RwLock<HashMap<String, Arc<Mutex<SymbolState>>>>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config: RwLock::new(config),
            symbols: RwLock::new(HashMap::new()),
        }
    }

    /// Feed one candle for `symbol`, creating its state on first sight.
    ///
    /// Malformed and out-of-order candles are rejected with a typed error
    /// and logged; the symbol's buffer is left untouched either way.
    pub fn ingest(&self, symbol: &str, candle: Candle) -> Result<IngestOutcome, IngestError> {
        let state = self.state_or_create(symbol);
        let result = state.lock().buffer.ingest(candle);
        if let Err(e) = &result {
            warn!(symbol, error = %e, "candle rejected at ingest");
        }
        result
    }

    /// Evaluate one symbol against its current closed-candle history.
    ///
    /// Returns an empty vec for unknown symbols and for symbols with fewer
    /// than `left_bars + right_bars + min_margin` closed candles.
    pub fn evaluate(&self, symbol: &str) -> Vec<Signal> {
        let Some(state) = self.state(symbol) else {
            return Vec::new();
        };
        let config = self.config.read().clone();
        let mut state = state.lock();

        let required = config.min_history();
        if state.buffer.closed_len() < required {
            debug!(
                symbol,
                closed = state.buffer.closed_len(),
                required,
                "insufficient history, skipping evaluation"
            );
            return Vec::new();
        }

        let closed = state.buffer.closed();
        let Some(latest) = closed.last() else {
            return Vec::new();
        };

        // 1. Reversal first: a stale open signal must not survive the candle
        //    that invalidated it.
        if let Some(cleared) = state.tracker.check_reversal(latest.close) {
            info!(
                symbol,
                kind = %cleared.kind(),
                level = cleared.level(),
                close = latest.close,
                "persistent signal cleared by reversal"
            );
        }

        // 2. Pivots and indicators over the closed history.
        let pivot_highs =
            find_pivot_highs(&closed, config.left_bars, config.right_bars, config.pivot_mode);
        let pivot_lows =
            find_pivot_lows(&closed, config.left_bars, config.right_bars, config.pivot_mode);

        let closes: Vec<f64> = closed.iter().map(|c| c.close).collect();
        let volumes: Vec<f64> = closed.iter().map(|c| c.volume).collect();

        let osc = volume_oscillator(&volumes);
        debug!(
            symbol,
            osc,
            avg_volume = calculate_sma(&volumes, 20).last().copied(),
            pivot_highs = pivot_highs.len(),
            pivot_lows = pivot_lows.len(),
            "evaluation inputs"
        );

        let input = ClassifierInput {
            symbol,
            candle: latest,
            pivot_highs: &pivot_highs,
            pivot_lows: &pivot_lows,
            volume_oscillator: osc,
            rsi: calculate_rsi(&closes, config.rsi_period),
            macd: calculate_macd(&closes),
            atr: calculate_atr(&closed, config.atr_period),
        };

        // 3. Classification, then persistence.
        let mut signals = classify(&input, &config);

        if let Some(fresh_break) = signals.iter().find(|s| s.kind().is_break()) {
            info!(
                symbol,
                kind = %fresh_break.kind(),
                level = fresh_break.level(),
                price = fresh_break.price,
                "break signal fired"
            );
            state.tracker.record(fresh_break);
        } else if let Some(pinned) = state.tracker.reemit() {
            signals.push(pinned);
        }

        signals
    }

    /// Evaluate every tracked symbol and concatenate the results, newest
    /// first.  Symbols are independent; order of evaluation is unspecified.
    pub fn evaluate_all(&self) -> Vec<Signal> {
        let symbols: Vec<String> = self.symbols.read().keys().cloned().collect();

        let mut signals = Vec::new();
        for symbol in symbols {
            signals.extend(self.evaluate(&symbol));
        }
        signals.sort_by_key(|s| std::cmp::Reverse(s.time));
        signals
    }

    /// Snapshot of the open persistent signal per symbol.
    pub fn persistent_signals(&self) -> HashMap<String, Signal> {
        let symbols: Vec<(String, Arc<Mutex<SymbolState>>)> = self
            .symbols
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        symbols
            .into_iter()
            .filter_map(|(symbol, state)| {
                let pinned = state.lock().tracker.reemit()?;
                Some((symbol, pinned))
            })
            .collect()
    }

    /// Replace the engine tunables.  Takes effect on the next evaluation;
    /// `capacity` applies to symbols created afterwards.
    pub fn configure(&self, config: EngineConfig) {
        info!(
            left_bars = config.left_bars,
            right_bars = config.right_bars,
            volume_threshold = config.volume_threshold,
            "engine reconfigured"
        );
        *self.config.write() = config;
    }

    /// Drop all symbol state.
    pub fn reset(&self) {
        let mut symbols = self.symbols.write();
        info!(symbols = symbols.len(), "engine reset");
        symbols.clear();
    }

    /// Stop tracking one symbol.  Safe at any time: an in-flight evaluation
    /// holds its own handle to the state and simply finishes on the
    /// unlinked copy.
    pub fn remove_symbol(&self, symbol: &str) -> bool {
        let removed = self.symbols.write().remove(symbol).is_some();
        if removed {
            info!(symbol, "symbol dropped from tracking");
        }
        removed
    }

    /// Latest observed price for a symbol, including any in-progress candle.
    pub fn current_price(&self, symbol: &str) -> Option<f64> {
        let state = self.state(symbol)?;
        let price = state.lock().buffer.last().map(|c| c.close);
        price
    }

    /// Symbols currently tracked.
    pub fn tracked_symbols(&self) -> Vec<String> {
        self.symbols.read().keys().cloned().collect()
    }

    fn state(&self, symbol: &str) -> Option<Arc<Mutex<SymbolState>>> {
        self.symbols.read().get(symbol).cloned()
    }

    fn state_or_create(&self, symbol: &str) -> Arc<Mutex<SymbolState>> {
        if let Some(state) = self.state(symbol) {
            return state;
        }
        let capacity = self.config.read().capacity;
        self.symbols
            .write()
            .entry(symbol.to_string())
            .or_insert_with(|| {
                debug!(symbol, capacity, "tracking new symbol");
                Arc::new(Mutex::new(SymbolState::new(capacity)))
            })
            .clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

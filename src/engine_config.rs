// =============================================================================
// Engine Configuration — tunable detection parameters
// =============================================================================
//
// Every knob of the signal engine lives here so a deployment can be retuned
// without code changes.  All fields carry serde defaults so an older JSON
// file missing new fields still loads.  Configuration is read at startup and
// via `Engine::configure`; the engine never writes it back.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::pivots::PivotMode;

fn default_left_bars() -> usize {
    15
}

fn default_right_bars() -> usize {
    15
}

fn default_volume_threshold() -> f64 {
    20.0
}

fn default_capacity() -> usize {
    500
}

fn default_min_margin() -> usize {
    5
}

fn default_rsi_period() -> usize {
    14
}

fn default_atr_period() -> usize {
    14
}

fn default_symbols() -> Vec<String> {
    vec![
        "BTCUSDT".to_string(),
        "ETHUSDT".to_string(),
        "BNBUSDT".to_string(),
        "XRPUSDT".to_string(),
        "SOLUSDT".to_string(),
    ]
}

/// Tunable parameters for the signal engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Candles required to the left of a pivot candidate.
    #[serde(default = "default_left_bars")]
    pub left_bars: usize,

    /// Candles required to the right of a pivot candidate.
    #[serde(default = "default_right_bars")]
    pub right_bars: usize,

    /// Volume oscillator value a break must exceed to fire.
    #[serde(default = "default_volume_threshold")]
    pub volume_threshold: f64,

    /// Maximum candles retained per symbol.
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Extra closed candles required beyond the pivot window before a symbol
    /// is evaluated at all.
    #[serde(default = "default_min_margin")]
    pub min_margin: usize,

    /// Pivot neighbor comparison: strict (ties disqualify) or inclusive.
    #[serde(default)]
    pub pivot_mode: PivotMode,

    /// When set, a wick-shaped candle suppresses the break signal on the
    /// same candle instead of firing alongside it.
    #[serde(default)]
    pub wick_suppresses_break: bool,

    /// Look-back for the RSI context attached to signals.
    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,

    /// Look-back for the ATR context attached to signals.
    #[serde(default = "default_atr_period")]
    pub atr_period: usize,

    /// Symbols the demo binary subscribes to.
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            left_bars: default_left_bars(),
            right_bars: default_right_bars(),
            volume_threshold: default_volume_threshold(),
            capacity: default_capacity(),
            min_margin: default_min_margin(),
            pivot_mode: PivotMode::default(),
            wick_suppresses_break: false,
            rsi_period: default_rsi_period(),
            atr_period: default_atr_period(),
            symbols: default_symbols(),
        }
    }
}

impl EngineConfig {
    /// Closed candles a symbol needs before evaluation makes sense.
    pub fn min_history(&self) -> usize {
        self.left_bars + self.right_bars + self.min_margin
    }

    /// Load configuration from a JSON file at `path`.
    ///
    /// Missing file or bad JSON is an error; callers fall back to defaults
    /// with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read engine config from {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse engine config from {}", path.display()))?;

        info!(
            path = %path.display(),
            left_bars = config.left_bars,
            right_bars = config.right_bars,
            volume_threshold = config.volume_threshold,
            "engine config loaded"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_detection_profile() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.left_bars, 15);
        assert_eq!(cfg.right_bars, 15);
        assert_eq!(cfg.volume_threshold, 20.0);
        assert_eq!(cfg.capacity, 500);
        assert_eq!(cfg.min_history(), 35);
        assert_eq!(cfg.pivot_mode, PivotMode::Strict);
        assert!(!cfg.wick_suppresses_break);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: EngineConfig =
            serde_json::from_str(r#"{"volume_threshold": 35.5}"#).unwrap();
        assert_eq!(cfg.volume_threshold, 35.5);
        assert_eq!(cfg.left_bars, 15);
        assert_eq!(cfg.rsi_period, 14);
    }

    #[test]
    fn pivot_mode_round_trips() {
        let cfg: EngineConfig =
            serde_json::from_str(r#"{"pivot_mode": "inclusive"}"#).unwrap();
        assert_eq!(cfg.pivot_mode, PivotMode::Inclusive);
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(json.contains("\"inclusive\""));
    }
}

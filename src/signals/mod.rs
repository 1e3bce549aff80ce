// =============================================================================
// Signals Module
// =============================================================================
//
// Signal model and the two stages that produce signals:
// - classifier: break / wick detection on the latest closed candle
// - persistent: per-symbol lifecycle for open break signals

pub mod classifier;
pub mod persistent;

pub use classifier::{classify, ClassifierInput};
pub use persistent::PersistentTracker;

use serde::{Deserialize, Serialize};

use crate::indicators::MacdOutput;

/// Kind tag for a signal, used for filtering and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    BreakResistance,
    BreakSupport,
    BullWick,
    BearWick,
}

impl SignalKind {
    pub fn is_break(self) -> bool {
        matches!(self, Self::BreakResistance | Self::BreakSupport)
    }

    pub fn is_wick(self) -> bool {
        !self.is_break()
    }
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BreakResistance => write!(f, "BreakResistance"),
            Self::BreakSupport => write!(f, "BreakSupport"),
            Self::BullWick => write!(f, "BullWick"),
            Self::BearWick => write!(f, "BearWick"),
        }
    }
}

/// Kind-specific payload of a signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum SignalDetail {
    /// Price closed above a previously identified pivot high.
    BreakResistance {
        /// The broken resistance price.
        level: f64,
        /// Close distance above the level, in percent.
        change_pct: f64,
        volume_oscillator: f64,
        /// Volume of the triggering candle.
        volume: f64,
        /// Nearest remaining pivot high above the close, if any.
        next_target: Option<f64>,
    },
    /// Price closed below a previously identified pivot low.
    BreakSupport {
        level: f64,
        change_pct: f64,
        volume_oscillator: f64,
        volume: f64,
        /// Nearest remaining pivot low below the close, if any.
        next_target: Option<f64>,
    },
    /// Long lower wick with a small body: potential bullish rejection.
    BullWick { wick_pct: f64, body_pct: f64 },
    /// Long upper wick with a small body: potential bearish rejection.
    BearWick { wick_pct: f64, body_pct: f64 },
}

/// A discrete signal event.  Immutable once constructed; every evaluation
/// cycle that still satisfies the firing conditions produces a fresh value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: String,
    /// Close price of the candle the signal fired on.
    pub price: f64,
    /// Open time of that candle, epoch milliseconds.
    pub time: i64,
    /// True when this emission is an open break signal carried forward from
    /// an earlier cycle rather than a fresh trigger.
    pub is_persistent: bool,
    /// RSI context at trigger time, when enough history existed.
    pub rsi: Option<f64>,
    /// MACD context at trigger time, when enough history existed.
    pub macd: Option<MacdOutput>,
    /// ATR context at trigger time, when enough history existed.
    pub atr: Option<f64>,
    #[serde(flatten)]
    pub detail: SignalDetail,
}

impl Signal {
    pub fn kind(&self) -> SignalKind {
        match self.detail {
            SignalDetail::BreakResistance { .. } => SignalKind::BreakResistance,
            SignalDetail::BreakSupport { .. } => SignalKind::BreakSupport,
            SignalDetail::BullWick { .. } => SignalKind::BullWick,
            SignalDetail::BearWick { .. } => SignalKind::BearWick,
        }
    }

    /// The broken pivot price, for break signals.
    pub fn level(&self) -> Option<f64> {
        match self.detail {
            SignalDetail::BreakResistance { level, .. }
            | SignalDetail::BreakSupport { level, .. } => Some(level),
            _ => None,
        }
    }
}

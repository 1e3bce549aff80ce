// =============================================================================
// Persistent Signal Tracker — open break signals pinned until reversal
// =============================================================================
//
// Per-symbol state machine with two states: Empty and Open.  A break signal
// moves it to Open; the stored signal is then re-emitted every evaluation
// cycle, whether or not the trigger conditions still hold, until price
// reverses 2% past the broken level.  A newer break overwrites the stored
// one — there is never more than one open signal per symbol.

use super::{Signal, SignalDetail};

/// Reversal margin past the broken level that invalidates an open signal.
pub const REVERSAL_PCT: f64 = 0.02;

/// Lifecycle state for one symbol's open break signal.
#[derive(Debug, Default)]
pub struct PersistentTracker {
    open: Option<Signal>,
}

impl PersistentTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently open signal, if any.
    pub fn open_signal(&self) -> Option<&Signal> {
        self.open.as_ref()
    }

    /// Store a freshly fired break signal, replacing any open one.
    ///
    /// Non-break signals are ignored; wicks have no lifecycle.
    pub fn record(&mut self, signal: &Signal) {
        if signal.kind().is_break() {
            self.open = Some(signal.clone());
        }
    }

    /// Check the latest close against the reversal rule.
    ///
    /// An open BreakResistance clears when `close < level * 0.98`; an open
    /// BreakSupport clears when `close > level * 1.02`.  Returns the cleared
    /// signal so the caller can log the invalidation.
    pub fn check_reversal(&mut self, close: f64) -> Option<Signal> {
        let reversed = match self.open.as_ref().map(|s| &s.detail) {
            Some(SignalDetail::BreakResistance { level, .. }) => {
                close < level * (1.0 - REVERSAL_PCT)
            }
            Some(SignalDetail::BreakSupport { level, .. }) => {
                close > level * (1.0 + REVERSAL_PCT)
            }
            _ => false,
        };

        if reversed {
            self.open.take()
        } else {
            None
        }
    }

    /// A copy of the open signal marked as a carried-forward emission.
    pub fn reemit(&self) -> Option<Signal> {
        self.open.as_ref().map(|s| Signal {
            is_persistent: true,
            ..s.clone()
        })
    }

    pub fn clear(&mut self) {
        self.open = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::SignalKind;

    fn break_resistance(level: f64) -> Signal {
        Signal {
            symbol: "BTCUSDT".into(),
            price: level * 1.01,
            time: 0,
            is_persistent: false,
            rsi: None,
            macd: None,
            atr: None,
            detail: SignalDetail::BreakResistance {
                level,
                change_pct: 1.0,
                volume_oscillator: 30.0,
                volume: 500.0,
                next_target: None,
            },
        }
    }

    fn break_support(level: f64) -> Signal {
        Signal {
            symbol: "BTCUSDT".into(),
            price: level * 0.99,
            time: 0,
            is_persistent: false,
            rsi: None,
            macd: None,
            atr: None,
            detail: SignalDetail::BreakSupport {
                level,
                change_pct: 1.0,
                volume_oscillator: 30.0,
                volume: 500.0,
                next_target: None,
            },
        }
    }

    fn bull_wick() -> Signal {
        Signal {
            symbol: "BTCUSDT".into(),
            price: 100.0,
            time: 0,
            is_persistent: false,
            rsi: None,
            macd: None,
            atr: None,
            detail: SignalDetail::BullWick {
                wick_pct: 70.0,
                body_pct: 10.0,
            },
        }
    }

    #[test]
    fn starts_empty() {
        let tracker = PersistentTracker::new();
        assert!(tracker.open_signal().is_none());
        assert!(tracker.reemit().is_none());
    }

    #[test]
    fn wicks_are_not_tracked() {
        let mut tracker = PersistentTracker::new();
        tracker.record(&bull_wick());
        assert!(tracker.open_signal().is_none());
    }

    #[test]
    fn reemit_marks_persistent() {
        let mut tracker = PersistentTracker::new();
        tracker.record(&break_resistance(100.0));

        let emitted = tracker.reemit().unwrap();
        assert!(emitted.is_persistent);
        assert_eq!(emitted.kind(), SignalKind::BreakResistance);
        // Stored copy is untouched.
        assert!(!tracker.open_signal().unwrap().is_persistent);
    }

    #[test]
    fn resistance_reversal_boundary_is_exact() {
        let mut tracker = PersistentTracker::new();
        tracker.record(&break_resistance(100.0));

        // Anything in [98.0, inf) keeps it open.
        assert!(tracker.check_reversal(150.0).is_none());
        assert!(tracker.check_reversal(98.0).is_none());
        assert!(tracker.open_signal().is_some());

        // First close below 98.0 clears it.
        let cleared = tracker.check_reversal(97.999).unwrap();
        assert_eq!(cleared.level(), Some(100.0));
        assert!(tracker.open_signal().is_none());
        assert!(tracker.reemit().is_none());
    }

    #[test]
    fn support_reversal_is_symmetric() {
        let mut tracker = PersistentTracker::new();
        tracker.record(&break_support(100.0));

        assert!(tracker.check_reversal(95.0).is_none());
        assert!(tracker.check_reversal(102.0).is_none());
        assert!(tracker.check_reversal(102.001).is_some());
        assert!(tracker.open_signal().is_none());
    }

    #[test]
    fn newer_break_overwrites_without_stacking() {
        let mut tracker = PersistentTracker::new();
        tracker.record(&break_resistance(100.0));
        tracker.record(&break_support(90.0));

        let open = tracker.open_signal().unwrap();
        assert_eq!(open.kind(), SignalKind::BreakSupport);
        assert_eq!(open.level(), Some(90.0));
    }

    #[test]
    fn clear_empties_the_tracker() {
        let mut tracker = PersistentTracker::new();
        tracker.record(&break_resistance(100.0));
        tracker.clear();
        assert!(tracker.open_signal().is_none());
    }
}

// =============================================================================
// Candle Buffer — bounded, time-ordered OHLCV history for one symbol
// =============================================================================
//
// Holds the most recent candles for a single symbol, oldest first.  The live
// (unclosed) candle is updated in place; once a candle closes it becomes
// permanent and the buffer is trimmed to `capacity` (FIFO eviction).
//
// Ordering invariant: `open_time` is non-decreasing across the buffer, and
// strictly increasing across distinct candles.  Updates that would violate it
// are rejected with a typed error and leave the buffer untouched.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// A single OHLCV candle for a fixed time bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    /// Bucket open time, epoch milliseconds.
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Whether the bucket is finalized.  Unclosed candles refresh the current
    /// price/volume view but never participate in signal evaluation.
    pub is_closed: bool,
}

impl Candle {
    /// Check internal consistency of the OHLCV values.
    ///
    /// A candle is well-formed when every value is finite, `volume >= 0`,
    /// `high` is the top of the range and `low` the bottom.  A degenerate
    /// candle with `high == low` is valid.
    pub fn validate(&self) -> Result<(), IngestError> {
        let values = [self.open, self.high, self.low, self.close, self.volume];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(IngestError::Malformed {
                reason: "non-finite OHLCV value",
            });
        }
        if self.volume < 0.0 {
            return Err(IngestError::Malformed {
                reason: "negative volume",
            });
        }
        if self.high < self.open.max(self.close) || self.high < self.low {
            return Err(IngestError::Malformed {
                reason: "high below other components",
            });
        }
        if self.low > self.open.min(self.close) {
            return Err(IngestError::Malformed {
                reason: "low above open/close",
            });
        }
        Ok(())
    }

    /// Full high-to-low extent.  Zero for a degenerate candle.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}

/// Why an ingest call did not mutate the buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    /// The candle carried non-finite or internally inconsistent values.
    #[error("malformed candle: {reason}")]
    Malformed { reason: &'static str },

    /// The candle's `open_time` is behind (or duplicates) the finalized tail
    /// of the buffer.
    #[error("out-of-order candle: open_time {incoming} not after last {last}")]
    OutOfOrder { incoming: i64, last: i64 },
}

/// What an accepted ingest call did to the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// A new entry was appended (the oldest may have been evicted).
    Appended,
    /// The in-progress tail entry was replaced with a newer revision.
    Replaced,
}

// ---------------------------------------------------------------------------
// CandleBuffer
// ---------------------------------------------------------------------------

/// Bounded candle history for one symbol, oldest first.
#[derive(Debug)]
pub struct CandleBuffer {
    candles: VecDeque<Candle>,
    capacity: usize,
}

impl CandleBuffer {
    /// Create a buffer retaining at most `capacity` candles.
    pub fn new(capacity: usize) -> Self {
        Self {
            candles: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Insert or replace the latest candle.
    ///
    /// * Same `open_time` as the tail entry while that entry is unclosed:
    ///   replace in place (in-progress update, including the finalizing
    ///   revision that flips `is_closed`).
    /// * `open_time` beyond the tail: append, then evict the oldest entry
    ///   while over capacity.
    /// * `open_time` at or behind a finalized tail: rejected, buffer
    ///   unchanged.
    pub fn ingest(&mut self, candle: Candle) -> Result<IngestOutcome, IngestError> {
        candle.validate()?;

        if let Some(last) = self.candles.back_mut() {
            if candle.open_time == last.open_time && !last.is_closed {
                *last = candle;
                return Ok(IngestOutcome::Replaced);
            }
            if candle.open_time <= last.open_time {
                return Err(IngestError::OutOfOrder {
                    incoming: candle.open_time,
                    last: last.open_time,
                });
            }
        }

        self.candles.push_back(candle);
        while self.candles.len() > self.capacity {
            self.candles.pop_front();
        }
        Ok(IngestOutcome::Appended)
    }

    /// All closed candles, oldest first.
    pub fn closed(&self) -> Vec<Candle> {
        self.candles.iter().filter(|c| c.is_closed).cloned().collect()
    }

    /// Number of closed candles currently held.
    pub fn closed_len(&self) -> usize {
        self.candles.iter().filter(|c| c.is_closed).count()
    }

    /// The most recent closed candle, if any.
    pub fn last_closed(&self) -> Option<&Candle> {
        self.candles.iter().rev().find(|c| c.is_closed)
    }

    /// The most recent entry, closed or not.
    pub fn last(&self) -> Option<&Candle> {
        self.candles.back()
    }

    /// Total entries held, including any in-progress candle.
    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

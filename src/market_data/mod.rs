// =============================================================================
// Market Data Module
// =============================================================================
//
// Per-symbol candle storage.  Transport (REST polling, WebSocket push) lives
// outside the engine; anything that can produce `Candle` values can feed it.

pub mod candle_buffer;

pub use candle_buffer::{Candle, CandleBuffer, IngestError, IngestOutcome};

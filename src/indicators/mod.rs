// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators the signal engine
// consumes.  Every function is total: insufficient data and numerical edge
// cases come back as `None`, empty series, or a documented fallback value,
// never a panic.

pub mod atr;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod volume_osc;

pub use macd::MacdOutput;

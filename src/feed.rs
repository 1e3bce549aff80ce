// =============================================================================
// Candle Feed — bounded-channel ingestion into the engine
// =============================================================================
//
// The engine is transport-agnostic: anything that can produce `CandleEvent`
// values owns a `Sender` and pushes into the bounded channel.  A single
// ingest loop consumes the channel (one logical writer per symbol), feeds
// the engine, and re-evaluates a symbol only when one of its candles closes.
// Partial updates refresh the buffer and nothing else, so a burst of ticks
// for one candle collapses to the latest value.
//
// Two built-in sources for the demo binary: a JSON-lines replay file and a
// deterministic synthetic walk.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::Engine;
use crate::market_data::Candle;
use crate::signals::Signal;

/// One candle update for one symbol, as carried on the feed channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandleEvent {
    pub symbol: String,
    #[serde(flatten)]
    pub candle: Candle,
}

/// Consume candle events until the channel closes, forwarding signals from
/// every closed-candle evaluation to `signal_tx`.
///
/// Returns when either side of the pipeline hangs up.
pub async fn run_ingest_loop(
    engine: Arc<Engine>,
    mut events: mpsc::Receiver<CandleEvent>,
    signal_tx: mpsc::Sender<Signal>,
) {
    while let Some(event) = events.recv().await {
        let closed = event.candle.is_closed;
        match engine.ingest(&event.symbol, event.candle) {
            Ok(_) if closed => {
                for signal in engine.evaluate(&event.symbol) {
                    if signal_tx.send(signal).await.is_err() {
                        info!("signal consumer gone, stopping ingest loop");
                        return;
                    }
                }
            }
            Ok(_) => {
                debug!(
                    symbol = %event.symbol,
                    price = engine.current_price(&event.symbol),
                    "partial candle update"
                );
            }
            Err(_) => {
                // Already logged by the engine; the stream goes on.
            }
        }
    }
    info!("candle feed drained, ingest loop finished");
}

/// Read candle events from a JSON-lines file, one event per line.
///
/// Blank lines are skipped; a malformed line is logged and skipped rather
/// than aborting the replay.
pub fn replay_events(path: impl AsRef<Path>) -> Result<Vec<CandleEvent>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read replay file {}", path.display()))?;

    let mut events = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<CandleEvent>(line) {
            Ok(event) => events.push(event),
            Err(e) => {
                warn!(
                    path = %path.display(),
                    line = lineno + 1,
                    error = %e,
                    "skipping malformed replay line"
                );
            }
        }
    }

    info!(path = %path.display(), events = events.len(), "replay file loaded");
    Ok(events)
}

/// Generate a deterministic synthetic candle walk per symbol, hourly buckets
/// starting at `start_time`.  Each symbol gets its own phase and the walk
/// plants occasional volume-backed thrusts so the demo produces signals.
pub fn synthetic_events(symbols: &[String], candles_per_symbol: usize, start_time: i64) -> Vec<CandleEvent> {
    const HOUR_MS: i64 = 3_600_000;

    let mut events = Vec::new();
    for (s, symbol) in symbols.iter().enumerate() {
        let mut rng = Lcg::new(0x5EED ^ (s as u64).wrapping_mul(0x9E37_79B9));
        let mut price = 100.0 + 50.0 * s as f64;

        for i in 0..candles_per_symbol {
            let drift = (rng.next_f64() - 0.5) * price * 0.004;
            let thrust = i % 47 == 41;
            let step = if thrust { price * 0.03 } else { drift };

            let open = price;
            let close = price + step;
            let high = open.max(close) + price * 0.002 * rng.next_f64();
            let low = open.min(close) - price * 0.002 * rng.next_f64();
            let volume = if thrust {
                900.0 + 300.0 * rng.next_f64()
            } else {
                80.0 + 40.0 * rng.next_f64()
            };

            events.push(CandleEvent {
                symbol: symbol.clone(),
                candle: Candle {
                    open_time: start_time + i as i64 * HOUR_MS,
                    open,
                    high,
                    low,
                    close,
                    volume,
                    is_closed: true,
                },
            });
            price = close;
        }
    }
    events
}

/// Small linear congruential generator so the synthetic feed is reproducible
/// across runs without pulling in a randomness crate.
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1))
    }

    fn next_f64(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_config::EngineConfig;

    #[test]
    fn candle_event_json_is_flat() {
        let json = r#"{"symbol":"BTCUSDT","open_time":1700000000000,"open":100.0,"high":102.0,"low":99.0,"close":101.0,"volume":12.5,"is_closed":true}"#;
        let event: CandleEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.symbol, "BTCUSDT");
        assert_eq!(event.candle.open_time, 1_700_000_000_000);
        assert!(event.candle.is_closed);

        let back = serde_json::to_value(&event).unwrap();
        assert_eq!(back["close"], 101.0);
        assert_eq!(back["symbol"], "BTCUSDT");
    }

    #[test]
    fn replay_skips_malformed_lines() {
        let path = std::env::temp_dir().join("sentinel_replay_test.jsonl");
        std::fs::write(
            &path,
            concat!(
                r#"{"symbol":"BTCUSDT","open_time":0,"open":1.0,"high":2.0,"low":0.5,"close":1.5,"volume":10.0,"is_closed":true}"#,
                "\n",
                "not json\n",
                "\n",
                r#"{"symbol":"BTCUSDT","open_time":3600000,"open":1.5,"high":2.5,"low":1.0,"close":2.0,"volume":11.0,"is_closed":true}"#,
                "\n",
            ),
        )
        .unwrap();

        let events = replay_events(&path).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].candle.close, 2.0);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn synthetic_walk_is_deterministic_and_valid() {
        let symbols = vec!["AAAUSDT".to_string(), "BBBUSDT".to_string()];
        let a = synthetic_events(&symbols, 100, 0);
        let b = synthetic_events(&symbols, 100, 0);
        assert_eq!(a.len(), 200);
        assert_eq!(a[17].candle.close, b[17].candle.close);

        for event in &a {
            assert!(event.candle.validate().is_ok());
        }
    }

    #[tokio::test]
    async fn ingest_loop_emits_signals_on_closed_candles() {
        let engine = Arc::new(Engine::new(EngineConfig::default()));
        let (event_tx, event_rx) = mpsc::channel(256);
        let (signal_tx, mut signal_rx) = mpsc::channel(256);

        let loop_handle = tokio::spawn(run_ingest_loop(engine, event_rx, signal_tx));

        // Flat warmup, wick candle at the end.
        for i in 0..40i64 {
            event_tx
                .send(CandleEvent {
                    symbol: "BTCUSDT".into(),
                    candle: Candle {
                        open_time: i * 3_600_000,
                        open: 100.0,
                        high: 100.5,
                        low: 99.5,
                        close: 100.0,
                        volume: 100.0,
                        is_closed: true,
                    },
                })
                .await
                .unwrap();
        }
        event_tx
            .send(CandleEvent {
                symbol: "BTCUSDT".into(),
                candle: Candle {
                    open_time: 40 * 3_600_000,
                    open: 100.0,
                    high: 100.5,
                    low: 90.0,
                    close: 100.2,
                    volume: 100.0,
                    is_closed: true,
                },
            })
            .await
            .unwrap();
        drop(event_tx);
        loop_handle.await.unwrap();

        let signal = signal_rx.recv().await.unwrap();
        assert_eq!(signal.symbol, "BTCUSDT");
        assert!(signal.kind().is_wick());
        assert!(signal_rx.recv().await.is_none());
    }
}

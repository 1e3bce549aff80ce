// =============================================================================
// Breakout Sentinel — Main Entry Point
// =============================================================================
//
// Wires a candle source (replay file or synthetic walk) through the bounded
// feed channel into the signal engine and logs every emitted signal.  Live
// transports plug in the same way: own the event sender, push candles.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod engine;
mod engine_config;
mod feed;
mod indicators;
mod market_data;
mod pivots;
mod signals;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::engine::Engine;
use crate::engine_config::EngineConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Breakout Sentinel — starting up");

    let config_path = std::env::var("SENTINEL_CONFIG")
        .unwrap_or_else(|_| "sentinel_config.json".to_string());
    let mut config = EngineConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "failed to load config, using defaults");
        EngineConfig::default()
    });

    if let Ok(symbols) = std::env::var("SENTINEL_SYMBOLS") {
        config.symbols = symbols
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
    }

    info!(
        symbols = ?config.symbols,
        left_bars = config.left_bars,
        right_bars = config.right_bars,
        volume_threshold = config.volume_threshold,
        "engine configured"
    );

    // ── 2. Engine & channels ─────────────────────────────────────────────
    let engine = Arc::new(Engine::new(config.clone()));

    let (event_tx, event_rx) = mpsc::channel(1_024);
    let (signal_tx, mut signal_rx) = mpsc::channel(256);

    tokio::spawn(feed::run_ingest_loop(engine.clone(), event_rx, signal_tx));

    // ── 3. Candle source ─────────────────────────────────────────────────
    let events = match std::env::var("SENTINEL_REPLAY") {
        Ok(path) => feed::replay_events(&path)?,
        Err(_) => {
            info!("no SENTINEL_REPLAY file set, generating a synthetic walk");
            let candles = 240;
            let start =
                chrono::Utc::now().timestamp_millis() - candles as i64 * 3_600_000;
            feed::synthetic_events(&config.symbols, candles, start)
        }
    };

    tokio::spawn(async move {
        for event in events {
            if event_tx.send(event).await.is_err() {
                break;
            }
        }
    });

    // ── 4. Drain signals, with a periodic persistence summary ────────────
    let mut summary = tokio::time::interval(Duration::from_secs(30));
    summary.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            maybe_signal = signal_rx.recv() => match maybe_signal {
                Some(signal) => {
                    info!(
                        symbol = %signal.symbol,
                        kind = %signal.kind(),
                        price = signal.price,
                        level = signal.level(),
                        persistent = signal.is_persistent,
                        at = %format_time(signal.time),
                        "signal"
                    );
                }
                None => {
                    info!("signal stream closed, shutting down");
                    break;
                }
            },
            _ = summary.tick() => {
                let pinned = engine.persistent_signals();
                info!(
                    tracked = engine.tracked_symbols().len(),
                    open_signals = pinned.len(),
                    "engine summary"
                );
            }
        }
    }

    Ok(())
}

/// Render an epoch-millisecond timestamp for log output.
fn format_time(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| ms.to_string())
}

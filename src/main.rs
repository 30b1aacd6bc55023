//! PINGPONG: two-token ping-pong arbitrage bot
//!
//! Entry point. Loads configuration, initialises structured logging,
//! wires the quote venue and executor, and drives the scheduler loop
//! with graceful shutdown.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use pingpong::config::{self, QuoteSource};
use pingpong::control;
use pingpong::engine::cycle::CycleContext;
use pingpong::engine::scheduler::Scheduler;
use pingpong::report;
use pingpong::services::jupiter::JupiterQuoteClient;
use pingpong::services::paper::{PaperExecutor, PaperVenue};
use pingpong::services::{QuoteService, SwapExecutor};
use pingpong::state::{SharedState, TradingState};

const BANNER: &str = r#"
  ____ ___ _   _  ____ ____   ___  _   _  ____
 |  _ \_ _| \ | |/ ___|  _ \ / _ \| \ | |/ ___|
 | |_) | ||  \| | |  _| |_) | | | |  \| | |  _
 |  __/| || |\  | |_| |  __/| |_| | |\  | |_| |
 |_|  |___|_| \_|\____|_|    \___/|_| \_|\____|

  Two-token ping-pong arbitrage bot
  v0.1.0 - paper trading build
"#;

/// Status line cadence, in poll ticks.
const STATUS_EVERY: u64 = 60;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from TOML
    let cfg = config::AppConfig::load("config.toml")?;

    // Initialise structured logging
    init_logging();

    // Print startup banner
    println!("{BANNER}");
    info!(
        mode = %cfg.trading.mode,
        pair = %format!("{}/{}", cfg.pair.token_a.symbol, cfg.pair.token_b.symbol),
        initial_trade_size = %cfg.trading.initial_trade_size,
        min_profit_threshold_pct = %cfg.trading.min_profit_threshold,
        throttle = cfg.scheduler.throttle,
        "PINGPONG starting up"
    );

    // -- Initialise components -------------------------------------------

    let quotes: Arc<dyn QuoteService> = match cfg.venue.quote_source {
        QuoteSource::Paper => {
            info!(
                rate = %cfg.venue.paper.rate_a_to_b,
                spread_pct = %cfg.venue.paper.spread_pct,
                jitter_pct = %cfg.venue.paper.jitter_pct,
                "Using paper quote venue"
            );
            Arc::new(PaperVenue::new(
                cfg.venue.paper.rate_a_to_b,
                cfg.venue.paper.spread_pct,
                cfg.venue.paper.jitter_pct,
            ))
        }
        QuoteSource::Jupiter => {
            info!(url = %cfg.venue.quote_url, "Using Jupiter quote API");
            Arc::new(JupiterQuoteClient::new(
                &cfg.venue.quote_url,
                cfg.venue.request_timeout(),
                cfg.venue.api_key()?,
            )?)
        }
    };

    // Fills always settle on the paper executor; on-chain submission is
    // out of scope for this build.
    let executor: Arc<dyn SwapExecutor> = Arc::new(PaperExecutor);

    let state = SharedState::new(TradingState::new(
        cfg.trading.initial_trade_size,
        cfg.trading.trading_enabled,
        cfg.scheduler.throttle,
    ));

    let mut scheduler = Scheduler::new(CycleContext {
        state: state.clone(),
        quotes,
        executor,
        pair: cfg.pair.pair(),
        trading: Arc::new(cfg.trading.clone()),
    });

    let control_listener = control::spawn_stdin_listener(state.clone());

    // -- Main loop -------------------------------------------------------

    let mut interval = tokio::time::interval(cfg.scheduler.poll_interval());
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        poll_interval_ms = cfg.scheduler.poll_interval_ms,
        "Entering main loop. Ctrl+C to stop; e/r/t/s on stdin for control."
    );

    let mut ticks: u64 = 0;
    loop {
        tokio::select! {
            _ = interval.tick() => {
                scheduler.tick();
                ticks += 1;
                if ticks % STATUS_EVERY == 0 {
                    report::log_status(&state.snapshot());
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    // Let in-flight cycles settle before reporting.
    control_listener.abort();
    scheduler.drain().await;
    report::log_final_summary(&state.snapshot());
    info!("PINGPONG shut down cleanly.");

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("pingpong=info"));

    let json_logging = std::env::var("PINGPONG_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}

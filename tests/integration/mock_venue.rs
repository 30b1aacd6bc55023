//! Mock venue for integration testing.
//!
//! Provides scripted `QuoteService` and `SwapExecutor` implementations
//! with fully deterministic behavior: each call pops the next scripted
//! step, so a test controls every quote and every fill in order, all
//! in-memory with no external dependencies. A held step parks its call
//! on a gate until the test pokes it, which lets concurrent cycles be
//! interleaved in a chosen order.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use tokio::sync::Notify;

use pingpong::config::TradingConfig;
use pingpong::engine::cycle::CycleContext;
use pingpong::services::{QuoteService, SwapExecutor};
use pingpong::state::SharedState;
use pingpong::types::*;

// ---------------------------------------------------------------------------
// Scripted quote source
// ---------------------------------------------------------------------------

enum QuoteStep {
    Out(Decimal),
    HeldOut(Decimal, Arc<Notify>),
    Fail(String),
}

/// Quote source that serves a pre-scripted sequence of outcomes.
#[derive(Default)]
pub struct ScriptedQuoter {
    steps: Mutex<VecDeque<QuoteStep>>,
}

impl ScriptedQuoter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a successful quote with the given output amount.
    pub fn push_out(&self, out: Decimal) {
        self.steps.lock().unwrap().push_back(QuoteStep::Out(out));
    }

    /// Script a successful quote that parks until the returned gate is
    /// poked.
    pub fn push_held_out(&self, out: Decimal) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.steps
            .lock()
            .unwrap()
            .push_back(QuoteStep::HeldOut(out, gate.clone()));
        gate
    }

    /// Script a failed quote.
    pub fn push_fail(&self, msg: &str) {
        self.steps
            .lock()
            .unwrap()
            .push_back(QuoteStep::Fail(msg.to_string()));
    }
}

#[async_trait]
impl QuoteService for ScriptedQuoter {
    async fn fetch_quote(
        &self,
        _pair: &TokenPair,
        _side: Side,
        amount: Decimal,
        _slippage_pct: Decimal,
    ) -> Result<Quote, ServiceError> {
        let step = self.steps.lock().unwrap().pop_front();
        let out = match step {
            Some(QuoteStep::Out(out)) => out,
            Some(QuoteStep::HeldOut(out, gate)) => {
                gate.notified().await;
                out
            }
            Some(QuoteStep::Fail(msg)) => return Err(ServiceError::Quote(msg)),
            None => {
                return Err(ServiceError::Quote("unscripted fetch_quote call".to_string()))
            }
        };
        Ok(Quote {
            in_amount: amount,
            out_amount: out,
            // Fills are scripted separately on the executor.
            out_amount_with_slippage: out,
            route: json!({"venue": "scripted"}),
        })
    }
}

// ---------------------------------------------------------------------------
// Scripted executor
// ---------------------------------------------------------------------------

enum ExecStep {
    Fill(Decimal),
    HeldFill(Decimal, Arc<Notify>),
    Reject(String),
    Fault(String),
}

/// Executor that fills, rejects or faults per script and records every
/// swap it was asked to run.
#[derive(Default)]
pub struct RecordingExecutor {
    steps: Mutex<VecDeque<ExecStep>>,
    executed: Mutex<Vec<(Side, Decimal)>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a successful fill with the given output amount.
    pub fn push_fill(&self, out: Decimal) {
        self.steps.lock().unwrap().push_back(ExecStep::Fill(out));
    }

    /// Script a successful fill that parks until the returned gate is
    /// poked.
    pub fn push_held_fill(&self, out: Decimal) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.steps
            .lock()
            .unwrap()
            .push_back(ExecStep::HeldFill(out, gate.clone()));
        gate
    }

    /// Script a venue-reported failure.
    pub fn push_reject(&self, msg: &str) {
        self.steps
            .lock()
            .unwrap()
            .push_back(ExecStep::Reject(msg.to_string()));
    }

    /// Script an unexpected execution fault.
    pub fn push_fault(&self, msg: &str) {
        self.steps
            .lock()
            .unwrap()
            .push_back(ExecStep::Fault(msg.to_string()));
    }

    /// Every (side, input amount) this executor was asked to swap.
    pub fn executed(&self) -> Vec<(Side, Decimal)> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl SwapExecutor for RecordingExecutor {
    async fn execute_swap(
        &self,
        _pair: &TokenPair,
        side: Side,
        quote: &Quote,
    ) -> Result<SwapOutcome, ServiceError> {
        self.executed.lock().unwrap().push((side, quote.in_amount));

        let step = self.steps.lock().unwrap().pop_front();
        let out = match step {
            Some(ExecStep::Fill(out)) => out,
            Some(ExecStep::HeldFill(out, gate)) => {
                gate.notified().await;
                out
            }
            Some(ExecStep::Reject(msg)) => {
                return Ok(SwapOutcome {
                    input_amount: quote.in_amount,
                    output_amount: Decimal::ZERO,
                    tx_id: None,
                    error: Some(msg),
                })
            }
            Some(ExecStep::Fault(msg)) => return Err(ServiceError::Execution(msg)),
            None => {
                return Err(ServiceError::Execution(
                    "unscripted execute_swap call".to_string(),
                ))
            }
        };
        Ok(SwapOutcome {
            input_amount: quote.in_amount,
            output_amount: out,
            tx_id: Some(format!("scripted-{side}")),
            error: None,
        })
    }
}

// ---------------------------------------------------------------------------
// Wiring helpers
// ---------------------------------------------------------------------------

pub fn make_pair() -> TokenPair {
    TokenPair {
        token_a: TokenInfo {
            symbol: "SOL".to_string(),
            mint: "So11111111111111111111111111111111111111112".to_string(),
            decimals: 9,
        },
        token_b: TokenInfo {
            symbol: "USDC".to_string(),
            mint: "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v".to_string(),
            decimals: 6,
        },
    }
}

/// Cycle context over the scripted venue with a 0.5% profit threshold.
pub fn make_ctx(
    state: &SharedState,
    quoter: Arc<ScriptedQuoter>,
    executor: Arc<RecordingExecutor>,
) -> CycleContext {
    CycleContext {
        state: state.clone(),
        quotes: quoter,
        executor,
        pair: make_pair(),
        trading: Arc::new(TradingConfig {
            mode: TradingMode::PingPong,
            min_profit_threshold: dec!(0.5),
            initial_trade_size: dec!(100),
            trading_enabled: true,
            slippage_pct: dec!(1),
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_quoter_pops_in_order() {
        let quoter = ScriptedQuoter::new();
        quoter.push_out(dec!(110));
        quoter.push_fail("down for maintenance");

        let pair = make_pair();
        let quote = quoter
            .fetch_quote(&pair, Side::Buy, dec!(100), dec!(1))
            .await
            .unwrap();
        assert_eq!(quote.in_amount, dec!(100));
        assert_eq!(quote.out_amount, dec!(110));

        let err = quoter.fetch_quote(&pair, Side::Buy, dec!(100), dec!(1)).await;
        assert!(matches!(err, Err(ServiceError::Quote(_))));

        // Script exhausted.
        let err = quoter.fetch_quote(&pair, Side::Buy, dec!(100), dec!(1)).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_recording_executor_tracks_swaps() {
        let executor = RecordingExecutor::new();
        executor.push_fill(dec!(108));
        executor.push_reject("slippage exceeded");

        let pair = make_pair();
        let quote = Quote {
            in_amount: dec!(100),
            out_amount: dec!(110),
            out_amount_with_slippage: dec!(110),
            route: json!({}),
        };

        let ok = executor.execute_swap(&pair, Side::Buy, &quote).await.unwrap();
        assert_eq!(ok.output_amount, dec!(108));
        assert!(!ok.is_failure());

        let rejected = executor.execute_swap(&pair, Side::Sell, &quote).await.unwrap();
        assert!(rejected.is_failure());
        assert_eq!(rejected.error.as_deref(), Some("slippage exceeded"));

        let calls = executor.executed();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], (Side::Buy, dec!(100)));
        assert_eq!(calls[1], (Side::Sell, dec!(100)));
    }

    #[tokio::test]
    async fn test_held_quote_parks_until_poked() {
        let quoter = Arc::new(ScriptedQuoter::new());
        let gate = quoter.push_held_out(dec!(110));

        let call = {
            let quoter = quoter.clone();
            tokio::spawn(async move {
                quoter
                    .fetch_quote(&make_pair(), Side::Buy, dec!(100), dec!(1))
                    .await
            })
        };
        tokio::task::yield_now().await;
        assert!(!call.is_finished());

        gate.notify_one();
        let quote = call.await.unwrap().unwrap();
        assert_eq!(quote.out_amount, dec!(110));
    }

    #[tokio::test]
    async fn test_recording_executor_faults_on_script() {
        let executor = RecordingExecutor::new();
        executor.push_fault("connection reset");

        let quote = Quote {
            in_amount: dec!(100),
            out_amount: dec!(110),
            out_amount_with_slippage: dec!(110),
            route: json!({}),
        };
        let err = executor.execute_swap(&make_pair(), Side::Buy, &quote).await;
        assert!(matches!(err, Err(ServiceError::Execution(_))));
    }
}

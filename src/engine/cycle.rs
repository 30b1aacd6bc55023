//! One trade cycle: quote the active side, gate on profitability, swap,
//! settle.
//!
//! Cycles run as detached tasks. Registration happens in the scheduler
//! before spawn; everything after that point is this module's problem,
//! including making sure the cycle deregisters itself and never wedges
//! the execution lock, whatever path it exits through.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use crate::config::TradingConfig;
use crate::engine::outcome;
use crate::services::{QuoteService, SwapExecutor};
use crate::state::{Decision, SharedState};
use crate::types::{profit_pct, ServiceError, TokenPair, TradeEntry};

/// Everything a cycle needs, cheap to clone per spawn.
#[derive(Clone)]
pub struct CycleContext {
    pub state: SharedState,
    pub quotes: Arc<dyn QuoteService>,
    pub executor: Arc<dyn SwapExecutor>,
    pub pair: TokenPair,
    pub trading: Arc<TradingConfig>,
}

/// Scoped cleanup for a registered cycle. Dropping it deregisters the
/// iteration and, if the cycle died between acquiring the execution lock
/// and settling, releases that lock too.
struct CycleGuard {
    state: SharedState,
    iteration: u64,
    holds_execution: bool,
}

impl CycleGuard {
    fn new(state: SharedState, iteration: u64) -> Self {
        Self {
            state,
            iteration,
            holds_execution: false,
        }
    }
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        if self.holds_execution {
            state.release_execution();
        }
        state.finish_cycle(self.iteration);
    }
}

/// Entry point for a spawned cycle. The iteration must already be
/// registered in the in-flight queue.
pub async fn run_trade_cycle(ctx: CycleContext, iteration: u64, bootstrap: bool) {
    let mut guard = CycleGuard::new(ctx.state.clone(), iteration);
    if let Err(err) = probe_and_trade(&ctx, &mut guard, bootstrap).await {
        ctx.state.lock().mark_probe_failed(iteration);
        error!(iteration, error = %err, "Trade cycle aborted by unexpected fault");
    }
}

async fn probe_and_trade(
    ctx: &CycleContext,
    guard: &mut CycleGuard,
    bootstrap: bool,
) -> Result<(), ServiceError> {
    let iteration = guard.iteration;
    let started = Utc::now();

    // Sizing reads happen in one locked step: trade the full balance of
    // the side's input leg, measure against the last balance of its
    // output leg.
    let (side, amount, base_amount) = {
        let state = ctx.state.lock();
        let side = state.side;
        (
            side,
            state.balances.get(side.input_leg()),
            state.last_balances.get(side.output_leg()),
        )
    };
    let input = ctx.pair.input_token(side);
    let output = ctx.pair.output_token(side);

    let quote_started = Instant::now();
    let quote = match ctx
        .quotes
        .fetch_quote(&ctx.pair, side, amount, ctx.trading.slippage_pct)
        .await
    {
        Ok(quote) => quote,
        Err(err) => {
            ctx.state.lock().mark_probe_failed(iteration);
            warn!(iteration, side = %side, error = %err, "Route quote failed");
            return Ok(());
        }
    };
    let quote_ms = quote_started.elapsed().as_millis() as u64;

    // The first trade has no baseline to beat; it exists to acquire one.
    let simulated_profit = if bootstrap {
        Decimal::ZERO
    } else {
        profit_pct(base_amount, quote.out_amount)
    };

    let decision = {
        let mut state = ctx.state.lock();
        state.mark_quoted(iteration);
        state.record_spotted_profit(side, simulated_profit);
        state.decide_execution(bootstrap, simulated_profit, ctx.trading.min_profit_threshold)
    };

    info!(
        iteration,
        side = %side,
        input = %input.symbol,
        output = %output.symbol,
        in_amount = %amount,
        quote_out = %quote.out_amount,
        simulated_profit_pct = %simulated_profit,
        quote_ms,
        "Route quoted"
    );

    let trigger = match decision {
        Decision::Execute(trigger) => trigger,
        Decision::Skip(reason) => {
            debug!(iteration, reason = %reason, "Execution skipped");
            return Ok(());
        }
    };
    guard.holds_execution = true;

    info!(iteration, side = %side, trigger = %trigger, "Executing swap");

    let mut entry = TradeEntry {
        timestamp: started,
        side,
        input_token: input.symbol.clone(),
        output_token: output.symbol.clone(),
        in_amount: quote.in_amount,
        expected_out_amount: quote.out_amount,
        expected_profit: simulated_profit,
        out_amount: Decimal::ZERO,
        profit: Decimal::ZERO,
        latency_ms: 0,
        error: None,
    };

    let swap_started = Instant::now();
    let swap_outcome = ctx.executor.execute_swap(&ctx.pair, side, &quote).await?;

    entry.latency_ms = swap_started.elapsed().as_millis() as u64;
    entry.out_amount = swap_outcome.output_amount;
    entry.error = swap_outcome.error.clone();

    {
        let mut state = ctx.state.lock();
        if swap_outcome.is_failure() {
            outcome::apply_failure(&mut state, side, &swap_outcome, entry);
        } else {
            outcome::apply_success(&mut state, side, &swap_outcome, entry);
        }
        state.release_execution();
    }
    guard.holds_execution = false;

    Ok(())
}

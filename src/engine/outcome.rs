//! Swap settlement.
//!
//! Applies a finished swap to the trading state in one locked step:
//! counters, balance rollover, realized profit, history, trade-side
//! toggle. The caller holds the state lock for the whole settlement, so
//! observers never see a half-applied result.

use tracing::{info, warn};

use crate::state::TradingState;
use crate::types::{profit_pct, Side, SwapOutcome, TradeEntry};

/// Settle a successful swap.
///
/// Balance bookkeeping touches the side's output leg: the previous
/// balance rolls into `last_balances` (the baseline the next opposite
/// swap is measured against) and the actual fill becomes the new
/// balance. Realized profit lands on the side's input leg. On the very
/// first trade the fill itself seeds the baseline, so realized profit
/// is zero by construction.
pub fn apply_success(
    state: &mut TradingState,
    side: Side,
    outcome: &SwapOutcome,
    mut entry: TradeEntry,
) {
    let first_trade = !state.first_trade_done;
    let out_leg = side.output_leg();

    // A revert swap is one-shot: once it lands, trading stops until the
    // operator re-enables it.
    if state.flags.revert_requested {
        state.flags.revert_requested = false;
        state.flags.trading_enabled = false;
        info!("Revert swap landed, trading disabled");
    }

    state.counters.side_mut(side).success += 1;

    let baseline = if first_trade {
        outcome.output_amount
    } else {
        state.balances.get(out_leg)
    };
    state.last_balances.set(out_leg, baseline);
    state.balances.set(out_leg, outcome.output_amount);

    let realized = profit_pct(baseline, outcome.output_amount);
    state.profit.set(side.input_leg(), realized);

    // The quote promised an input; the fill reports what actually went in.
    entry.in_amount = outcome.input_amount;
    entry.out_amount = outcome.output_amount;
    entry.profit = realized;
    state.history.push(entry);

    if first_trade {
        state.first_trade_done = true;
        state.first_trade_queued = false;
    }

    state.side = state.side.opposite();

    info!(
        side = %side,
        tx_id = outcome.tx_id.as_deref().unwrap_or("-"),
        in_amount = %outcome.input_amount,
        out_amount = %outcome.output_amount,
        realized_profit_pct = %realized,
        "Swap settled"
    );
}

/// Settle a swap the venue reported as failed: bump the side's failure
/// counter and append the entry. Balances, flags and the trade side stay
/// untouched, so a failed first trade simply runs again.
pub fn apply_failure(
    state: &mut TradingState,
    side: Side,
    outcome: &SwapOutcome,
    entry: TradeEntry,
) {
    state.counters.side_mut(side).fail += 1;

    warn!(
        side = %side,
        tx_id = outcome.tx_id.as_deref().unwrap_or("-"),
        error = entry.error.as_deref().unwrap_or("unknown"),
        "Swap failed"
    );

    state.history.push(entry);
}

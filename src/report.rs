//! Status and session reporting over structured logs.

use tracing::info;

use crate::state::StateSnapshot;

pub(crate) fn format_uptime(secs: i64) -> String {
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    format!("{h}h {m:02}m {s:02}s")
}

/// One-line operational status, logged periodically and on demand.
pub fn log_status(snapshot: &StateSnapshot) {
    info!(
        uptime = %format_uptime(snapshot.uptime_secs),
        iteration = snapshot.iteration,
        rate_per_min = snapshot.iterations_per_minute,
        side = %snapshot.side,
        queue = %format!("{}/{}", snapshot.queue_depth, snapshot.throttle),
        executing = snapshot.executing,
        trading_enabled = snapshot.flags.trading_enabled,
        balance_a = %snapshot.balances.token_a,
        balance_b = %snapshot.balances.token_b,
        profit_a_pct = %snapshot.profit.token_a,
        profit_b_pct = %snapshot.profit.token_b,
        best_buy_pct = %snapshot.max_profit_spotted.buy,
        best_sell_pct = %snapshot.max_profit_spotted.sell,
        swaps_ok = snapshot.counters.total_success(),
        swaps_failed = snapshot.counters.total_fail(),
        "Status"
    );
}

/// End-of-session wrap-up: the status line plus the trailing trades.
pub fn log_final_summary(snapshot: &StateSnapshot) {
    info!(
        uptime = %format_uptime(snapshot.uptime_secs),
        iterations = snapshot.iteration,
        trades = snapshot.history_len,
        swaps_ok = snapshot.counters.total_success(),
        swaps_failed = snapshot.counters.total_fail(),
        profit_a_pct = %snapshot.profit.token_a,
        profit_b_pct = %snapshot.profit.token_b,
        "Session summary"
    );

    for entry in &snapshot.recent_trades {
        info!(
            at = %entry.timestamp.format("%H:%M:%S"),
            side = %entry.side,
            pair = %format!("{}->{}", entry.input_token, entry.output_token),
            in_amount = %entry.in_amount,
            out_amount = %entry.out_amount,
            profit_pct = %entry.profit,
            latency_ms = entry.latency_ms,
            error = entry.error.as_deref().unwrap_or("-"),
            "Trade"
        );
    }
}

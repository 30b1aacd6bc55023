//! Shared trading state.
//!
//! Single-writer discipline: one `TradingState` lives behind a mutex in
//! `SharedState`; every mutation happens inside a short critical section
//! and never across an await point. The scheduler and all trade cycles
//! operate through the same handle, so multi-step updates (balance
//! rollover, counter bumps, side toggle) are atomic units relative to
//! each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::types::{LegAmounts, Side, SideAmounts, TradeCounters, TradeEntry};

/// How many trailing history entries a snapshot carries.
const SNAPSHOT_HISTORY_TAIL: usize = 5;

/// Width of the rolling iterations-per-minute window.
const RATE_WINDOW: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// Probe status and control flags
// ---------------------------------------------------------------------------

/// Lifecycle of an in-flight route probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Pending,
    Quoted,
    Failed,
}

/// Operator intents. Set asynchronously by the control intake, read and
/// consumed by trade cycles at their decision points only.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ControlFlags {
    pub force_execute: bool,
    pub revert_requested: bool,
    pub trading_enabled: bool,
}

// ---------------------------------------------------------------------------
// Execution decision
// ---------------------------------------------------------------------------

/// What convinced the decision gate to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionTrigger {
    Bootstrap,
    Forced,
    Revert,
    Threshold,
}

impl std::fmt::Display for ExecutionTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionTrigger::Bootstrap => write!(f, "bootstrap"),
            ExecutionTrigger::Forced => write!(f, "forced"),
            ExecutionTrigger::Revert => write!(f, "revert"),
            ExecutionTrigger::Threshold => write!(f, "threshold"),
        }
    }
}

/// Why the decision gate declined to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    ExecutionInProgress,
    BelowThreshold,
    TradingDisabled,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::ExecutionInProgress => write!(f, "execution in progress"),
            SkipReason::BelowThreshold => write!(f, "below profit threshold"),
            SkipReason::TradingDisabled => write!(f, "trading disabled"),
        }
    }
}

/// Outcome of the per-cycle execution gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Execute(ExecutionTrigger),
    Skip(SkipReason),
}

// ---------------------------------------------------------------------------
// Trading state
// ---------------------------------------------------------------------------

/// Process-wide mutable trading record. All fields are reachable only
/// through `SharedState::lock`.
#[derive(Debug)]
pub struct TradingState {
    /// Last allocated iteration id (monotonic).
    pub iteration: u64,
    pub side: Side,
    pub first_trade_done: bool,
    pub first_trade_queued: bool,
    /// Outstanding cycles by iteration id. Entries leave the map only when
    /// a cycle reaches a terminal outcome.
    pub in_flight: HashMap<u64, ProbeStatus>,
    /// Maximum concurrent probes (the bootstrap cycle runs alone anyway).
    pub throttle: usize,
    /// Mutual-exclusion gate over the execution call.
    pub executing: bool,
    pub balances: LegAmounts,
    pub last_balances: LegAmounts,
    pub profit: LegAmounts,
    pub max_profit_spotted: SideAmounts,
    pub counters: TradeCounters,
    pub history: Vec<TradeEntry>,
    pub flags: ControlFlags,
    pub started_at: DateTime<Utc>,
    pub iterations_per_minute: u32,
    pub rate_window_start: Instant,
    pub rate_window_count: u32,
}

impl TradingState {
    /// Fresh state: the initial trade size seeds both the balance and the
    /// last balance of token A, so the first sell leg has a baseline.
    pub fn new(initial_trade_size: Decimal, trading_enabled: bool, throttle: usize) -> Self {
        let mut balances = LegAmounts::default();
        balances.set(Side::Buy.input_leg(), initial_trade_size);
        Self {
            iteration: 0,
            side: Side::Buy,
            first_trade_done: false,
            first_trade_queued: false,
            in_flight: HashMap::new(),
            throttle,
            executing: false,
            balances,
            last_balances: balances,
            profit: LegAmounts::default(),
            max_profit_spotted: SideAmounts::default(),
            counters: TradeCounters::default(),
            history: Vec::new(),
            flags: ControlFlags {
                force_execute: false,
                revert_requested: false,
                trading_enabled,
            },
            started_at: Utc::now(),
            iterations_per_minute: 0,
            rate_window_start: Instant::now(),
            rate_window_count: 0,
        }
    }

    /// Allocate the next iteration id and register it as pending. Called
    /// under the same lock as the scheduler's launch decision, so the
    /// throttle check and the registration cannot be interleaved.
    pub fn begin_cycle(&mut self, bootstrap: bool) -> u64 {
        self.iteration += 1;
        self.in_flight.insert(self.iteration, ProbeStatus::Pending);
        if bootstrap {
            self.first_trade_queued = true;
        }
        self.tick_rate_window();
        self.iteration
    }

    pub fn mark_quoted(&mut self, iteration: u64) {
        if let Some(status) = self.in_flight.get_mut(&iteration) {
            *status = ProbeStatus::Quoted;
        }
    }

    pub fn mark_probe_failed(&mut self, iteration: u64) {
        if let Some(status) = self.in_flight.get_mut(&iteration) {
            *status = ProbeStatus::Failed;
        }
    }

    /// Deregister a cycle. Safe to call for an already-removed id.
    pub fn finish_cycle(&mut self, iteration: u64) {
        self.in_flight.remove(&iteration);
    }

    pub fn record_spotted_profit(&mut self, side: Side, simulated_profit: Decimal) {
        if simulated_profit > self.max_profit_spotted.get(side) {
            self.max_profit_spotted.set(side, simulated_profit);
        }
    }

    /// The execution gate. Reads and consumes control flags, and acquires
    /// the `executing` lock when the answer is yes, all in one step; a
    /// concurrent cycle can never squeeze between decision and acquisition.
    ///
    /// `force_execute` is a one-shot: it is consumed as soon as the
    /// opportunity gate reads it true, even if trading turns out to be
    /// disabled. `revert_requested` survives until a successful execution
    /// consumes it.
    pub fn decide_execution(
        &mut self,
        bootstrap: bool,
        simulated_profit: Decimal,
        min_profit_threshold: Decimal,
    ) -> Decision {
        if self.executing {
            return Decision::Skip(SkipReason::ExecutionInProgress);
        }

        let forced = self.flags.force_execute;
        if forced {
            self.flags.force_execute = false;
        }
        let revert = self.flags.revert_requested;

        let opportunity =
            bootstrap || forced || revert || simulated_profit >= min_profit_threshold;
        if !opportunity {
            return Decision::Skip(SkipReason::BelowThreshold);
        }
        if !(self.flags.trading_enabled || revert) {
            return Decision::Skip(SkipReason::TradingDisabled);
        }

        self.executing = true;
        let trigger = if bootstrap {
            ExecutionTrigger::Bootstrap
        } else if forced {
            ExecutionTrigger::Forced
        } else if revert {
            ExecutionTrigger::Revert
        } else {
            ExecutionTrigger::Threshold
        };
        Decision::Execute(trigger)
    }

    pub fn release_execution(&mut self) {
        self.executing = false;
    }

    /// Rolling launches-per-minute gauge. The tick that closes a window
    /// publishes the previous count and starts the next window.
    fn tick_rate_window(&mut self) {
        if self.rate_window_start.elapsed() >= RATE_WINDOW {
            self.iterations_per_minute = self.rate_window_count;
            self.rate_window_start = Instant::now();
            self.rate_window_count = 0;
        } else {
            self.rate_window_count += 1;
        }
    }

    /// Read-only copy for presentation. Cheap enough to take under the
    /// lock; history is trimmed to a short tail.
    pub fn snapshot(&self) -> StateSnapshot {
        let tail_start = self.history.len().saturating_sub(SNAPSHOT_HISTORY_TAIL);
        StateSnapshot {
            timestamp: Utc::now(),
            uptime_secs: (Utc::now() - self.started_at).num_seconds(),
            iteration: self.iteration,
            iterations_per_minute: self.iterations_per_minute,
            side: self.side,
            first_trade_done: self.first_trade_done,
            executing: self.executing,
            flags: self.flags,
            queue_depth: self.in_flight.len(),
            throttle: self.throttle,
            balances: self.balances,
            last_balances: self.last_balances,
            profit: self.profit,
            max_profit_spotted: self.max_profit_spotted,
            counters: self.counters,
            history_len: self.history.len(),
            recent_trades: self.history[tail_start..].to_vec(),
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Point-in-time view of the trading state, detached from the lock.
#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    pub timestamp: DateTime<Utc>,
    pub uptime_secs: i64,
    pub iteration: u64,
    pub iterations_per_minute: u32,
    pub side: Side,
    pub first_trade_done: bool,
    pub executing: bool,
    pub flags: ControlFlags,
    pub queue_depth: usize,
    pub throttle: usize,
    pub balances: LegAmounts,
    pub last_balances: LegAmounts,
    pub profit: LegAmounts,
    pub max_profit_spotted: SideAmounts,
    pub counters: TradeCounters,
    pub history_len: usize,
    pub recent_trades: Vec<TradeEntry>,
}

// ---------------------------------------------------------------------------
// Shared handle
// ---------------------------------------------------------------------------

/// Cloneable handle over the single `TradingState`. The control setters
/// are the only mutation surface exposed outside the engine, and they
/// touch flags exclusively, never numeric trading state.
#[derive(Debug, Clone)]
pub struct SharedState {
    inner: Arc<Mutex<TradingState>>,
}

impl SharedState {
    pub fn new(state: TradingState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    /// Acquire the state lock. A poisoned lock (a panicked cycle task) is
    /// recovered rather than propagated; the state itself is never left
    /// mid-update since critical sections do not span await points.
    pub fn lock(&self) -> MutexGuard<'_, TradingState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> StateSnapshot {
        self.lock().snapshot()
    }

    pub fn request_force_execute(&self) {
        self.lock().flags.force_execute = true;
    }

    pub fn request_revert(&self) {
        self.lock().flags.revert_requested = true;
    }

    pub fn set_trading_enabled(&self, enabled: bool) {
        self.lock().flags.trading_enabled = enabled;
    }

    /// Flip `trading_enabled`; returns the new value.
    pub fn toggle_trading(&self) -> bool {
        let mut state = self.lock();
        state.flags.trading_enabled = !state.flags.trading_enabled;
        state.flags.trading_enabled
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

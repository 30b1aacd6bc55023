//! Launch policy for trade cycles.
//!
//! Driven by the main poll loop: each tick makes one launch decision
//! against the shared state and returns immediately; cycles run as
//! detached tasks and are never awaited here. The decision and the
//! queue registration happen under one lock acquisition, so two ticks
//! can never both claim the same queue slot.

use futures::future::join_all;
use futures::FutureExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::engine::cycle::{run_trade_cycle, CycleContext};
use crate::types::TradingMode;

/// What a poll tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickAction {
    Launched { iteration: u64, bootstrap: bool },
    Idle(IdleReason),
}

/// Why a poll tick launched nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleReason {
    /// A swap is mid-flight; nothing launches until it settles.
    Executing,
    /// The first trade is still outstanding.
    AwaitingFirstTrade,
    /// The in-flight queue is at the throttle limit.
    Throttled,
    /// The configured trading mode does not launch steady-state cycles.
    ModeInactive,
}

impl std::fmt::Display for IdleReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdleReason::Executing => write!(f, "execution in progress"),
            IdleReason::AwaitingFirstTrade => write!(f, "first trade outstanding"),
            IdleReason::Throttled => write!(f, "throttled"),
            IdleReason::ModeInactive => write!(f, "mode inactive"),
        }
    }
}

pub struct Scheduler {
    ctx: CycleContext,
    handles: Vec<JoinHandle<()>>,
}

impl Scheduler {
    pub fn new(ctx: CycleContext) -> Self {
        Self {
            ctx,
            handles: Vec::new(),
        }
    }

    /// One poll tick. The first trade launches alone, regardless of
    /// mode, and repeats until it lands; after that, ping-pong cycles
    /// launch whenever the queue has room.
    pub fn tick(&mut self) -> TickAction {
        self.reap_finished();

        let mut state = self.ctx.state.lock();

        if state.executing {
            return self.idle(IdleReason::Executing);
        }

        if !state.first_trade_done {
            if state.in_flight.is_empty() {
                let iteration = state.begin_cycle(true);
                drop(state);
                self.spawn_cycle(iteration, true);
                return TickAction::Launched {
                    iteration,
                    bootstrap: true,
                };
            }
            return self.idle(IdleReason::AwaitingFirstTrade);
        }

        if state.first_trade_queued {
            return self.idle(IdleReason::AwaitingFirstTrade);
        }
        if state.in_flight.len() >= state.throttle {
            return self.idle(IdleReason::Throttled);
        }
        if self.ctx.trading.mode != TradingMode::PingPong {
            return self.idle(IdleReason::ModeInactive);
        }

        let iteration = state.begin_cycle(false);
        drop(state);
        self.spawn_cycle(iteration, false);
        TickAction::Launched {
            iteration,
            bootstrap: false,
        }
    }

    fn idle(&self, reason: IdleReason) -> TickAction {
        debug!(reason = %reason, "Tick idle");
        TickAction::Idle(reason)
    }

    fn spawn_cycle(&mut self, iteration: u64, bootstrap: bool) {
        debug!(iteration, bootstrap, "Launching trade cycle");
        let ctx = self.ctx.clone();
        self.handles
            .push(tokio::spawn(run_trade_cycle(ctx, iteration, bootstrap)));
    }

    /// Drop handles of finished cycles, surfacing any panics they died
    /// with. The state itself is already consistent: the cycle guard
    /// runs during unwind.
    fn reap_finished(&mut self) {
        self.handles.retain_mut(|handle| {
            if !handle.is_finished() {
                return true;
            }
            if let Some(Err(err)) = (&mut *handle).now_or_never() {
                if err.is_panic() {
                    error!(error = %err, "Trade cycle task panicked");
                }
            }
            false
        });
    }

    /// Wait for every outstanding cycle to finish. Called on shutdown so
    /// no half-done swap is abandoned.
    pub async fn drain(&mut self) {
        let handles = std::mem::take(&mut self.handles);
        if handles.is_empty() {
            return;
        }
        info!(pending = handles.len(), "Draining in-flight trade cycles");
        for result in join_all(handles).await {
            if let Err(err) = result {
                if err.is_panic() {
                    error!(error = %err, "Trade cycle task panicked");
                }
            }
        }
    }
}

//! Operator control intake.
//!
//! Reads single-letter commands from stdin and translates them into
//! control-flag writes on the shared state. Trade cycles pick the flags
//! up at their own decision points; nothing here touches balances,
//! counters or history.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::report;
use crate::state::SharedState;

/// An operator intent, one letter on stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `e`: execute the next quoted swap regardless of profit.
    ForceExecute,
    /// `r`: swap back to the other side at the next opportunity, then
    /// disable trading.
    RevertBack,
    /// `t`: flip the trading-enabled flag.
    ToggleTrading,
    /// `s`: log a state snapshot.
    Status,
}

pub fn parse_command(line: &str) -> Option<Command> {
    match line.trim().to_ascii_lowercase().as_str() {
        "e" | "force" => Some(Command::ForceExecute),
        "r" | "revert" => Some(Command::RevertBack),
        "t" | "toggle" => Some(Command::ToggleTrading),
        "s" | "status" => Some(Command::Status),
        _ => None,
    }
}

pub fn apply_command(command: Command, state: &SharedState) {
    match command {
        Command::ForceExecute => {
            state.request_force_execute();
            info!("Force execute requested, next quoted swap fires regardless of profit");
        }
        Command::RevertBack => {
            state.request_revert();
            info!("Revert requested, the next swap goes back and disables trading");
        }
        Command::ToggleTrading => {
            let enabled = state.toggle_trading();
            info!(enabled, "Trading toggled");
        }
        Command::Status => {
            report::log_status(&state.snapshot());
        }
    }
}

fn handle_line(line: &str, state: &SharedState) {
    match parse_command(line) {
        Some(command) => apply_command(command, state),
        None if line.trim().is_empty() => {}
        None => info!(input = line.trim(), "Unknown command, use e, r, t or s"),
    }
}

/// Background task that feeds stdin lines into the command handler.
/// Exits quietly when stdin closes (e.g. running under a supervisor).
pub fn spawn_stdin_listener(state: SharedState) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => handle_line(&line, &state),
                Ok(None) => break,
                Err(err) => {
                    warn!(error = %err, "Control input unavailable");
                    break;
                }
            }
        }
        debug!("Control listener stopped");
    })
}

//! Core domain types: trade sides, token pair, quotes, trade records,
//! counters, and the shared profit contract.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Sides and legs
// ---------------------------------------------------------------------------

/// Which leg of the ping-pong is next. Buy trades A into B, Sell trades
/// B back into A. The side toggles only after a successful execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(&self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Token spent by this side.
    pub fn input_leg(&self) -> Leg {
        match self {
            Side::Buy => Leg::TokenA,
            Side::Sell => Leg::TokenB,
        }
    }

    /// Token received by this side.
    pub fn output_leg(&self) -> Leg {
        match self {
            Side::Buy => Leg::TokenB,
            Side::Sell => Leg::TokenA,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// One of the two tokens of the traded pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leg {
    TokenA,
    TokenB,
}

/// Strategy selector. Only ping-pong launches post-bootstrap cycles;
/// other values are accepted in config but leave the scheduler idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradingMode {
    PingPong,
    Arb,
}

impl std::fmt::Display for TradingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradingMode::PingPong => write!(f, "pingpong"),
            TradingMode::Arb => write!(f, "arb"),
        }
    }
}

// ---------------------------------------------------------------------------
// Token pair
// ---------------------------------------------------------------------------

/// A tradeable token: display symbol, mint address, and on-chain decimals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub symbol: String,
    pub mint: String,
    pub decimals: u32,
}

/// The fixed pair the bot alternates between.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub token_a: TokenInfo,
    pub token_b: TokenInfo,
}

impl TokenPair {
    pub fn token(&self, leg: Leg) -> &TokenInfo {
        match leg {
            Leg::TokenA => &self.token_a,
            Leg::TokenB => &self.token_b,
        }
    }

    pub fn input_token(&self, side: Side) -> &TokenInfo {
        self.token(side.input_leg())
    }

    pub fn output_token(&self, side: Side) -> &TokenInfo {
        self.token(side.output_leg())
    }
}

// ---------------------------------------------------------------------------
// Quotes and fills
// ---------------------------------------------------------------------------

/// A priced trade proposal from the quote service. `route` is the venue's
/// raw payload and is handed to the execution service verbatim.
#[derive(Debug, Clone)]
pub struct Quote {
    pub in_amount: Decimal,
    pub out_amount: Decimal,
    pub out_amount_with_slippage: Decimal,
    pub route: serde_json::Value,
}

/// Result reported by the execution service. A populated `error` means the
/// venue accepted the call but the swap itself failed.
#[derive(Debug, Clone)]
pub struct SwapOutcome {
    pub input_amount: Decimal,
    pub output_amount: Decimal,
    pub tx_id: Option<String>,
    pub error: Option<String>,
}

impl SwapOutcome {
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

// ---------------------------------------------------------------------------
// Trade history
// ---------------------------------------------------------------------------

/// One executed trade attempt, successful or failed. Immutable once
/// appended to history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeEntry {
    pub timestamp: DateTime<Utc>,
    pub side: Side,
    pub input_token: String,
    pub output_token: String,
    pub in_amount: Decimal,
    pub expected_out_amount: Decimal,
    pub expected_profit: Decimal,
    pub out_amount: Decimal,
    pub profit: Decimal,
    pub latency_ms: u64,
    pub error: Option<String>,
}

impl TradeEntry {
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

// ---------------------------------------------------------------------------
// Running tallies
// ---------------------------------------------------------------------------

/// Success/failure counts for one side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideCounters {
    pub success: u64,
    pub fail: u64,
}

/// Per-side trade counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeCounters {
    pub buy: SideCounters,
    pub sell: SideCounters,
}

impl TradeCounters {
    pub fn side(&self, side: Side) -> &SideCounters {
        match side {
            Side::Buy => &self.buy,
            Side::Sell => &self.sell,
        }
    }

    pub fn side_mut(&mut self, side: Side) -> &mut SideCounters {
        match side {
            Side::Buy => &mut self.buy,
            Side::Sell => &mut self.sell,
        }
    }

    pub fn total_success(&self) -> u64 {
        self.buy.success + self.sell.success
    }

    pub fn total_fail(&self) -> u64 {
        self.buy.fail + self.sell.fail
    }
}

/// A Decimal per token leg (balances, last balances, recorded profit).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegAmounts {
    pub token_a: Decimal,
    pub token_b: Decimal,
}

impl LegAmounts {
    pub fn get(&self, leg: Leg) -> Decimal {
        match leg {
            Leg::TokenA => self.token_a,
            Leg::TokenB => self.token_b,
        }
    }

    pub fn set(&mut self, leg: Leg, value: Decimal) {
        match leg {
            Leg::TokenA => self.token_a = value,
            Leg::TokenB => self.token_b = value,
        }
    }
}

/// A Decimal per trade side (max profit spotted).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideAmounts {
    pub buy: Decimal,
    pub sell: Decimal,
}

impl SideAmounts {
    pub fn get(&self, side: Side) -> Decimal {
        match side {
            Side::Buy => self.buy,
            Side::Sell => self.sell,
        }
    }

    pub fn set(&mut self, side: Side, value: Decimal) {
        match side {
            Side::Buy => self.buy = value,
            Side::Sell => self.sell = value,
        }
    }
}

// ---------------------------------------------------------------------------
// Profit contract
// ---------------------------------------------------------------------------

/// Percentage gained by `result` over `base`. A zero base has no baseline
/// to compare against and yields zero rather than dividing by it.
pub fn profit_pct(base: Decimal, result: Decimal) -> Decimal {
    if base.is_zero() {
        return Decimal::ZERO;
    }
    (result - base) / base * dec!(100)
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Faults raised by the quote and execution services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("quote request failed: {0}")]
    Quote(String),

    #[error("no viable route for {input} -> {output}")]
    NoRoute { input: String, output: String },

    #[error("swap execution fault: {0}")]
    Execution(String),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed venue response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("amount out of range: {0}")]
    Amount(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

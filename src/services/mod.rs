//! Venue-facing service traits.
//!
//! Trade cycles talk to the outside world through these two seams only,
//! so quoting and execution back ends can be swapped (live aggregator,
//! paper venue, scripted test doubles) without touching the engine.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use rust_decimal::Decimal;

use crate::types::{Quote, ServiceError, Side, SwapOutcome, TokenPair};

pub mod jupiter;
pub mod paper;

/// Produces a route quote for one side of the configured pair.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait QuoteService: Send + Sync {
    /// Quote swapping `amount` of the side's input token into its output
    /// token. `slippage_pct` is the tolerance the venue should bake into
    /// the guaranteed-minimum figure.
    async fn fetch_quote(
        &self,
        pair: &TokenPair,
        side: Side,
        amount: Decimal,
        slippage_pct: Decimal,
    ) -> Result<Quote, ServiceError>;
}

/// Executes a previously quoted swap.
///
/// A reported failure (`SwapOutcome::error` set) is a settled, countable
/// result; an `Err` return means the attempt itself fell apart and nothing
/// is known about fills.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SwapExecutor: Send + Sync {
    async fn execute_swap(
        &self,
        pair: &TokenPair,
        side: Side,
        quote: &Quote,
    ) -> Result<SwapOutcome, ServiceError>;
}

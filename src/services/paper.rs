//! Paper venue: synthetic quotes and instant fills.
//!
//! The default back end. Quotes come off a fixed mid rate with a
//! configurable spread and a small random jitter, so the profit gate sees
//! realistic noise; fills land at the quote's guaranteed minimum.

use async_trait::async_trait;
use rand::Rng;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use super::{QuoteService, SwapExecutor};
use crate::types::{Quote, ServiceError, Side, SwapOutcome, TokenPair};

// ---------------------------------------------------------------------------
// Quote synthesis
// ---------------------------------------------------------------------------

/// Synthetic quote source around a fixed A→B mid rate.
pub struct PaperVenue {
    rate_a_to_b: Decimal,
    spread_pct: Decimal,
    jitter_pct: Decimal,
}

impl PaperVenue {
    pub fn new(rate_a_to_b: Decimal, spread_pct: Decimal, jitter_pct: Decimal) -> Self {
        Self {
            rate_a_to_b,
            spread_pct,
            jitter_pct,
        }
    }

    /// Multiplicative noise factor drawn uniformly from
    /// `[-jitter_pct, +jitter_pct]`.
    fn jitter_factor(&self) -> Decimal {
        if self.jitter_pct.is_zero() {
            return Decimal::ONE;
        }
        let bound = self.jitter_pct.to_f64().unwrap_or(0.0).abs();
        let drawn = rand::thread_rng().gen_range(-bound..=bound);
        Decimal::ONE + Decimal::from_f64(drawn).unwrap_or(Decimal::ZERO) / dec!(100)
    }
}

#[async_trait]
impl QuoteService for PaperVenue {
    async fn fetch_quote(
        &self,
        pair: &TokenPair,
        side: Side,
        amount: Decimal,
        slippage_pct: Decimal,
    ) -> Result<Quote, ServiceError> {
        if self.rate_a_to_b <= Decimal::ZERO {
            return Err(ServiceError::Quote(
                "paper venue rate must be positive".to_string(),
            ));
        }

        let mid_out = match side {
            Side::Buy => amount * self.rate_a_to_b,
            Side::Sell => amount / self.rate_a_to_b,
        };
        let out_amount =
            mid_out * (Decimal::ONE - self.spread_pct / dec!(100)) * self.jitter_factor();
        let out_amount_with_slippage = out_amount * (Decimal::ONE - slippage_pct / dec!(100));

        debug!(
            side = %side,
            input = %pair.input_token(side).symbol,
            output = %pair.output_token(side).symbol,
            amount = %amount,
            out = %out_amount,
            "Paper quote synthesized"
        );

        Ok(Quote {
            in_amount: amount,
            out_amount,
            out_amount_with_slippage,
            route: json!({
                "venue": "paper",
                "side": side,
                "rate": self.rate_a_to_b.to_string(),
                "spreadPct": self.spread_pct.to_string(),
            }),
        })
    }
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Fills every swap instantly at the quote's guaranteed minimum, as if
/// slippage always bit in full.
pub struct PaperExecutor;

#[async_trait]
impl SwapExecutor for PaperExecutor {
    async fn execute_swap(
        &self,
        pair: &TokenPair,
        side: Side,
        quote: &Quote,
    ) -> Result<SwapOutcome, ServiceError> {
        let tx_id = format!("paper-{}", Uuid::new_v4());
        debug!(
            side = %side,
            input = %pair.input_token(side).symbol,
            output = %pair.output_token(side).symbol,
            in_amount = %quote.in_amount,
            out_amount = %quote.out_amount_with_slippage,
            tx_id = %tx_id,
            "Paper fill"
        );

        Ok(SwapOutcome {
            input_amount: quote.in_amount,
            output_amount: quote.out_amount_with_slippage,
            tx_id: Some(tx_id),
            error: None,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

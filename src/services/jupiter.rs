//! Jupiter aggregator quote integration.
//!
//! Read-only: the bot only asks Jupiter for route quotes; fills happen on
//! the paper venue. Quotes carry the full response payload so downstream
//! code can forward it untouched.
//!
//! API docs: https://dev.jup.ag/docs/apis/swap-api
//! Endpoint: GET {quote_url}/quote
//! Auth: `x-api-key` header, only required for the pro tier.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use super::QuoteService;
use crate::types::{Quote, ServiceError, Side, TokenInfo, TokenPair};

/// Highest token precision the base-unit math supports. SPL tokens top
/// out at 9; 18 leaves room for wrapped assets.
const MAX_DECIMALS: u32 = 18;

// ---------------------------------------------------------------------------
// API response types (Jupiter JSON → Rust)
// ---------------------------------------------------------------------------

/// The slice of a Jupiter v6 quote we act on. Amounts arrive as base-unit
/// strings; the rest of the payload stays in the raw route value.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteFields {
    in_amount: String,
    out_amount: String,
    /// Minimum output after the requested slippage tolerance.
    other_amount_threshold: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Jupiter quote API client.
pub struct JupiterQuoteClient {
    http: Client,
    quote_url: String,
    api_key: Option<SecretString>,
}

impl JupiterQuoteClient {
    pub fn new(
        quote_url: &str,
        timeout: Duration,
        api_key: Option<SecretString>,
    ) -> Result<Self, ServiceError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent("pingpong/0.1.0 (arbitrage-bot)")
            .build()?;

        Ok(Self {
            http,
            quote_url: quote_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    // -- Unit conversion ---------------------------------------------------

    /// UI amount → integer base units, truncating sub-lamport dust.
    fn to_base_units(amount: Decimal, decimals: u32) -> Result<u128, ServiceError> {
        if decimals > MAX_DECIMALS {
            return Err(ServiceError::Amount(format!(
                "unsupported token precision: {decimals}"
            )));
        }
        let scaled = amount
            .checked_mul(Decimal::from(10u64.pow(decimals)))
            .ok_or_else(|| {
                ServiceError::Amount(format!("amount overflows base units: {amount}"))
            })?
            .trunc();
        scaled.to_u128().ok_or_else(|| {
            ServiceError::Amount(format!("amount not representable in base units: {amount}"))
        })
    }

    /// Base-unit string (Jupiter's wire form) → UI amount.
    fn from_base_units(raw: &str, decimals: u32) -> Result<Decimal, ServiceError> {
        let units: i128 = raw
            .parse()
            .map_err(|_| ServiceError::Amount(format!("bad base-unit amount: {raw}")))?;
        Decimal::try_from_i128_with_scale(units, decimals)
            .map_err(|_| ServiceError::Amount(format!("base-unit amount out of range: {raw}")))
    }

    /// Percentage tolerance → basis points, as the quote API expects.
    fn slippage_to_bps(slippage_pct: Decimal) -> Result<u32, ServiceError> {
        (slippage_pct * dec!(100)).round().to_u32().ok_or_else(|| {
            ServiceError::Amount(format!("bad slippage tolerance: {slippage_pct}%"))
        })
    }

    /// Pull the typed amounts out of a raw quote payload and keep the
    /// payload itself as the route.
    fn quote_from_payload(
        payload: serde_json::Value,
        input: &TokenInfo,
        output: &TokenInfo,
    ) -> Result<Quote, ServiceError> {
        let fields: QuoteFields = serde_json::from_value(payload.clone())?;
        Ok(Quote {
            in_amount: Self::from_base_units(&fields.in_amount, input.decimals)?,
            out_amount: Self::from_base_units(&fields.out_amount, output.decimals)?,
            out_amount_with_slippage: Self::from_base_units(
                &fields.other_amount_threshold,
                output.decimals,
            )?,
            route: payload,
        })
    }
}

// ---------------------------------------------------------------------------
// QuoteService trait implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl QuoteService for JupiterQuoteClient {
    async fn fetch_quote(
        &self,
        pair: &TokenPair,
        side: Side,
        amount: Decimal,
        slippage_pct: Decimal,
    ) -> Result<Quote, ServiceError> {
        let input = pair.input_token(side);
        let output = pair.output_token(side);

        let amount_units = Self::to_base_units(amount, input.decimals)?;
        let slippage_bps = Self::slippage_to_bps(slippage_pct)?;

        let url = format!("{}/quote", self.quote_url);
        debug!(
            side = %side,
            input = %input.symbol,
            output = %output.symbol,
            amount = %amount,
            "Requesting Jupiter quote"
        );

        let mut request = self.http.get(&url).query(&[
            ("inputMint", input.mint.clone()),
            ("outputMint", output.mint.clone()),
            ("amount", amount_units.to_string()),
            ("slippageBps", slippage_bps.to_string()),
        ]);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key.expose_secret());
        }

        let resp = request.send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            // Jupiter reports an unroutable pair as a 400 with a
            // dedicated error code.
            if body.contains("COULD_NOT_FIND_ANY_ROUTE") {
                return Err(ServiceError::NoRoute {
                    input: input.symbol.clone(),
                    output: output.symbol.clone(),
                });
            }
            return Err(ServiceError::Quote(format!(
                "quote endpoint returned {status}: {body}"
            )));
        }

        let payload: serde_json::Value = resp.json().await?;
        Self::quote_from_payload(payload, input, output)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

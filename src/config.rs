//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (API keys) are referenced by env-var name in the config and
//! resolved at runtime via `std::env::var`.

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;
use std::time::Duration;

use crate::types::{TokenInfo, TokenPair, TradingMode};

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub trading: TradingConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    pub pair: PairConfig,
    #[serde(default)]
    pub venue: VenueConfig,
}

/// Strategy knobs for the ping-pong loop.
#[derive(Debug, Deserialize, Clone)]
pub struct TradingConfig {
    #[serde(default = "default_mode")]
    pub mode: TradingMode,
    /// Minimum simulated profit (percent) before a swap fires.
    pub min_profit_threshold: Decimal,
    /// Token A amount committed to the first trade.
    pub initial_trade_size: Decimal,
    #[serde(default = "default_true")]
    pub trading_enabled: bool,
    /// Slippage tolerance (percent) requested on every quote.
    #[serde(default = "default_slippage_pct")]
    pub slippage_pct: Decimal,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SchedulerConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Maximum concurrent trade cycles.
    #[serde(default = "default_throttle")]
    pub throttle: usize,
}

impl SchedulerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            throttle: default_throttle(),
        }
    }
}

/// The two tokens the bot bounces between.
#[derive(Debug, Deserialize, Clone)]
pub struct PairConfig {
    pub token_a: TokenInfo,
    pub token_b: TokenInfo,
}

impl PairConfig {
    pub fn pair(&self) -> TokenPair {
        TokenPair {
            token_a: self.token_a.clone(),
            token_b: self.token_b.clone(),
        }
    }
}

/// Where quotes come from.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QuoteSource {
    Paper,
    Jupiter,
}

#[derive(Debug, Deserialize, Clone)]
pub struct VenueConfig {
    #[serde(default = "default_quote_source")]
    pub quote_source: QuoteSource,
    #[serde(default = "default_quote_url")]
    pub quote_url: String,
    /// Env var holding the aggregator API key, if one is needed.
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub paper: PaperConfig,
}

impl VenueConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Resolve the configured API key env var into a secret.
    pub fn api_key(&self) -> Result<Option<SecretString>> {
        match &self.api_key_env {
            Some(env_name) => Ok(Some(SecretString::new(AppConfig::resolve_env(env_name)?))),
            None => Ok(None),
        }
    }
}

impl Default for VenueConfig {
    fn default() -> Self {
        Self {
            quote_source: default_quote_source(),
            quote_url: default_quote_url(),
            api_key_env: None,
            request_timeout_ms: default_request_timeout_ms(),
            paper: PaperConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaperConfig {
    /// Mid rate: how much token B one token A buys.
    pub rate_a_to_b: Decimal,
    pub spread_pct: Decimal,
    pub jitter_pct: Decimal,
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            rate_a_to_b: dec!(150),
            spread_pct: dec!(0.1),
            jitter_pct: dec!(0.5),
        }
    }
}

fn default_mode() -> TradingMode {
    TradingMode::PingPong
}

fn default_true() -> bool {
    true
}

fn default_slippage_pct() -> Decimal {
    dec!(1)
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_throttle() -> usize {
    1
}

fn default_quote_source() -> QuoteSource {
    QuoteSource::Paper
}

fn default_quote_url() -> String {
    "https://quote-api.jup.ag/v6".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the engine cannot run on. Called once at
    /// startup; any failure aborts before the scheduler starts.
    pub fn validate(&self) -> Result<()> {
        if self.scheduler.throttle == 0 {
            bail!("scheduler.throttle must be at least 1");
        }
        if self.scheduler.poll_interval_ms == 0 {
            bail!("scheduler.poll_interval_ms must be at least 1");
        }
        if self.trading.initial_trade_size <= Decimal::ZERO {
            bail!("trading.initial_trade_size must be positive");
        }
        if self.trading.slippage_pct < Decimal::ZERO || self.trading.slippage_pct > dec!(100) {
            bail!("trading.slippage_pct must be between 0 and 100");
        }
        for token in [&self.pair.token_a, &self.pair.token_b] {
            if token.symbol.is_empty() || token.mint.is_empty() {
                bail!("pair tokens need a symbol and a mint address");
            }
            if token.decimals > 18 {
                bail!("token {} has unsupported precision {}", token.symbol, token.decimals);
            }
        }
        if self.pair.token_a.mint == self.pair.token_b.mint {
            bail!("pair.token_a and pair.token_b must be different tokens");
        }
        if self.venue.paper.rate_a_to_b <= Decimal::ZERO {
            bail!("venue.paper.rate_a_to_b must be positive");
        }
        if self.venue.paper.spread_pct < Decimal::ZERO || self.venue.paper.spread_pct > dec!(100) {
            bail!("venue.paper.spread_pct must be between 0 and 100");
        }
        if self.venue.paper.jitter_pct < Decimal::ZERO {
            bail!("venue.paper.jitter_pct must not be negative");
        }
        if self.venue.quote_source == QuoteSource::Jupiter && self.venue.quote_url.is_empty() {
            bail!("venue.quote_url is required for the jupiter quote source");
        }
        Ok(())
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}

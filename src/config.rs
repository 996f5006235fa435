//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs. Every
//! section is optional and falls back to the defaults the swipe deck ships
//! with (0.1 minimum stake, 1.5 s success notice, 18-decimal native
//! currency).

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::fs;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub currency: CurrencyConfig,
    #[serde(default)]
    pub deposit: DepositConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SessionConfig {
    /// Acting wallet address.
    pub identity: String,
    /// Stake every new card starts from.
    pub default_stake: Decimal,
    /// Lower bound for the stake input.
    pub min_stake: Decimal,
    /// Increment/decrement step of the stake buttons.
    pub stake_step: Decimal,
    pub success_notice_ms: u64,
    pub swipe_notice_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            identity: "0x0000000000000000000000000000000000000001".to_string(),
            default_stake: dec!(0.1),
            min_stake: dec!(0.1),
            stake_step: dec!(0.1),
            success_notice_ms: 1500,
            swipe_notice_ms: 5000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CurrencyConfig {
    pub symbol: String,
    pub decimals: u32,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            symbol: "ETH".to_string(),
            decimals: 18,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DepositConfig {
    /// One-tap amounts offered by the deposit prompt.
    pub presets: Vec<Decimal>,
}

impl Default for DepositConfig {
    fn default() -> Self {
        Self {
            presets: vec![dec!(5), dec!(10), dec!(15)],
        }
    }
}

/// Seed data for the in-process ledger used by the terminal front end.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct LedgerConfig {
    /// Escrow balance credited to the session identity at start.
    pub initial_balance: Decimal,
    /// Simulated confirmation latency.
    pub confirmation_delay_ms: u64,
    pub markets: Vec<SeedMarket>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SeedMarket {
    pub question: String,
    #[serde(default)]
    pub image_uri: String,
    pub betting_hours: u64,
    pub resolution_hours: u64,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        Ok(config)
    }
}

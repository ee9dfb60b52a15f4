use config::{Config, ConfigError, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;

use crate::constants::BASE_CHAIN_ID;

fn default_slippage_pct() -> Decimal {
    Decimal::ONE // 1%
}

fn default_maximum_hops() -> u32 {
    4
}

fn default_amm_fee_pips() -> u32 {
    200 // 0.02%, the protocol-wide AMM fee; confirm against the live factory
}

fn default_chain_id() -> u64 {
    BASE_CHAIN_ID
}

fn default_gas_estimate() -> u64 {
    500_000
}

fn default_gas_limit_pad() -> u64 {
    100_000
}

fn default_name() -> String {
    String::new()
}

#[derive(Debug, Deserialize, Clone)]
pub struct TokenSettings {
    pub symbol: String,
    #[serde(default = "default_name")]
    pub name: String,
    pub address: String,
    pub decimals: u8,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NetworkSettings {
    pub rpc_url: String,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    #[serde(default)]
    pub tokens: Vec<TokenSettings>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GasSettings {
    /// Fallback returned whenever estimation fails.
    #[serde(default = "default_gas_estimate")]
    pub default_estimate: u64,
    /// Safety margin added on top of the caller's gas-limit hint.
    #[serde(default = "default_gas_limit_pad")]
    pub limit_pad: u64,
}

impl Default for GasSettings {
    fn default() -> Self {
        Self {
            default_estimate: default_gas_estimate(),
            limit_pad: default_gas_limit_pad(),
        }
    }
}

/// A sibling connector entry surfaced by `list_connectors` alongside this one.
#[derive(Debug, Deserialize, Clone)]
pub struct SiblingConnector {
    pub name: String,
    pub trading_types: Vec<String>,
    pub chain: String,
    pub networks: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Default slippage tolerance in percent, applied when a request omits it.
    #[serde(default = "default_slippage_pct")]
    pub slippage_pct: Decimal,
    /// Maximum route length accepted by the router config. Carried for config
    /// parity with sibling connectors; routing here is single-hop.
    #[serde(default = "default_maximum_hops")]
    pub maximum_hops: u32,
    /// Protocol-wide AMM swap fee in pips (parts per million).
    #[serde(default = "default_amm_fee_pips")]
    pub amm_fee_pips: u32,
    #[serde(default)]
    pub gas: GasSettings,
    #[serde(default)]
    pub networks: HashMap<String, NetworkSettings>,
    /// Other connectors exposed by the same gateway process, config-sourced.
    #[serde(default)]
    pub sibling_connectors: Vec<SiblingConnector>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name("Config").required(false))
            .build()?;

        let mut settings: Self = s.try_deserialize()?;

        // Environment variable overrides
        if let Ok(raw) = env::var("AERODROME_SLIPPAGE_PCT") {
            if let Ok(pct) = raw.trim().parse() {
                settings.slippage_pct = pct;
            }
        }
        if let Ok(raw) = env::var("AERODROME_RPC_URL") {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                settings
                    .networks
                    .entry("base".to_string())
                    .or_insert_with(default_base_network)
                    .rpc_url = trimmed.to_string();
            }
        }

        if settings.networks.is_empty() {
            settings
                .networks
                .insert("base".to_string(), default_base_network());
        }

        Ok(settings)
    }

    /// Settings seeded with the Base network and its common token list,
    /// without reading `Config.toml`. Used as the no-config fallback and in
    /// tests.
    pub fn with_base_defaults() -> Self {
        let mut networks = HashMap::new();
        networks.insert("base".to_string(), default_base_network());
        Self {
            slippage_pct: default_slippage_pct(),
            maximum_hops: default_maximum_hops(),
            amm_fee_pips: default_amm_fee_pips(),
            gas: GasSettings::default(),
            networks,
            sibling_connectors: Vec::new(),
        }
    }

    pub fn network(&self, name: &str) -> Option<&NetworkSettings> {
        self.networks.get(name)
    }

    pub fn network_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.networks.keys().cloned().collect();
        names.sort();
        names
    }
}

fn default_base_network() -> NetworkSettings {
    NetworkSettings {
        rpc_url: "https://mainnet.base.org".to_string(),
        chain_id: BASE_CHAIN_ID,
        tokens: vec![
            TokenSettings {
                symbol: "WETH".to_string(),
                name: "Wrapped Ether".to_string(),
                address: "0x4200000000000000000000000000000000000006".to_string(),
                decimals: 18,
            },
            TokenSettings {
                symbol: "AERO".to_string(),
                name: "Aerodrome".to_string(),
                address: "0x940181a94A35A4569E4529A3CDfB74e38FD98631".to_string(),
                decimals: 18,
            },
            TokenSettings {
                symbol: "USDC".to_string(),
                name: "USD Coin".to_string(),
                address: "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913".to_string(),
                decimals: 6,
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn base_defaults_are_complete() {
        let settings = Settings::with_base_defaults();
        assert_eq!(settings.slippage_pct, dec!(1));
        assert_eq!(settings.amm_fee_pips, 200);
        assert_eq!(settings.gas.default_estimate, 500_000);

        let base = settings.network("base").expect("base network");
        assert_eq!(base.chain_id, BASE_CHAIN_ID);
        assert!(base.tokens.iter().any(|t| t.symbol == "WETH"));
    }

    #[test]
    fn unknown_network_is_absent() {
        let settings = Settings::with_base_defaults();
        assert!(settings.network("arbitrum").is_none());
    }
}

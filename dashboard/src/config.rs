//! # Configuration Module
//!
//! This module handles loading and validation of environment variables
//! for the vault dashboard client.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `STATS_API_URL` | Remote vault stats endpoint | G12 data function |
//! | `WALLET_RPC_URL` | JSON-RPC endpoint of the signing wallet | `http://127.0.0.1:1248` |
//! | `ARBITRUM_RPC_URL` | Public Arbitrum RPC for balance reads | `https://arb1.arbitrum.io/rpc` |
//! | `BASE_RPC_URL` | Public Base RPC for balance reads | `https://mainnet.base.org` |
//! | `DEPOSIT_SLIPPAGE_BPS` | Slippage tolerance for `buyShares` | `250` |
//! | `REDEEM_PAYOUT_BPS` | Stablecoin share of a redemption payout | `10000` |
//! | `DIALOG_CLOSE_DELAY_MS` | Delay before closing a dialog after success | `1200` |
//! | `PENDING_DEPOSIT_DELAY_MS` | Delay before auto-opening a requested deposit | `300` |
//! | `RECEIPT_POLL_INTERVAL_MS` | Receipt polling interval | `2000` |
//! | `ACCOUNT_POLL_INTERVAL_SECONDS` | Wallet account polling interval | `3` |
//! | `HTTP_TIMEOUT_SECONDS` | Timeout for stats and read-only RPC requests | `30` |
//! | `LOG_FORMAT` | `pretty` or `json` | `pretty` |

use std::{collections::BTreeMap, time::Duration};

use alloy_primitives::{address, Address};
use shared::{NetworkKey, VaultConfig, BPS_DENOMINATOR};

pub const DEFAULT_STATS_API_URL: &str =
    "https://ucrvaqztvfnphhoqcbpo.supabase.co/functions/v1/FIRECRAWL_DATA";
pub const DEFAULT_WALLET_RPC_URL: &str = "http://127.0.0.1:1248";

const ARBITRUM_VAULT: Address = address!("c9e50e08739a4aec211f2e8e95f1ab45b923cc20");
const ARBITRUM_CONTROLLER: Address = address!("Ac7e68A0c3Ecae1b8D889ca030863eCab63B587A");
const ARBITRUM_USDC: Address = address!("af88d065e77c8cC2239327C5EDb3A432268e5831");
const BASE_VAULT: Address = address!("bfa811e1f065c9b66b02d8ae408d4d9b9be70a22");
const BASE_CONTROLLER: Address = address!("Ecd52026399297F65db08B65F2fF466DdF5a20eE");
const BASE_USDC: Address = address!("833589fCD6eDb6E08f4c7C32D4f71b54bdA02913");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Policy knobs for the transaction pipelines, in basis points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxPolicy {
    pub deposit_slippage_bps: u64,
    pub redeem_payout_bps: u64,
}

impl Default for TxPolicy {
    fn default() -> Self {
        Self {
            deposit_slippage_bps: 250,
            redeem_payout_bps: BPS_DENOMINATOR,
        }
    }
}

/// Client configuration loaded from environment variables
///
/// Vault deployments are fixed; only their RPC endpoints can be overridden.
/// Use `Config::from_env()` to load from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Remote stats endpoint
    pub stats_api_url: String,
    /// JSON-RPC endpoint of the wallet that signs transactions
    pub wallet_rpc_url: String,
    /// Supported vaults, keyed by network
    pub vaults: BTreeMap<NetworkKey, VaultConfig>,
    pub policy: TxPolicy,
    pub dialog_close_delay: Duration,
    pub pending_deposit_delay: Duration,
    pub receipt_poll_interval: Duration,
    pub account_poll_interval: Duration,
    pub http_timeout: Duration,
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Every variable is optional. Returns an error when a set variable
    /// cannot be parsed or a basis-point value is out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let string_or = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());
        let number_or = |name: &'static str, default: u64| -> Result<u64, ConfigError> {
            match lookup(name) {
                Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidNumber(name)),
                None => Ok(default),
            }
        };

        let stats_api_url = string_or("STATS_API_URL", DEFAULT_STATS_API_URL);
        let wallet_rpc_url = string_or("WALLET_RPC_URL", DEFAULT_WALLET_RPC_URL);

        let mut vaults = default_vaults();
        if let Some(rpc) = lookup("ARBITRUM_RPC_URL") {
            if let Some(vault) = vaults.get_mut(&NetworkKey::Arbitrum) {
                vault.rpc_url = rpc;
            }
        }
        if let Some(rpc) = lookup("BASE_RPC_URL") {
            if let Some(vault) = vaults.get_mut(&NetworkKey::Base) {
                vault.rpc_url = rpc;
            }
        }

        let deposit_slippage_bps = number_or("DEPOSIT_SLIPPAGE_BPS", 250)?;
        if deposit_slippage_bps > BPS_DENOMINATOR {
            return Err(ConfigError::OutOfRange("DEPOSIT_SLIPPAGE_BPS"));
        }
        let redeem_payout_bps = number_or("REDEEM_PAYOUT_BPS", BPS_DENOMINATOR)?;
        if redeem_payout_bps == 0 || redeem_payout_bps > BPS_DENOMINATOR {
            return Err(ConfigError::OutOfRange("REDEEM_PAYOUT_BPS"));
        }

        let dialog_close_delay = Duration::from_millis(number_or("DIALOG_CLOSE_DELAY_MS", 1200)?);
        let pending_deposit_delay =
            Duration::from_millis(number_or("PENDING_DEPOSIT_DELAY_MS", 300)?);
        let receipt_poll_interval =
            Duration::from_millis(number_or("RECEIPT_POLL_INTERVAL_MS", 2000)?.max(1));
        let account_poll_interval =
            Duration::from_secs(number_or("ACCOUNT_POLL_INTERVAL_SECONDS", 3)?.max(1));
        let http_timeout = Duration::from_secs(number_or("HTTP_TIMEOUT_SECONDS", 30)?);

        let log_format = match lookup("LOG_FORMAT").as_deref().map(str::to_ascii_lowercase) {
            None => LogFormat::Pretty,
            Some(f) if f == "pretty" => LogFormat::Pretty,
            Some(f) if f == "json" => LogFormat::Json,
            Some(other) => return Err(ConfigError::InvalidLogFormat(other)),
        };

        Ok(Config {
            stats_api_url,
            wallet_rpc_url,
            vaults,
            policy: TxPolicy {
                deposit_slippage_bps,
                redeem_payout_bps,
            },
            dialog_close_delay,
            pending_deposit_delay,
            receipt_poll_interval,
            account_poll_interval,
            http_timeout,
            log_format,
        })
    }

    pub fn vault(&self, key: NetworkKey) -> &VaultConfig {
        // every NetworkKey has an entry in default_vaults
        &self.vaults[&key]
    }
}

pub fn default_vaults() -> BTreeMap<NetworkKey, VaultConfig> {
    let arbitrum = VaultConfig {
        key: NetworkKey::Arbitrum,
        name: "G12 DeFi Yield".to_string(),
        network: "Arbitrum".to_string(),
        chain_id: 42161,
        rpc_url: "https://arb1.arbitrum.io/rpc".to_string(),
        vault: ARBITRUM_VAULT,
        controller: ARBITRUM_CONTROLLER,
        stablecoin: ARBITRUM_USDC,
        explorer_url: "https://arbiscan.io".to_string(),
    };
    let base = VaultConfig {
        key: NetworkKey::Base,
        name: "G12 Stable Yield".to_string(),
        network: "Base".to_string(),
        chain_id: 8453,
        rpc_url: "https://mainnet.base.org".to_string(),
        vault: BASE_VAULT,
        controller: BASE_CONTROLLER,
        stablecoin: BASE_USDC,
        explorer_url: "https://basescan.org".to_string(),
    };

    BTreeMap::from([(NetworkKey::Arbitrum, arbitrum), (NetworkKey::Base, base)])
}

/// Configuration errors that can occur during loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A numeric environment variable has an invalid value
    #[error("Invalid number for {0}")]
    InvalidNumber(&'static str),

    /// A basis-point value is outside its allowed range
    #[error("Value out of range for {0}")]
    OutOfRange(&'static str),

    #[error("Invalid log format: {0} (expected pretty or json)")]
    InvalidLogFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_match_deployments() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.policy, TxPolicy::default());
        assert_eq!(config.vault(NetworkKey::Arbitrum).chain_id, 42161);
        assert_eq!(config.vault(NetworkKey::Base).chain_id, 8453);
        assert_eq!(config.dialog_close_delay, Duration::from_millis(1200));
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.stats_api_url, DEFAULT_STATS_API_URL);
    }

    #[test]
    fn rpc_overrides_apply_per_network() {
        let config = Config::from_lookup(lookup_from(&[("BASE_RPC_URL", "http://localhost:8545")]))
            .unwrap();
        assert_eq!(config.vault(NetworkKey::Base).rpc_url, "http://localhost:8545");
        assert_eq!(config.vault(NetworkKey::Arbitrum).rpc_url, "https://arb1.arbitrum.io/rpc");
    }

    #[test]
    fn rejects_bad_numbers_and_ranges() {
        assert!(matches!(
            Config::from_lookup(lookup_from(&[("DEPOSIT_SLIPPAGE_BPS", "abc")])),
            Err(ConfigError::InvalidNumber("DEPOSIT_SLIPPAGE_BPS"))
        ));
        assert!(matches!(
            Config::from_lookup(lookup_from(&[("DEPOSIT_SLIPPAGE_BPS", "10001")])),
            Err(ConfigError::OutOfRange("DEPOSIT_SLIPPAGE_BPS"))
        ));
        assert!(matches!(
            Config::from_lookup(lookup_from(&[("REDEEM_PAYOUT_BPS", "0")])),
            Err(ConfigError::OutOfRange("REDEEM_PAYOUT_BPS"))
        ));
        assert!(matches!(
            Config::from_lookup(lookup_from(&[("LOG_FORMAT", "xml")])),
            Err(ConfigError::InvalidLogFormat(_))
        ));
    }
}

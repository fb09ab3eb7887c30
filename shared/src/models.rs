use std::{fmt, str::FromStr};

use alloy_primitives::{Address, B256, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{units_to_f64, DashboardError, SHARE_DECIMALS, STABLECOIN_DECIMALS};

#[derive(Debug , Clone , Copy , PartialEq , Eq , PartialOrd , Ord , Hash , Serialize , Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkKey {
    Arbitrum,
    Base,
}

impl NetworkKey {
    pub const ALL: [NetworkKey; 2] = [NetworkKey::Arbitrum, NetworkKey::Base];

    pub fn as_str(&self) -> &'static str {
      match self {
          NetworkKey::Arbitrum => "arbitrum",
          NetworkKey::Base => "base",
      }
    }
}

impl fmt::Display for NetworkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts the network names plus the product aliases used in share links:
/// `defi` is the Arbitrum vault, `stable` the Base vault.
impl FromStr for NetworkKey {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "arbitrum" | "defi" => Ok(NetworkKey::Arbitrum),
            "base" | "stable" => Ok(NetworkKey::Base),
            other => Err(DashboardError::Validation(format!("Unknown vault: {}", other))),
        }
    }
}

/// Static description of one supported vault deployment.
#[derive(Debug , Clone , PartialEq , Eq , Serialize , Deserialize)]
pub struct VaultConfig {
  pub key: NetworkKey,
  pub name: String,
  pub network: String,
  pub chain_id: u64,
  pub rpc_url: String,
  pub vault: Address,
  pub controller: Address,
  pub stablecoin: Address,
  pub explorer_url: String,
}

impl VaultConfig {
  pub fn tx_url(&self , tx_hash: &B256) -> String {
    format!("{}/tx/{}", self.explorer_url.trim_end_matches('/'), tx_hash)
  }
}

/// A user's holdings on one network. The floats are display values; the raw
/// integers are what the chain reported.
#[derive(Debug , Clone , Default , PartialEq , Serialize , Deserialize)]
pub struct UserPosition {
  pub share_balance: f64,
  pub stablecoin_balance: f64,
  pub raw_shares: U256,
  pub raw_stablecoin: U256,
  pub updated_at: Option<DateTime<Utc>>,
}

impl UserPosition {
  pub fn from_raw(raw_shares: U256 , raw_stablecoin: U256) -> Self {
    Self {
      share_balance: units_to_f64(raw_shares, SHARE_DECIMALS),
      stablecoin_balance: units_to_f64(raw_stablecoin, STABLECOIN_DECIMALS),
      raw_shares,
      raw_stablecoin,
      updated_at: Some(Utc::now()),
    }
  }
}

#[derive(Debug , Clone , PartialEq , Serialize , Deserialize)]
pub struct VaultStats {
  pub share_price: f64,
  pub monthly_return: f64,
  pub aum: f64,
  pub updated_at: Option<DateTime<Utc>>,
}

impl Default for VaultStats {
  fn default() -> Self {
    Self { share_price: 1.0, monthly_return: 0.0, aum: 0.0, updated_at: None }
  }
}

impl VaultStats {
  /// Reads the stats endpoint's body. A body without a `share_price` key is
  /// not a stats record (the endpoint answers errors with other shapes).
  /// Missing, zero or unparsable numbers fall back to 1 for the price and 0
  /// for the rest; numeric strings are accepted.
  pub fn from_payload(payload: &Value) -> Option<Self> {
    let object = payload.as_object()?;
    let share_price = object.get("share_price")?;

    Some(Self {
      share_price: number_or(Some(share_price), 1.0),
      monthly_return: number_or(object.get("monthly_return"), 0.0),
      aum: number_or(object.get("aum"), 0.0),
      updated_at: Some(Utc::now()),
    })
  }
}

fn number_or(value: Option<&Value> , fallback: f64) -> f64 {
  let parsed = match value {
    Some(Value::Number(n)) => n.as_f64(),
    Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
    _ => None,
  };
  match parsed {
    Some(n) if n.is_finite() && n != 0.0 => n,
    _ => fallback,
  }
}

#[derive(Debug , Clone , Copy , PartialEq , Eq , Hash , Serialize , Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    Deposit,
    Redeem,
}

impl TxKind {
    pub fn as_str(&self) -> &'static str {
      match self {
          TxKind::Deposit => "deposit",
          TxKind::Redeem => "redeem",
      }
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug , Clone , PartialEq , Serialize)]
pub struct VaultHolding {
  pub key: NetworkKey,
  pub shares: f64,
  pub share_price: f64,
  pub value: f64,
  pub monthly_return: f64,
}

/// Dashboard totals derived from the current snapshots.
#[derive(Debug , Clone , PartialEq , Serialize)]
pub struct PortfolioSummary {
  pub holdings: Vec<VaultHolding>,
  pub total_value: f64,
  /// Stablecoin balance on the primary (first listed) network.
  pub stablecoin_balance: f64,
}

impl PortfolioSummary {
  pub fn compute(entries: &[(NetworkKey , UserPosition , VaultStats)]) -> Self {
    let holdings: Vec<VaultHolding> = entries
      .iter()
      .map(|(key, position, stats)| {
        let share_price = if stats.share_price > 0.0 { stats.share_price } else { 1.0 };
        VaultHolding {
          key: *key,
          shares: position.share_balance,
          share_price,
          value: position.share_balance * share_price,
          monthly_return: stats.monthly_return,
        }
      })
      .collect();

    let total_value = holdings.iter().map(|h| h.value).sum();
    let stablecoin_balance = entries
      .first()
      .map(|(_, position, _)| position.stablecoin_balance)
      .unwrap_or(0.0);

    Self { holdings, total_value, stablecoin_balance }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn network_key_accepts_aliases() {
    assert_eq!("defi".parse::<NetworkKey>().unwrap(), NetworkKey::Arbitrum);
    assert_eq!(" Stable ".parse::<NetworkKey>().unwrap(), NetworkKey::Base);
    assert_eq!("base".parse::<NetworkKey>().unwrap(), NetworkKey::Base);
    assert!("solana".parse::<NetworkKey>().is_err());
  }

  #[test]
  fn stats_payload_defaults_missing_fields() {
    let stats = VaultStats::from_payload(&json!({ "share_price": 1.0421 })).unwrap();
    assert_eq!(stats.share_price, 1.0421);
    assert_eq!(stats.monthly_return, 0.0);
    assert_eq!(stats.aum, 0.0);
  }

  #[test]
  fn stats_payload_accepts_numeric_strings_and_zero_price() {
    let stats = VaultStats::from_payload(&json!({
      "share_price": "0",
      "monthly_return": "1.25",
      "aum": 2500000
    }))
    .unwrap();
    assert_eq!(stats.share_price, 1.0);
    assert_eq!(stats.monthly_return, 1.25);
    assert_eq!(stats.aum, 2_500_000.0);
  }

  #[test]
  fn stats_payload_without_price_is_rejected() {
    assert!(VaultStats::from_payload(&json!({ "error": "not found" })).is_none());
    assert!(VaultStats::from_payload(&json!([1, 2])).is_none());
    // null is present, so it falls back rather than being rejected
    assert_eq!(
      VaultStats::from_payload(&json!({ "share_price": null })).unwrap().share_price,
      1.0
    );
  }

  #[test]
  fn position_from_raw_scales_both_tokens() {
    let position = UserPosition::from_raw(
      U256::from(5_000_000_000_000_000_000u128),
      U256::from(1_234_560_000u64),
    );
    assert_eq!(position.share_balance, 5.0);
    assert_eq!(position.stablecoin_balance, 1234.56);
  }

  #[test]
  fn portfolio_values_shares_at_price() {
    let arb = UserPosition { share_balance: 10.0, stablecoin_balance: 50.0, ..Default::default() };
    let base = UserPosition { share_balance: 4.0, stablecoin_balance: 7.0, ..Default::default() };
    let arb_stats = VaultStats { share_price: 1.5, monthly_return: 2.0, ..Default::default() };
    let base_stats = VaultStats { share_price: 0.0, ..Default::default() };

    let summary = PortfolioSummary::compute(&[
      (NetworkKey::Arbitrum, arb, arb_stats),
      (NetworkKey::Base, base, base_stats),
    ]);

    assert_eq!(summary.holdings[0].value, 15.0);
    assert_eq!(summary.holdings[1].share_price, 1.0);
    assert_eq!(summary.total_value, 19.0);
    assert_eq!(summary.stablecoin_balance, 50.0);
  }

  #[test]
  fn tx_url_joins_explorer() {
    let config = VaultConfig {
      key: NetworkKey::Base,
      name: "G12 Stable Yield".into(),
      network: "Base".into(),
      chain_id: 8453,
      rpc_url: "https://mainnet.base.org".into(),
      vault: Address::ZERO,
      controller: Address::ZERO,
      stablecoin: Address::ZERO,
      explorer_url: "https://basescan.org/".into(),
    };
    let url = config.tx_url(&B256::ZERO);
    assert!(url.starts_with("https://basescan.org/tx/0x0000"));
  }
}

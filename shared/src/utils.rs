use alloy_primitives::{Address, U256};

use crate::{DashboardError, DashboardResult};

/// Vault shares are 18-decimal tokens.
pub const SHARE_DECIMALS: u8 = 18;
/// USDC on both supported networks uses 6 decimals.
pub const STABLECOIN_DECIMALS: u8 = 6;
pub const BPS_DENOMINATOR: u64 = 10_000;

const INVALID_AMOUNT: &str = "Please enter a valid amount";

/// Parses a user-entered amount. Anything that is not a finite number
/// greater than zero is rejected.
pub fn parse_amount(input: &str) -> DashboardResult<f64> {
  let amount = input
    .trim()
    .parse::<f64>()
    .map_err(|_| DashboardError::Validation(INVALID_AMOUNT.to_string()))?;

  if !amount.is_finite() || amount <= 0.0 {
    return Err(DashboardError::Validation(INVALID_AMOUNT.to_string()));
  }
  Ok(amount)
}

/// Compares in token units; display floats are too lossy for this.
pub fn ensure_within_balance(amount: U256 , available: U256 , asset: &str) -> DashboardResult<()> {
  if amount > available {
    return Err(DashboardError::Validation(format!("Insufficient {} balance", asset)));
  }
  Ok(())
}

/// Converts a decimal string into the token's integer representation
/// without going through floating point.
pub fn to_base_units(input: &str , decimals: u8) -> DashboardResult<U256> {
  let trimmed = input.trim();
  let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));

  let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
  if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction) {
    return Err(DashboardError::Validation(INVALID_AMOUNT.to_string()));
  }
  if fraction.len() > decimals as usize {
    return Err(DashboardError::Validation(format!(
      "Amount supports at most {} decimal places",
      decimals
    )));
  }

  let digits = format!("{}{:0<width$}", whole, fraction, width = decimals as usize);
  U256::from_str_radix(&digits, 10).map_err(|_| DashboardError::Validation(INVALID_AMOUNT.to_string()))
}

/// Lossy conversion of an on-chain integer amount into a display float.
/// The result must never feed back into a transaction amount.
pub fn units_to_f64(amount: U256 , decimals: u8) -> f64 {
  let scale = U256::from(10u64).pow(U256::from(decimals));
  let whole = u128::try_from(amount / scale).unwrap_or(u128::MAX) as f64;
  let fraction = u128::try_from(amount % scale).unwrap_or(0) as f64;
  whole + fraction / 10f64.powi(decimals as i32)
}

/// Renders an integer amount as an exact decimal string, trimming
/// trailing zeros of the fractional part.
pub fn format_base_units(amount: U256 , decimals: u8) -> String {
  let scale = U256::from(10u64).pow(U256::from(decimals));
  let whole = amount / scale;
  let fraction = amount % scale;
  if fraction.is_zero() {
    return whole.to_string();
  }
  let fraction = format!("{:0>width$}", fraction.to_string(), width = decimals as usize);
  format!("{}.{}", whole, fraction.trim_end_matches('0'))
}

/// `floor(amount * bps / 10_000)`.
pub fn apply_bps(amount: U256 , bps: u64) -> U256 {
  let denominator = U256::from(BPS_DENOMINATOR);
  let bps = U256::from(bps);
  match amount.checked_mul(bps) {
    Some(scaled) => scaled / denominator,
    None => amount / denominator * bps,
  }
}

/// Minimum shares accepted for a deposit under the given slippage tolerance.
pub fn min_shares_out(amount: U256 , slippage_bps: u64) -> U256 {
  apply_bps(amount, BPS_DENOMINATOR.saturating_sub(slippage_bps))
}

pub fn short_address(address: &Address) -> String {
  let full = address.to_string();
  format!("{}…{}", &full[..6], &full[full.len() - 4..])
}

pub fn format_usd(amount: f64) -> String {
  let amount = if amount.is_finite() { amount } else { 0.0 };
  let cents = (amount.abs() * 100.0).round() as u128;
  let whole = (cents / 100).to_string();

  let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
  for (i, ch) in whole.chars().enumerate() {
    if i > 0 && (whole.len() - i) % 3 == 0 {
      grouped.push(',');
    }
    grouped.push(ch);
  }

  let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
  format!("{}${}.{:02}", sign, grouped, cents % 100)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_amount_rejects_non_positive() {
    assert!(parse_amount("").is_err());
    assert!(parse_amount("abc").is_err());
    assert!(parse_amount("0").is_err());
    assert!(parse_amount("-3").is_err());
    assert!(parse_amount("inf").is_err());
    assert_eq!(parse_amount(" 12.5 ").unwrap(), 12.5);
  }

  #[test]
  fn balance_check_names_the_asset() {
    let err = ensure_within_balance(U256::from(5_500u64), U256::from(5_000u64), "shares").unwrap_err();
    assert_eq!(err, DashboardError::Validation("Insufficient shares balance".into()));
    assert!(ensure_within_balance(U256::from(5_000u64), U256::from(5_000u64), "shares").is_ok());
  }

  #[test]
  fn printed_balance_parses_back_within_balance() {
    for raw in 1_000_000u64..1_010_000 {
      let raw = U256::from(raw);
      let typed = format_base_units(raw, STABLECOIN_DECIMALS);
      let units = to_base_units(&typed, STABLECOIN_DECIMALS).unwrap();
      assert!(ensure_within_balance(units, raw, "USDC").is_ok(), "{} rejected", typed);
    }

    let shares = U256::from(1_003_655_555_555_555_190u128);
    let typed = format_base_units(shares, SHARE_DECIMALS);
    assert_eq!(typed, "1.00365555555555519");
    let units = to_base_units(&typed, SHARE_DECIMALS).unwrap();
    assert!(ensure_within_balance(units, shares, "shares").is_ok());
  }

  #[test]
  fn base_units_are_exact() {
    assert_eq!(to_base_units("1000", 6).unwrap(), U256::from(1_000_000_000u64));
    assert_eq!(to_base_units("0.1", 6).unwrap(), U256::from(100_000u64));
    assert_eq!(to_base_units(".5", 6).unwrap(), U256::from(500_000u64));
    assert_eq!(
      to_base_units("5.5", 18).unwrap(),
      U256::from(5_500_000_000_000_000_000u128)
    );
    assert!(to_base_units("1.0000001", 6).is_err());
    assert!(to_base_units("1e3", 6).is_err());
    assert!(to_base_units(".", 6).is_err());
  }

  #[test]
  fn display_conversion_scales_by_decimals() {
    assert_eq!(units_to_f64(U256::from(1_500_000u64), 6), 1.5);
    assert_eq!(units_to_f64(U256::from(2_250_000_000_000_000_000u128), 18), 2.25);
    assert_eq!(units_to_f64(U256::ZERO, 18), 0.0);
  }

  #[test]
  fn format_base_units_trims_zeros() {
    assert_eq!(format_base_units(U256::from(1_500_000u64), 6), "1.5");
    assert_eq!(format_base_units(U256::from(42_000_000u64), 6), "42");
    assert_eq!(format_base_units(U256::from(1u64), 6), "0.000001");
  }

  #[test]
  fn min_shares_floor_is_97_5_percent() {
    assert_eq!(
      min_shares_out(U256::from(1_000_000_000u64), 250),
      U256::from(975_000_000u64)
    );
    // 333 * 0.975 = 324.675
    assert_eq!(min_shares_out(U256::from(333u64), 250), U256::from(324u64));
    assert_eq!(min_shares_out(U256::from(333u64), 0), U256::from(333u64));
  }

  #[test]
  fn apply_bps_survives_overflow() {
    let half = apply_bps(U256::MAX, 5_000);
    assert!(half > U256::ZERO && half < U256::MAX);
  }

  #[test]
  fn usd_formatting_groups_thousands() {
    assert_eq!(format_usd(0.0), "$0.00");
    assert_eq!(format_usd(1234567.891), "$1,234,567.89");
    assert_eq!(format_usd(999.999), "$1,000.00");
    assert_eq!(format_usd(f64::NAN), "$0.00");
  }

  #[test]
  fn short_address_keeps_prefix_and_suffix() {
    let address: Address = "0x00000000000000000000000000000000000000ff".parse().unwrap();
    assert_eq!(short_address(&address).to_lowercase(), "0x0000…00ff");
  }
}

//! # CLI Interface
//!
//! Command-line structure for `vault-dashboard`, built with `clap` derive.
//! `run` starts the interactive session; the other subcommands are one-shot.

use alloy_primitives::Address;
use clap::{Parser, Subcommand};
use shared::NetworkKey;

/// Vault dashboard for the Arbitrum and Base yield vaults.
#[derive(Parser, Debug)]
#[command(
    name = "vault-dashboard",
    about = "Deposit into and redeem from on-chain yield vaults",
    version,
    propagate_version = true
)]
pub struct DashboardCli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the interactive dashboard.
    Run(RunArgs),
    /// Print the remote stats of every vault.
    Stats,
    /// Print share and USDC balances of an address.
    Balances(BalancesArgs),
    /// Deposit USDC into a vault from the connected wallet.
    Deposit(FlowArgs),
    /// Redeem vault shares for USDC to the connected wallet.
    Redeem(FlowArgs),
    /// Print the configured vaults.
    Vaults,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Open the deposit dialog for this vault once data has loaded
    /// (`arbitrum`/`defi` or `base`/`stable`).
    #[arg(long, value_parser = parse_vault)]
    pub open_deposit: Option<NetworkKey>,
}

#[derive(Parser, Debug)]
pub struct BalancesArgs {
    /// Account to look up.
    #[arg(value_parser = parse_address)]
    pub address: Address,
}

#[derive(Parser, Debug)]
pub struct FlowArgs {
    /// Target vault (`arbitrum`/`defi` or `base`/`stable`).
    #[arg(long, value_parser = parse_vault)]
    pub vault: NetworkKey,

    /// Amount in USDC for deposits or shares for redemptions, or `max`.
    #[arg(long)]
    pub amount: String,
}

fn parse_vault(value: &str) -> Result<NetworkKey, String> {
    value.parse::<NetworkKey>().map_err(|e| e.user_message())
}

fn parse_address(value: &str) -> Result<Address, String> {
    value.parse::<Address>().map_err(|e| format!("invalid address: {}", e))
}

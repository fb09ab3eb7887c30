//! # Deposit / Redeem Pipelines
//!
//! Each flow is a fixed sequence of fallible steps that short-circuits on
//! the first failure:
//!
//! - **Deposit**: validate → network check → allowance check → approve
//!   (only when the allowance is short, awaited to confirmation) →
//!   `buyShares` → confirmation.
//! - **Redeem**: validate → network check → `redeemSharesForSpecificAssets`
//!   → confirmation.
//!
//! Validation failures return before the wallet is touched. Signature
//! prompts never overlap within a flow and no step has a timeout.

use std::{fmt, str::FromStr, sync::Arc};

use alloy_primitives::{Address, Bytes, B256, U256};
use shared::{
    ensure_within_balance, min_shares_out, parse_amount, to_base_units, DashboardError,
    DashboardResult, NetworkKey, TxKind, UserPosition, VaultConfig, SHARE_DECIMALS,
    STABLECOIN_DECIMALS,
};
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    config::TxPolicy,
    contracts,
    services::{TxRequest, WalletError, WalletProvider},
};

/// Progress points reported while a flow runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStep {
    Preparing,
    CheckingAllowance,
    Approving,
    Depositing,
    Redeeming,
    Confirming,
}

impl FlowStep {
    pub fn button_label(&self) -> &'static str {
        match self {
            FlowStep::Preparing => "Preparing...",
            FlowStep::CheckingAllowance => "Checking allowance...",
            FlowStep::Approving => "Approving USDC...",
            FlowStep::Depositing => "Depositing...",
            FlowStep::Redeeming => "Redeeming...",
            FlowStep::Confirming => "Confirming...",
        }
    }

    /// Steps that wait on a wallet prompt tell the user so.
    pub fn prompt(&self) -> Option<&'static str> {
        match self {
            FlowStep::Approving => Some("Please approve USDC spending in your wallet..."),
            FlowStep::Depositing => Some("Please confirm the deposit in your wallet..."),
            FlowStep::Redeeming => Some("Please confirm the redemption in your wallet..."),
            _ => None,
        }
    }
}

pub trait ProgressSink: Send + Sync {
    fn step(&self, kind: TxKind, step: FlowStep);
}

/// Amount typed into a dialog. `Max` takes the exact on-chain balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmountInput {
    Exact(String),
    Max,
}

impl FromStr for AmountInput {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("max") {
            Ok(AmountInput::Max)
        } else {
            Ok(AmountInput::Exact(trimmed.to_string()))
        }
    }
}

impl fmt::Display for AmountInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmountInput::Exact(amount) => f.write_str(amount),
            AmountInput::Max => f.write_str("max"),
        }
    }
}

/// Everything a flow needs, captured when the user submits.
#[derive(Debug, Clone)]
pub struct FlowRequest {
    pub vault: VaultConfig,
    pub owner: Option<Address>,
    pub amount: AmountInput,
    /// Cached position for `vault`'s network at submit time.
    pub position: UserPosition,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowOutcome {
    pub kind: TxKind,
    pub network: NetworkKey,
    pub owner: Address,
    /// Integer amount sent on-chain (stablecoin units or share units).
    pub amount: U256,
    pub approval_tx: Option<B256>,
    pub min_shares_out: Option<U256>,
    pub tx_hash: B256,
    pub tx_url: String,
}

pub struct TransactionExecutor {
    wallet: Arc<dyn WalletProvider>,
    policy: TxPolicy,
}

impl TransactionExecutor {
    pub fn new(wallet: Arc<dyn WalletProvider>, policy: TxPolicy) -> Self {
        Self { wallet, policy }
    }

    pub async fn execute(
        &self,
        kind: TxKind,
        request: FlowRequest,
        progress: &dyn ProgressSink,
    ) -> DashboardResult<FlowOutcome> {
        match kind {
            TxKind::Deposit => self.deposit(request, progress).await,
            TxKind::Redeem => self.redeem(request, progress).await,
        }
    }

    pub async fn deposit(
        &self,
        request: FlowRequest,
        progress: &dyn ProgressSink,
    ) -> DashboardResult<FlowOutcome> {
        let span = tracing::info_span!(
            "deposit",
            flow_id = %Uuid::new_v4(),
            network = %request.vault.key,
            amount = %request.amount
        );
        let result = self.run_deposit(request, progress).instrument(span.clone()).await;
        log_outcome(&span, TxKind::Deposit, &result);
        result
    }

    pub async fn redeem(
        &self,
        request: FlowRequest,
        progress: &dyn ProgressSink,
    ) -> DashboardResult<FlowOutcome> {
        let span = tracing::info_span!(
            "redeem",
            flow_id = %Uuid::new_v4(),
            network = %request.vault.key,
            amount = %request.amount
        );
        let result = self.run_redeem(request, progress).instrument(span.clone()).await;
        log_outcome(&span, TxKind::Redeem, &result);
        result
    }

    async fn run_deposit(
        &self,
        request: FlowRequest,
        progress: &dyn ProgressSink,
    ) -> DashboardResult<FlowOutcome> {
        let vault = &request.vault;
        let amount = resolve_amount(
            &request.amount,
            request.position.raw_stablecoin,
            STABLECOIN_DECIMALS,
            "USDC",
        )?;
        let owner = request.owner.ok_or_else(wallet_not_connected)?;

        progress.step(TxKind::Deposit, FlowStep::Preparing);
        self.ensure_network(vault).await?;

        progress.step(TxKind::Deposit, FlowStep::CheckingAllowance);
        let allowance = self
            .read_uint(vault.stablecoin, contracts::allowance(owner, vault.controller))
            .await
            .map_err(|e| DashboardError::TransactionFailed(e.reason()))?;
        tracing::debug!("Allowance for controller {}: {}", vault.controller, allowance);

        let approval_tx = if allowance < amount {
            progress.step(TxKind::Deposit, FlowStep::Approving);
            let hash = self
                .submit_and_confirm(owner, vault.stablecoin, contracts::approve(vault.controller, U256::MAX))
                .await
                .map_err(|e| DashboardError::ApprovalFailed(e.reason()))?;
            tracing::info!("USDC approval confirmed: {}", hash);
            Some(hash)
        } else {
            None
        };

        progress.step(TxKind::Deposit, FlowStep::Depositing);
        let min_shares = min_shares_out(amount, self.policy.deposit_slippage_bps);
        let tx_hash = self
            .send(owner, vault.controller, contracts::buy_shares(amount, min_shares))
            .await
            .map_err(|e| DashboardError::TransactionFailed(e.reason()))?;

        progress.step(TxKind::Deposit, FlowStep::Confirming);
        self.wallet
            .wait_for_receipt(tx_hash)
            .await
            .map_err(|e| DashboardError::TransactionFailed(e.reason()))?;

        Ok(FlowOutcome {
            kind: TxKind::Deposit,
            network: vault.key,
            owner,
            amount,
            approval_tx,
            min_shares_out: Some(min_shares),
            tx_hash,
            tx_url: vault.tx_url(&tx_hash),
        })
    }

    async fn run_redeem(
        &self,
        request: FlowRequest,
        progress: &dyn ProgressSink,
    ) -> DashboardResult<FlowOutcome> {
        let vault = &request.vault;
        let shares = resolve_amount(
            &request.amount,
            request.position.raw_shares,
            SHARE_DECIMALS,
            "shares",
        )?;
        let owner = request.owner.ok_or_else(wallet_not_connected)?;

        progress.step(TxKind::Redeem, FlowStep::Preparing);
        self.ensure_network(vault).await?;

        progress.step(TxKind::Redeem, FlowStep::Redeeming);
        let call = contracts::redeem_shares_for_specific_assets(
            owner,
            shares,
            vault.stablecoin,
            self.policy.redeem_payout_bps,
        );
        let tx_hash = self
            .send(owner, vault.controller, call)
            .await
            .map_err(|e| DashboardError::TransactionFailed(e.reason()))?;

        progress.step(TxKind::Redeem, FlowStep::Confirming);
        self.wallet
            .wait_for_receipt(tx_hash)
            .await
            .map_err(|e| DashboardError::TransactionFailed(e.reason()))?;

        Ok(FlowOutcome {
            kind: TxKind::Redeem,
            network: vault.key,
            owner,
            amount: shares,
            approval_tx: None,
            min_shares_out: None,
            tx_hash,
            tx_url: vault.tx_url(&tx_hash),
        })
    }

    /// Makes sure the wallet is on the vault's chain, switching when the
    /// wallet allows it. Never lets a flow continue on another chain.
    async fn ensure_network(&self, vault: &VaultConfig) -> DashboardResult<()> {
        let current = self
            .wallet
            .chain_id()
            .await
            .map_err(|e| DashboardError::WalletUnavailable(e.reason()))?;
        if current == vault.chain_id {
            return Ok(());
        }

        let wrong_network =
            || DashboardError::NetworkMismatch(format!("Wrong network. Please switch to {}.", vault.network));

        if !self.wallet.supports_network_switch() {
            return Err(wrong_network());
        }

        tracing::info!("Switching wallet from chain {} to {}", current, vault.chain_id);
        if let Err(e) = self.wallet.switch_network(vault.chain_id).await {
            tracing::warn!("Network switch to {} failed: {}", vault.chain_id, e);
            return Err(wrong_network());
        }

        let switched = self
            .wallet
            .chain_id()
            .await
            .map_err(|e| DashboardError::WalletUnavailable(e.reason()))?;
        if switched != vault.chain_id {
            return Err(wrong_network());
        }
        Ok(())
    }

    async fn read_uint(&self, to: Address, data: Bytes) -> Result<U256, WalletError> {
        let raw = self.wallet.call(to, data).await?;
        contracts::decode_uint(&raw).map_err(|e| {
            WalletError::Rpc(crate::rpc::RpcError::Decode(e.to_string()))
        })
    }

    async fn send(&self, from: Address, to: Address, data: Bytes) -> Result<B256, WalletError> {
        let hash = self
            .wallet
            .send_transaction(TxRequest { from, to, data })
            .await?;
        tracing::info!("Submitted transaction {} to {}", hash, to);
        Ok(hash)
    }

    async fn submit_and_confirm(&self, from: Address, to: Address, data: Bytes) -> Result<B256, WalletError> {
        let hash = self.send(from, to, data).await?;
        self.wallet.wait_for_receipt(hash).await?;
        Ok(hash)
    }
}

fn wallet_not_connected() -> DashboardError {
    DashboardError::WalletUnavailable("Wallet not connected".to_string())
}

/// Converts the typed amount to the token's integer units and checks it
/// against the cached raw balance.
fn resolve_amount(
    input: &AmountInput,
    raw_balance: U256,
    decimals: u8,
    asset: &str,
) -> DashboardResult<U256> {
    match input {
        AmountInput::Max => {
            if raw_balance.is_zero() {
                return Err(DashboardError::Validation(format!("Insufficient {} balance", asset)));
            }
            Ok(raw_balance)
        }
        AmountInput::Exact(text) => {
            parse_amount(text)?;
            let units = to_base_units(text, decimals)?;
            if units.is_zero() {
                return Err(DashboardError::Validation("Please enter a valid amount".to_string()));
            }
            ensure_within_balance(units, raw_balance, asset)?;
            Ok(units)
        }
    }
}

fn log_outcome(span: &tracing::Span, kind: TxKind, result: &DashboardResult<FlowOutcome>) {
    let _entered = span.enter();
    match result {
        Ok(outcome) => tracing::info!("{} confirmed: {}", kind, outcome.tx_url),
        Err(DashboardError::Validation(reason)) => tracing::debug!("{} rejected: {}", kind, reason),
        Err(e) => tracing::error!("{} error ({}): {}", kind, e.kind(), e),
    }
}

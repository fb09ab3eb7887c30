use std::{
    future::Future,
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use alloy_primitives::{Address, Bytes, B256, U64};
use async_trait::async_trait;
use serde_json::json;

use crate::rpc::{JsonRpcClient, RpcError, TxReceipt};

/// EIP-1193 "user rejected the request".
const USER_REJECTED: i64 = 4001;
/// EIP-1193 "unsupported method".
const UNSUPPORTED_METHOD: i64 = 4200;
/// EIP-3326 "unrecognized chain id".
const UNRECOGNIZED_CHAIN: i64 = 4902;
const METHOD_NOT_FOUND: i64 = -32601;

/// Unsigned transaction handed to the wallet for signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRequest {
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
}

/// The signing wallet. Every method that submits a transaction may block on
/// a user prompt for as long as the user takes to answer it.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn accounts(&self) -> Result<Vec<Address>, WalletError>;

    async fn chain_id(&self) -> Result<u64, WalletError>;

    fn supports_network_switch(&self) -> bool;

    async fn switch_network(&self, chain_id: u64) -> Result<(), WalletError>;

    /// Read-only call through the wallet's own provider.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, WalletError>;

    async fn send_transaction(&self, tx: TxRequest) -> Result<B256, WalletError>;

    /// Waits until the transaction is mined. Fails if it reverted.
    async fn wait_for_receipt(&self, hash: B256) -> Result<TxReceipt, WalletError>;
}

/// Wallet reached over JSON-RPC (desktop wallets and signers expose
/// `eth_sendTransaction` on a local port and prompt the user per request).
pub struct RpcWallet {
    rpc: JsonRpcClient,
    poll_interval: Duration,
    switch_supported: AtomicBool,
}

impl RpcWallet {
    pub fn new(rpc: JsonRpcClient, poll_interval: Duration) -> Self {
        Self {
            rpc,
            poll_interval,
            switch_supported: AtomicBool::new(true),
        }
    }
}

#[async_trait]
impl WalletProvider for RpcWallet {
    async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
        Ok(self.rpc.request("eth_accounts", json!([])).await?)
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        Ok(self.rpc.chain_id().await?)
    }

    fn supports_network_switch(&self) -> bool {
        self.switch_supported.load(Ordering::Relaxed)
    }

    async fn switch_network(&self, chain_id: u64) -> Result<(), WalletError> {
        let params = json!([{ "chainId": U64::from(chain_id) }]);
        match self
            .rpc
            .request::<serde_json::Value>("wallet_switchEthereumChain", params)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if matches!(e.code(), Some(UNSUPPORTED_METHOD | METHOD_NOT_FOUND)) => {
                self.switch_supported.store(false, Ordering::Relaxed);
                Err(WalletError::SwitchUnsupported)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, WalletError> {
        Ok(self.rpc.eth_call(to, data).await?)
    }

    async fn send_transaction(&self, tx: TxRequest) -> Result<B256, WalletError> {
        let params = json!([{ "from": tx.from, "to": tx.to, "data": tx.data }]);
        Ok(self.rpc.request("eth_sendTransaction", params).await?)
    }

    async fn wait_for_receipt(&self, hash: B256) -> Result<TxReceipt, WalletError> {
        poll_receipt(hash, self.poll_interval, || self.rpc.transaction_receipt(hash)).await
    }
}

/// Polls until the receipt shows up. The transaction is already broadcast,
/// so transport and decode failures are retried rather than ending the
/// wait; only a revert or an error object from the endpoint does.
async fn poll_receipt<F, Fut>(
    hash: B256,
    poll_interval: Duration,
    mut fetch: F,
) -> Result<TxReceipt, WalletError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<TxReceipt>, RpcError>>,
{
    let mut interval = tokio::time::interval(poll_interval);
    loop {
        interval.tick().await;
        match fetch().await {
            Ok(Some(receipt)) => {
                if !receipt.succeeded() {
                    return Err(WalletError::Reverted(hash));
                }
                tracing::debug!("Transaction {} mined in block {:?}", hash, receipt.block_number);
                return Ok(receipt);
            }
            Ok(None) => {}
            Err(e @ (RpcError::Transport(_) | RpcError::Decode(_))) => {
                tracing::warn!("Receipt poll for {} failed, retrying: {}", hash, e);
            }
            Err(e) => return Err(e.into()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("{0}")]
    Rejected(String),

    #[error("Network switching is not supported by this wallet")]
    SwitchUnsupported,

    #[error("Chain is not configured in the wallet: {0}")]
    UnknownChain(String),

    #[error("Transaction {0} reverted")]
    Reverted(B256),

    #[error(transparent)]
    Rpc(RpcError),
}

impl WalletError {
    /// Reason string suitable for a dialog's status line.
    pub fn reason(&self) -> String {
        match self {
            WalletError::Rejected(message) | WalletError::UnknownChain(message) => message.clone(),
            WalletError::Reverted(_) => "Transaction reverted".to_string(),
            WalletError::Rpc(RpcError::Rpc { message, .. }) => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<RpcError> for WalletError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::Rpc { code: USER_REJECTED, message, .. } => WalletError::Rejected(message),
            RpcError::Rpc {
                code: UNRECOGNIZED_CHAIN,
                message,
                ..
            } => WalletError::UnknownChain(message),
            other => WalletError::Rpc(other),
        }
    }
}

use std::collections::HashMap;

use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use futures_util::future::join_all;
use shared::{NetworkKey, UserPosition};

use crate::{
    config::Config,
    contracts,
    rpc::{JsonRpcClient, RpcError},
    services::{AppState, ReaderError},
};

/// Read-only contract calls against each network's public endpoint.
#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn call(&self, network: NetworkKey, to: Address, data: Bytes) -> Result<Bytes, RpcError>;
}

pub struct RpcChainReader {
    clients: HashMap<NetworkKey, JsonRpcClient>,
}

impl RpcChainReader {
    pub fn from_config(config: &Config) -> Result<Self, RpcError> {
        let mut clients = HashMap::new();
        for (key, vault) in &config.vaults {
            clients.insert(*key, JsonRpcClient::new(vault.rpc_url.clone(), Some(config.http_timeout))?);
        }
        Ok(Self { clients })
    }
}

#[async_trait]
impl ChainReader for RpcChainReader {
    async fn call(&self, network: NetworkKey, to: Address, data: Bytes) -> Result<Bytes, RpcError> {
        let client = self
            .clients
            .get(&network)
            .ok_or_else(|| RpcError::Transport(format!("no RPC endpoint for {}", network)))?;
        client.eth_call(to, data).await
    }
}

pub struct BalanceReader;

impl BalanceReader {
    pub async fn balance_of(
        state: &AppState,
        network: NetworkKey,
        token: Address,
        owner: Address,
    ) -> Result<U256, ReaderError> {
        let data = state
            .chain
            .call(network, token, contracts::balance_of(owner))
            .await?;
        contracts::decode_uint(&data).map_err(|e| ReaderError::Decode(e.to_string()))
    }

    /// Share and stablecoin balances for one network, read concurrently.
    pub async fn fetch_position(
        state: &AppState,
        network: NetworkKey,
        owner: Address,
    ) -> Result<UserPosition, ReaderError> {
        let vault = state.config.vault(network);
        let (shares, stablecoin) = tokio::try_join!(
            Self::balance_of(state, network, vault.vault, owner),
            Self::balance_of(state, network, vault.stablecoin, owner),
        )?;
        Ok(UserPosition::from_raw(shares, stablecoin))
    }

    /// Refreshes the position on every network in parallel. A network whose
    /// reads fail keeps its previous snapshot. Returns how many were replaced.
    pub async fn refresh_position(state: &AppState, owner: Address) -> usize {
        let results = join_all(NetworkKey::ALL.iter().map(|network| async move {
            match Self::fetch_position(state, *network, owner).await {
                Ok(position) => {
                    tracing::debug!(
                        "Loaded {} balances for {}: {} shares, {} USDC",
                        network,
                        owner,
                        position.share_balance,
                        position.stablecoin_balance
                    );
                    state.store.replace_position(*network, position);
                    true
                }
                Err(e) => {
                    tracing::error!("Error loading {} balances: {}", network, e);
                    false
                }
            }
        }))
        .await;
        results.into_iter().filter(|updated| *updated).count()
    }
}

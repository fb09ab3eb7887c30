pub mod balance_reader;
pub mod executor;
pub mod stats_reader;
pub mod wallet;
pub mod wallet_watcher;

use std::sync::Arc;

pub use balance_reader::*;
pub use executor::*;
pub use stats_reader::*;
pub use wallet::*;
pub use wallet_watcher::*;

use shared::DashboardError;

use crate::{config::Config, rpc::RpcError, store::Store};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Store,
    pub stats_source: Arc<dyn StatsSource>,
    pub chain: Arc<dyn ChainReader>,
    pub wallet: Arc<dyn WalletProvider>,
}

#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

impl From<ReaderError> for DashboardError {
    fn from(err: ReaderError) -> Self {
        DashboardError::DataFetchFailed(err.to_string())
    }
}

use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;
use serde_json::Value;
use shared::{NetworkKey, VaultStats};

use crate::services::{AppState, ReaderError};

/// Remote source of vault display metrics.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatsSource: Send + Sync {
    async fn fetch(&self, network: NetworkKey) -> Result<Value, ReaderError>;
}

/// `GET <endpoint>?action=get&network=<key>` returning a JSON stats record.
pub struct HttpStatsSource {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpStatsSource {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ReaderError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ReaderError::Http(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl StatsSource for HttpStatsSource {
    async fn fetch(&self, network: NetworkKey) -> Result<Value, ReaderError> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("action", "get"), ("network", network.as_str())])
            .header(reqwest::header::CACHE_CONTROL, "no-store")
            .send()
            .await
            .map_err(|e| ReaderError::Http(e.to_string()))?;

        response
            .json::<Value>()
            .await
            .map_err(|e| ReaderError::MalformedPayload(e.to_string()))
    }
}

pub struct StatsReader;

impl StatsReader {
    pub async fn fetch_stats(state: &AppState, network: NetworkKey) -> Result<VaultStats, ReaderError> {
        let payload = state.stats_source.fetch(network).await?;
        VaultStats::from_payload(&payload)
            .ok_or_else(|| ReaderError::MalformedPayload(format!("no share_price in {}", payload)))
    }

    /// Replaces the network's stats snapshot on success. Failures are logged
    /// and leave the previous snapshot in place. Returns whether the snapshot
    /// was replaced.
    pub async fn refresh_stats(state: &AppState, network: NetworkKey) -> bool {
        match Self::fetch_stats(state, network).await {
            Ok(stats) => {
                tracing::debug!(
                    "Loaded {} vault data: price {}, monthly {}%, aum {}",
                    network,
                    stats.share_price,
                    stats.monthly_return,
                    stats.aum
                );
                state.store.replace_stats(network, stats);
                true
            }
            Err(e) => {
                tracing::error!("Error loading {} vault data: {}", network, e);
                false
            }
        }
    }

    /// Refreshes every network concurrently; returns how many succeeded.
    pub async fn refresh_all_stats(state: &AppState) -> usize {
        let results = join_all(
            NetworkKey::ALL
                .iter()
                .map(|network| Self::refresh_stats(state, *network)),
        )
        .await;
        results.into_iter().filter(|updated| *updated).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{state_with, FakeChain, FakeWallet};
    use serde_json::json;

    #[tokio::test]
    async fn failure_on_one_network_leaves_both_snapshots_intact() {
        let mut source = MockStatsSource::new();
        source.expect_fetch().returning(|network| match network {
            NetworkKey::Arbitrum => Err(ReaderError::Http("connection reset".into())),
            NetworkKey::Base => Ok(json!({ "share_price": 1.02, "monthly_return": 0.9, "aum": 1200 })),
        });
        let state = state_with(source, FakeChain::default(), FakeWallet::default());

        let previous = VaultStats {
            share_price: 1.37,
            monthly_return: 2.1,
            aum: 5_000.0,
            updated_at: None,
        };
        state.store.replace_stats(NetworkKey::Arbitrum, previous.clone());

        assert_eq!(StatsReader::refresh_all_stats(&state).await, 1);
        assert_eq!(state.store.stats(NetworkKey::Arbitrum), previous);
        assert_eq!(state.store.stats(NetworkKey::Base).share_price, 1.02);
        assert_eq!(state.store.stats(NetworkKey::Base).aum, 1200.0);
    }

    #[tokio::test]
    async fn malformed_payload_is_not_applied() {
        let mut source = MockStatsSource::new();
        source
            .expect_fetch()
            .times(1)
            .returning(|_| Ok(json!({ "error": "rate limited" })));
        let state = state_with(source, FakeChain::default(), FakeWallet::default());

        assert!(!StatsReader::refresh_stats(&state, NetworkKey::Base).await);
        assert_eq!(state.store.stats(NetworkKey::Base), VaultStats::default());
    }
}

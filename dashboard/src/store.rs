use std::sync::Arc;

use dashmap::DashMap;
use shared::{NetworkKey, PortfolioSummary, UserPosition, VaultStats};

/// In-memory snapshots of per-network stats and the connected user's
/// position. Records are only ever swapped whole, so readers see either the
/// previous snapshot or the new one.
#[derive(Clone)]
pub struct Store {
    positions: Arc<DashMap<NetworkKey, UserPosition>>,
    stats: Arc<DashMap<NetworkKey, VaultStats>>,
}

impl Store {
    pub fn new() -> Self {
        let positions = DashMap::new();
        let stats = DashMap::new();
        for key in NetworkKey::ALL {
            positions.insert(key, UserPosition::default());
            stats.insert(key, VaultStats::default());
        }

        Self {
            positions: Arc::new(positions),
            stats: Arc::new(stats),
        }
    }

    pub fn position(&self, key: NetworkKey) -> UserPosition {
        self.positions
            .get(&key)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    pub fn stats(&self, key: NetworkKey) -> VaultStats {
        self.stats
            .get(&key)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    pub fn replace_position(&self, key: NetworkKey, position: UserPosition) {
        self.positions.insert(key, position);
    }

    pub fn replace_stats(&self, key: NetworkKey, stats: VaultStats) {
        self.stats.insert(key, stats);
    }

    pub fn portfolio(&self) -> PortfolioSummary {
        let entries: Vec<_> = NetworkKey::ALL
            .iter()
            .map(|key| (*key, self.position(*key), self.stats(*key)))
            .collect();
        PortfolioSummary::compute(&entries)
    }

    pub fn entry_counts(&self) -> StoreStats {
        StoreStats {
            position_entries: self.positions.len(),
            stats_entries: self.stats.len(),
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, serde::Serialize)]
pub struct StoreStats {
    pub position_entries: usize,
    pub stats_entries: usize,
}

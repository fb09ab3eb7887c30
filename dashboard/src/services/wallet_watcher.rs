use std::{sync::Arc, time::Duration};

use alloy_primitives::Address;
use tokio::{sync::mpsc::UnboundedSender, time};

use crate::{
    controller::{AppEvent, WalletEvent},
    services::WalletProvider,
};

/// Polls the wallet's accounts and reports connection changes on the
/// controller's channel. `known` is the account the controller already
/// started with. Exits when the channel closes.
pub async fn run_wallet_watcher(
    wallet: Arc<dyn WalletProvider>,
    events: UnboundedSender<AppEvent>,
    poll_interval: Duration,
    mut known: Option<Address>,
) {
    let mut interval = time::interval(poll_interval);
    tracing::info!("Wallet watcher started (interval: {:?})", poll_interval);

    loop {
        interval.tick().await;

        let current = match wallet.accounts().await {
            Ok(accounts) => accounts.first().copied(),
            Err(e) => {
                tracing::debug!("Wallet account poll failed, treating as disconnected: {}", e);
                None
            }
        };

        if let Some(event) = account_transition(known, current) {
            known = current;
            if events.send(AppEvent::Wallet(event)).is_err() {
                tracing::debug!("Controller channel closed, stopping wallet watcher");
                break;
            }
        }
    }
}

/// Event to emit when the active account moves from `previous` to `current`.
pub fn account_transition(previous: Option<Address>, current: Option<Address>) -> Option<WalletEvent> {
    match (previous, current) {
        (prev, Some(address)) if prev != Some(address) => Some(WalletEvent::Connected(address)),
        (Some(_), None) => Some(WalletEvent::Disconnected),
        _ => None,
    }
}

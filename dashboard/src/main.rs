//! # Vault Dashboard
//!
//! Terminal client for two on-chain yield vaults (Arbitrum and Base). Shows
//! vault stats and the connected wallet's positions, and drives the
//! deposit and redemption transactions through the user's wallet.
//!
//! ## Architecture
//!
//! 1. **Configuration**: environment variables, see `config`
//! 2. **Readers**: remote stats API and per-network balance reads
//! 3. **Executor**: deposit/redeem pipelines against the wallet
//! 4. **Controller**: owns the session and dialogs and consumes a single
//!    event channel fed by the wallet watcher, stdin and finished flows
//! 5. **UI**: console rendering behind the `Ui` trait

use std::{collections::BTreeMap, sync::Arc};

use alloy_primitives::Address;
use anyhow::{bail, Context};
use clap::Parser;
use futures_util::future::join_all;
use shared::{NetworkKey, TxKind};
use tokio::io::{AsyncBufReadExt, BufReader};

mod cli;
mod commands;
mod config;
mod contracts;
mod controller;
mod logging;
mod rpc;
mod services;
mod store;
mod ui;

#[cfg(test)]
mod testing;

use cli::{Commands, DashboardCli, FlowArgs};
use config::Config;
use controller::{AppEvent, Controller};
use rpc::JsonRpcClient;
use services::{
    AppState, BalanceReader, FlowRequest, HttpStatsSource, RpcChainReader, RpcWallet, StatsReader,
    TransactionExecutor,
};
use store::Store;
use ui::{ConsoleUi, StatusMessage, Ui};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let cli = DashboardCli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;
    logging::init_logging("vault_dashboard=info", config.log_format);

    let state = build_state(config)?;

    match cli.command {
        Commands::Run(args) => run_interactive(state, args.open_deposit).await,
        Commands::Stats => print_stats(&state).await,
        Commands::Balances(args) => print_balances(&state, args.address).await,
        Commands::Deposit(args) => run_flow(&state, TxKind::Deposit, args).await,
        Commands::Redeem(args) => run_flow(&state, TxKind::Redeem, args).await,
        Commands::Vaults => {
            let vaults: Vec<_> = state.config.vaults.values().collect();
            println!("{}", serde_json::to_string_pretty(&vaults)?);
            Ok(())
        }
    }
}

fn build_state(config: Config) -> anyhow::Result<AppState> {
    let stats_source = HttpStatsSource::new(config.stats_api_url.clone(), config.http_timeout)?;
    let chain = RpcChainReader::from_config(&config)?;
    // Wallet prompts wait on the user, so no request timeout.
    let wallet_rpc = JsonRpcClient::new(config.wallet_rpc_url.clone(), None)?;
    tracing::info!("Wallet RPC client initialized: {}", wallet_rpc.url());
    let wallet = RpcWallet::new(wallet_rpc, config.receipt_poll_interval);

    Ok(AppState {
        config: Arc::new(config),
        store: Store::new(),
        stats_source: Arc::new(stats_source),
        chain: Arc::new(chain),
        wallet: Arc::new(wallet),
    })
}

async fn run_interactive(state: AppState, open_deposit: Option<NetworkKey>) -> anyhow::Result<()> {
    tracing::info!("Starting vault dashboard");
    let ui = Arc::new(ConsoleUi::new(state.config.vaults.clone()));
    ui.notice(commands::HELP);

    let (mut controller, receiver) = Controller::new(state.clone(), ui, open_deposit);
    let initial = controller.start().await;

    tokio::spawn(services::run_wallet_watcher(
        state.wallet.clone(),
        controller.sender(),
        state.config.account_poll_interval,
        initial,
    ));

    let events = controller.sender();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    for command in commands::parse_line(&line) {
                        if events.send(AppEvent::Command(command)).is_err() {
                            return;
                        }
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
        let _ = events.send(AppEvent::Command(commands::UserCommand::Quit));
    });

    controller.run(receiver).await;
    Ok(())
}

async fn print_stats(state: &AppState) -> anyhow::Result<()> {
    let results = join_all(
        NetworkKey::ALL
            .iter()
            .map(|network| StatsReader::fetch_stats(state, *network)),
    )
    .await;

    let mut stats = BTreeMap::new();
    for (network, result) in NetworkKey::ALL.iter().zip(results) {
        match result {
            Ok(snapshot) => {
                stats.insert(*network, snapshot);
            }
            Err(e) => tracing::error!("Error loading {} vault data: {}", network, e),
        }
    }
    if stats.is_empty() {
        bail!("No vault stats could be loaded");
    }
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

async fn print_balances(state: &AppState, address: Address) -> anyhow::Result<()> {
    StatsReader::refresh_all_stats(state).await;
    let loaded = BalanceReader::refresh_position(state, address).await;
    if loaded == 0 {
        bail!("No balances could be loaded for {}", address);
    }
    ConsoleUi::new(state.config.vaults.clone()).render_dashboard(Some(address), &state.store.portfolio());
    Ok(())
}

async fn run_flow(state: &AppState, kind: TxKind, args: FlowArgs) -> anyhow::Result<()> {
    let accounts = state
        .wallet
        .accounts()
        .await
        .with_context(|| format!("Wallet not reachable at {}", state.config.wallet_rpc_url))?;
    let Some(owner) = accounts.first().copied() else {
        bail!("Wallet not connected");
    };

    let position = BalanceReader::fetch_position(state, args.vault, owner)
        .await
        .context("Failed to load balances")?;
    let request = FlowRequest {
        vault: state.config.vault(args.vault).clone(),
        owner: Some(owner),
        amount: args.amount.parse()?,
        position,
    };

    let ui = ConsoleUi::new(state.config.vaults.clone());
    ui.open_dialog(kind, &request.vault);
    let executor = TransactionExecutor::new(state.wallet.clone(), state.config.policy);

    match executor.execute(kind, request, &ui).await {
        Ok(outcome) => {
            ui.show_message(kind, &StatusMessage::success(format!("Confirmed: {}", outcome.tx_url)));
            Ok(())
        }
        Err(e) => {
            ui.show_message(kind, &StatusMessage::error(e.user_message()));
            Err(e.into())
        }
    }
}

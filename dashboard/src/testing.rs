//! Test doubles shared by the unit tests.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
    time::Duration,
};

use alloy_primitives::{Address, Bytes, B256, U256, U64};
use async_trait::async_trait;
use shared::{NetworkKey, PortfolioSummary, TxKind, VaultConfig};

use crate::{
    config::{default_vaults, Config},
    rpc::{RpcError, TxReceipt},
    services::{AppState, ChainReader, FlowStep, ProgressSink, StatsSource, TxRequest, WalletError, WalletProvider},
    store::Store,
    ui::{ButtonState, StatusMessage, Ui, View},
};

pub fn test_owner() -> Address {
    Address::repeat_byte(0xab)
}

pub fn test_config() -> Config {
    let mut config = Config::from_lookup(|_| None).expect("default config");
    config.dialog_close_delay = Duration::ZERO;
    config.pending_deposit_delay = Duration::ZERO;
    config.receipt_poll_interval = Duration::from_millis(1);
    config
}

pub fn state_with<S, W>(stats: S, chain: FakeChain, wallet: W) -> AppState
where
    S: StatsSource + 'static,
    W: Into<Arc<FakeWallet>>,
{
    let wallet: Arc<FakeWallet> = wallet.into();
    AppState {
        config: Arc::new(test_config()),
        store: Store::new(),
        stats_source: Arc::new(stats),
        chain: Arc::new(chain),
        wallet,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletCall {
    ChainId,
    SwitchNetwork(u64),
    Call { to: Address, data: Bytes },
    Send { to: Address, data: Bytes },
    WaitReceipt(B256),
}

/// Scriptable wallet that records every call it receives.
pub struct FakeWallet {
    calls: Mutex<Vec<WalletCall>>,
    chain_id: Mutex<u64>,
    accounts: Mutex<Vec<Address>>,
    switch_supported: bool,
    allowance: U256,
    reject_sends: Option<String>,
    revert_receipts: bool,
    next_hash: Mutex<u8>,
}

impl Default for FakeWallet {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            chain_id: Mutex::new(42161),
            accounts: Mutex::new(Vec::new()),
            switch_supported: true,
            allowance: U256::ZERO,
            reject_sends: None,
            revert_receipts: false,
            next_hash: Mutex::new(0),
        }
    }
}

impl FakeWallet {
    pub fn on_chain(chain_id: u64) -> Self {
        Self {
            chain_id: Mutex::new(chain_id),
            ..Self::default()
        }
    }

    pub fn with_allowance(mut self, allowance: U256) -> Self {
        self.allowance = allowance;
        self
    }

    pub fn without_switch(mut self) -> Self {
        self.switch_supported = false;
        self
    }

    pub fn rejecting_sends(mut self, message: &str) -> Self {
        self.reject_sends = Some(message.to_string());
        self
    }

    pub fn reverting_receipts(mut self) -> Self {
        self.revert_receipts = true;
        self
    }

    pub fn set_accounts(&self, accounts: Vec<Address>) {
        *self.accounts.lock().unwrap() = accounts;
    }

    /// Hash assigned to the n-th accepted transaction.
    pub fn hash(n: u8) -> B256 {
        B256::with_last_byte(n)
    }

    pub fn calls(&self) -> Vec<WalletCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, WalletCall::Send { .. }))
            .count()
    }

    pub fn last_sent(&self) -> Option<Bytes> {
        self.calls().into_iter().rev().find_map(|call| match call {
            WalletCall::Send { data, .. } => Some(data),
            _ => None,
        })
    }

    fn record(&self, call: WalletCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl WalletProvider for FakeWallet {
    async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        self.record(WalletCall::ChainId);
        Ok(*self.chain_id.lock().unwrap())
    }

    fn supports_network_switch(&self) -> bool {
        self.switch_supported
    }

    async fn switch_network(&self, chain_id: u64) -> Result<(), WalletError> {
        self.record(WalletCall::SwitchNetwork(chain_id));
        if !self.switch_supported {
            return Err(WalletError::SwitchUnsupported);
        }
        *self.chain_id.lock().unwrap() = chain_id;
        Ok(())
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, WalletError> {
        self.record(WalletCall::Call { to, data });
        Ok(Bytes::from(self.allowance.to_be_bytes::<32>().to_vec()))
    }

    async fn send_transaction(&self, tx: TxRequest) -> Result<B256, WalletError> {
        self.record(WalletCall::Send { to: tx.to, data: tx.data });
        if let Some(message) = &self.reject_sends {
            return Err(WalletError::Rejected(message.clone()));
        }
        let mut next = self.next_hash.lock().unwrap();
        *next += 1;
        Ok(Self::hash(*next))
    }

    async fn wait_for_receipt(&self, hash: B256) -> Result<TxReceipt, WalletError> {
        self.record(WalletCall::WaitReceipt(hash));
        if self.revert_receipts {
            return Err(WalletError::Reverted(hash));
        }
        Ok(TxReceipt {
            transaction_hash: hash,
            status: Some(U64::from(1)),
            block_number: Some(U64::from(100)),
            gas_used: None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    Vault,
    Stablecoin,
}

/// Chain reader answering `balanceOf` from a fixed table.
#[derive(Default)]
pub struct FakeChain {
    balances: HashMap<(NetworkKey, Token), U256>,
    failing: HashSet<NetworkKey>,
}

impl FakeChain {
    pub fn with_balance(mut self, network: NetworkKey, token: Token, amount: U256) -> Self {
        self.balances.insert((network, token), amount);
        self
    }

    pub fn failing(mut self, network: NetworkKey) -> Self {
        self.failing.insert(network);
        self
    }
}

#[async_trait]
impl ChainReader for FakeChain {
    async fn call(&self, network: NetworkKey, to: Address, _data: Bytes) -> Result<Bytes, RpcError> {
        if self.failing.contains(&network) {
            return Err(RpcError::Transport(format!("{} unreachable", network)));
        }
        let vault = &default_vaults()[&network];
        let token = if to == vault.vault { Token::Vault } else { Token::Stablecoin };
        let amount = self.balances.get(&(network, token)).copied().unwrap_or_default();
        Ok(Bytes::from(amount.to_be_bytes::<32>().to_vec()))
    }
}

#[derive(Default)]
pub struct RecordingProgress {
    steps: Mutex<Vec<FlowStep>>,
}

impl RecordingProgress {
    pub fn steps(&self) -> Vec<FlowStep> {
        self.steps.lock().unwrap().clone()
    }
}

impl ProgressSink for RecordingProgress {
    fn step(&self, _kind: TxKind, step: FlowStep) {
        self.steps.lock().unwrap().push(step);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    View(View),
    Dashboard { address: Option<Address>, summary: PortfolioSummary },
    OpenDialog(TxKind, NetworkKey),
    CloseDialog(TxKind),
    Message(TxKind, StatusMessage),
    Button(TxKind, ButtonState),
    Notice(String),
}

#[derive(Default)]
pub struct RecordingUi {
    events: Mutex<Vec<UiEvent>>,
}

impl RecordingUi {
    pub fn events(&self) -> Vec<UiEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn last_dashboard(&self) -> Option<PortfolioSummary> {
        self.events().into_iter().rev().find_map(|event| match event {
            UiEvent::Dashboard { summary, .. } => Some(summary),
            _ => None,
        })
    }

    fn push(&self, event: UiEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl Ui for RecordingUi {
    fn show_view(&self, view: View) {
        self.push(UiEvent::View(view));
    }

    fn render_dashboard(&self, address: Option<Address>, summary: &PortfolioSummary) {
        self.push(UiEvent::Dashboard {
            address,
            summary: summary.clone(),
        });
    }

    fn open_dialog(&self, kind: TxKind, vault: &VaultConfig) {
        self.push(UiEvent::OpenDialog(kind, vault.key));
    }

    fn close_dialog(&self, kind: TxKind) {
        self.push(UiEvent::CloseDialog(kind));
    }

    fn show_message(&self, kind: TxKind, message: &StatusMessage) {
        self.push(UiEvent::Message(kind, message.clone()));
    }

    fn set_button(&self, kind: TxKind, state: &ButtonState) {
        self.push(UiEvent::Button(kind, state.clone()));
    }

    fn notice(&self, text: &str) {
        self.push(UiEvent::Notice(text.to_string()));
    }
}

use std::sync::Arc;

use alloy_primitives::Address;
use shared::{short_address, DashboardResult, NetworkKey, TxKind};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::{
    commands::{UserCommand, HELP},
    services::{
        AmountInput, AppState, BalanceReader, FlowOutcome, FlowRequest, FlowStep, ProgressSink,
        StatsReader, TransactionExecutor,
    },
    ui::{ButtonState, StatusMessage, Ui, View},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletEvent {
    Connected(Address),
    Disconnected,
}

/// Everything the controller reacts to arrives through one channel.
#[derive(Debug)]
pub enum AppEvent {
    Wallet(WalletEvent),
    Command(UserCommand),
    /// Stats and balances for `address` finished loading.
    DataLoaded { address: Address },
    StatsLoaded,
    OpenPendingDeposit { network: NetworkKey },
    FlowProgress { kind: TxKind, step: FlowStep },
    FlowFinished {
        kind: TxKind,
        network: NetworkKey,
        result: DashboardResult<FlowOutcome>,
    },
    BalancesRefreshed,
    CloseDialog { kind: TxKind, generation: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub connected_address: Option<Address>,
    pub selected_vault: NetworkKey,
    pub pending_deposit_target: Option<NetworkKey>,
}

impl Session {
    pub fn new(pending_deposit_target: Option<NetworkKey>) -> Self {
        Self {
            connected_address: None,
            selected_vault: NetworkKey::Arbitrum,
            pending_deposit_target,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogState {
    pub open: bool,
    pub network: NetworkKey,
    pub busy: bool,
    pub message: Option<StatusMessage>,
    /// Bumped on every open so a delayed close only hits the dialog it was
    /// scheduled for.
    pub generation: u64,
}

impl Default for DialogState {
    fn default() -> Self {
        Self {
            open: false,
            network: NetworkKey::Arbitrum,
            busy: false,
            message: None,
            generation: 0,
        }
    }
}

/// Reports flow progress back onto the controller's channel.
struct ChannelProgress {
    events: UnboundedSender<AppEvent>,
}

impl ProgressSink for ChannelProgress {
    fn step(&self, kind: TxKind, step: FlowStep) {
        let _ = self.events.send(AppEvent::FlowProgress { kind, step });
    }
}

pub struct Controller {
    state: AppState,
    ui: Arc<dyn Ui>,
    executor: Arc<TransactionExecutor>,
    events: UnboundedSender<AppEvent>,
    session: Session,
    view: View,
    deposit: DialogState,
    redeem: DialogState,
    active: Option<TxKind>,
}

impl Controller {
    pub fn new(
        state: AppState,
        ui: Arc<dyn Ui>,
        pending_deposit_target: Option<NetworkKey>,
    ) -> (Self, UnboundedReceiver<AppEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let executor = Arc::new(TransactionExecutor::new(
            state.wallet.clone(),
            state.config.policy,
        ));
        let controller = Self {
            state,
            ui,
            executor,
            events,
            session: Session::new(pending_deposit_target),
            view: View::LoggedOut,
            deposit: DialogState::default(),
            redeem: DialogState::default(),
            active: None,
        };
        (controller, receiver)
    }

    pub fn sender(&self) -> UnboundedSender<AppEvent> {
        self.events.clone()
    }

    #[cfg(test)]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[cfg(test)]
    pub fn view(&self) -> View {
        self.view
    }

    pub fn dialog(&self, kind: TxKind) -> &DialogState {
        match kind {
            TxKind::Deposit => &self.deposit,
            TxKind::Redeem => &self.redeem,
        }
    }

    fn dialog_mut(&mut self, kind: TxKind) -> &mut DialogState {
        match kind {
            TxKind::Deposit => &mut self.deposit,
            TxKind::Redeem => &mut self.redeem,
        }
    }

    /// Initial view plus data preload. Returns the account the wallet
    /// already had, which seeds the wallet watcher.
    pub async fn start(&mut self) -> Option<Address> {
        let initial = match self.state.wallet.accounts().await {
            Ok(accounts) => accounts.first().copied(),
            Err(e) => {
                tracing::warn!("Wallet not reachable at startup: {}", e);
                None
            }
        };

        match initial {
            Some(address) => self.on_connected(address),
            None => {
                self.show_view(View::LoggedOut);
                self.spawn_stats_refresh();
            }
        }
        initial
    }

    /// Processes events until `quit` or until every sender is gone.
    pub async fn run(mut self, mut receiver: UnboundedReceiver<AppEvent>) {
        while let Some(event) = receiver.recv().await {
            if !self.handle(event) {
                break;
            }
        }
        tracing::info!("Controller stopped");
    }

    /// Applies one event. Returns `false` when the session should end.
    pub fn handle(&mut self, event: AppEvent) -> bool {
        match event {
            AppEvent::Wallet(WalletEvent::Connected(address)) => self.on_connected(address),
            AppEvent::Wallet(WalletEvent::Disconnected) => self.on_disconnected(),
            AppEvent::Command(command) => return self.on_command(command),
            AppEvent::DataLoaded { address } => self.on_data_loaded(address),
            AppEvent::StatsLoaded | AppEvent::BalancesRefreshed => self.render(),
            AppEvent::OpenPendingDeposit { network } => {
                if self.session.connected_address.is_some() {
                    self.open_dialog(TxKind::Deposit, network);
                }
            }
            AppEvent::FlowProgress { kind, step } => self.on_progress(kind, step),
            AppEvent::FlowFinished { kind, network, result } => self.on_flow_finished(kind, network, result),
            AppEvent::CloseDialog { kind, generation } => {
                let dialog = self.dialog(kind);
                if dialog.open && dialog.generation == generation {
                    self.close_dialog(kind);
                }
            }
        }
        true
    }

    fn on_connected(&mut self, address: Address) {
        tracing::info!("Wallet connected: {}", address);
        self.session.connected_address = Some(address);
        self.show_view(View::LoggedIn);
        self.render();
        self.spawn_full_refresh(address);
    }

    fn on_disconnected(&mut self) {
        tracing::info!("Wallet disconnected");
        self.session.connected_address = None;
        self.show_view(View::LoggedOut);
    }

    fn on_data_loaded(&mut self, address: Address) {
        if self.session.connected_address != Some(address) {
            return;
        }
        self.render();

        if let Some(network) = self.session.pending_deposit_target.take() {
            let events = self.events.clone();
            let delay = self.state.config.pending_deposit_delay;
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let _ = events.send(AppEvent::OpenPendingDeposit { network });
            });
        }
    }

    fn on_command(&mut self, command: UserCommand) -> bool {
        match command {
            UserCommand::Open { kind, network } => {
                if self.dialog(kind).busy {
                    self.ui.notice(&format!("A {} is still in progress", kind));
                } else {
                    self.open_dialog(kind, network);
                }
            }
            UserCommand::Submit(amount) => match self.active {
                Some(kind) if self.dialog(kind).open => self.submit(kind, amount),
                _ => self.ui.notice("No dialog is open. Use `deposit <vault>` or `redeem <vault>`."),
            },
            UserCommand::Close => {
                if let Some(kind) = self.active.filter(|kind| self.dialog(*kind).open) {
                    self.close_dialog(kind);
                }
            }
            UserCommand::Refresh => match self.session.connected_address {
                Some(address) => self.spawn_full_refresh(address),
                None => self.spawn_stats_refresh(),
            },
            UserCommand::Status => self.ui.notice(&self.status_text()),
            UserCommand::Help => self.ui.notice(HELP),
            UserCommand::Quit => return false,
            UserCommand::Unknown(message) => self.ui.notice(&message),
        }
        true
    }

    fn open_dialog(&mut self, kind: TxKind, network: NetworkKey) {
        let dialog = self.dialog_mut(kind);
        dialog.open = true;
        dialog.network = network;
        dialog.message = None;
        dialog.generation += 1;
        self.session.selected_vault = network;
        self.active = Some(kind);

        self.ui.open_dialog(kind, self.state.config.vault(network));
        self.ui.set_button(kind, &ButtonState::Idle);
    }

    fn close_dialog(&mut self, kind: TxKind) {
        let dialog = self.dialog_mut(kind);
        dialog.open = false;
        dialog.message = None;
        if self.active == Some(kind) {
            self.active = None;
        }
        self.ui.close_dialog(kind);
    }

    fn submit(&mut self, kind: TxKind, amount: AmountInput) {
        if self.dialog(kind).busy {
            tracing::debug!("Ignoring {} submit while a flow is running", kind);
            return;
        }
        let network = self.dialog(kind).network;
        self.dialog_mut(kind).busy = true;

        let request = FlowRequest {
            vault: self.state.config.vault(network).clone(),
            owner: self.session.connected_address,
            amount,
            position: self.state.store.position(network),
        };
        let executor = self.executor.clone();
        let events = self.events.clone();

        tokio::spawn(async move {
            let progress = ChannelProgress { events: events.clone() };
            let result = executor.execute(kind, request, &progress).await;
            let _ = events.send(AppEvent::FlowFinished { kind, network, result });
        });
    }

    fn on_progress(&mut self, kind: TxKind, step: FlowStep) {
        if !self.dialog(kind).busy {
            return;
        }
        self.ui.set_button(kind, &ButtonState::Busy(step.button_label()));
        if let Some(prompt) = step.prompt() {
            self.set_message(kind, StatusMessage::info(prompt));
        }
    }

    fn on_flow_finished(&mut self, kind: TxKind, network: NetworkKey, result: DashboardResult<FlowOutcome>) {
        self.dialog_mut(kind).busy = false;
        self.ui.set_button(kind, &ButtonState::Idle);

        match result {
            Ok(outcome) => {
                let headline = match kind {
                    TxKind::Deposit => "Deposit successful!",
                    TxKind::Redeem => "Redemption successful!",
                };
                self.set_message(kind, StatusMessage::success(format!("{} {}", headline, outcome.tx_url)));

                let state = self.state.clone();
                let events = self.events.clone();
                let generation = self.dialog(kind).generation;
                let delay = self.state.config.dialog_close_delay;
                tokio::spawn(async move {
                    BalanceReader::refresh_position(&state, outcome.owner).await;
                    let _ = events.send(AppEvent::BalancesRefreshed);
                    tokio::time::sleep(delay).await;
                    let _ = events.send(AppEvent::CloseDialog { kind, generation });
                });
            }
            Err(e) => {
                tracing::debug!("{} on {} ended with {}", kind, network, e.kind());
                self.set_message(kind, StatusMessage::error(e.user_message()));
            }
        }
    }

    fn set_message(&mut self, kind: TxKind, message: StatusMessage) {
        if !self.dialog(kind).open {
            return;
        }
        self.ui.show_message(kind, &message);
        self.dialog_mut(kind).message = Some(message);
    }

    fn show_view(&mut self, view: View) {
        self.view = view;
        self.ui.show_view(view);
    }

    fn render(&self) {
        if self.view == View::LoggedIn {
            self.ui
                .render_dashboard(self.session.connected_address, &self.state.store.portfolio());
        }
    }

    fn spawn_full_refresh(&self, address: Address) {
        let state = self.state.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            StatsReader::refresh_all_stats(&state).await;
            BalanceReader::refresh_position(&state, address).await;
            let _ = events.send(AppEvent::DataLoaded { address });
        });
    }

    fn spawn_stats_refresh(&self) {
        let state = self.state.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            StatsReader::refresh_all_stats(&state).await;
            let _ = events.send(AppEvent::StatsLoaded);
        });
    }

    fn status_text(&self) -> String {
        let address = self
            .session
            .connected_address
            .map(|a| short_address(&a))
            .unwrap_or_else(|| "not connected".to_string());
        let counts = self.state.store.entry_counts();
        let dialog = |kind: TxKind| {
            let d = self.dialog(kind);
            match (d.open, d.busy) {
                (_, true) => format!("{} ({}, in progress)", kind, d.network),
                (true, false) => format!("{} ({}, open)", kind, d.network),
                (false, false) => format!("{} (closed)", kind),
            }
        };
        format!(
            "wallet: {}\nselected vault: {}\nsnapshots: {} positions, {} stats\ndialogs: {}, {}",
            address,
            self.session.selected_vault,
            counts.position_entries,
            counts.stats_entries,
            dialog(TxKind::Deposit),
            dialog(TxKind::Redeem)
        )
    }
}

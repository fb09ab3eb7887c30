use std::collections::BTreeMap;

use alloy_primitives::Address;
use shared::{format_usd, short_address, NetworkKey, PortfolioSummary, TxKind, VaultConfig};

use crate::services::{FlowStep, ProgressSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Connect prompt
    LoggedOut,
    /// Dashboard
    LoggedIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub level: MessageLevel,
    pub text: String,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self { level: MessageLevel::Info, text: text.into() }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self { level: MessageLevel::Success, text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { level: MessageLevel::Error, text: text.into() }
    }
}

/// A dialog's primary action button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonState {
    Idle,
    Busy(&'static str),
}

impl ButtonState {
    pub fn label(&self, kind: TxKind) -> &'static str {
        match (self, kind) {
            (ButtonState::Busy(label), _) => label,
            (ButtonState::Idle, TxKind::Deposit) => "Deposit",
            (ButtonState::Idle, TxKind::Redeem) => "Request Withdrawal",
        }
    }

    pub fn disabled(&self) -> bool {
        matches!(self, ButtonState::Busy(_))
    }
}

/// Rendering surface driven by the controller.
pub trait Ui: Send + Sync {
    fn show_view(&self, view: View);

    fn render_dashboard(&self, address: Option<Address>, summary: &PortfolioSummary);

    fn open_dialog(&self, kind: TxKind, vault: &VaultConfig);

    fn close_dialog(&self, kind: TxKind);

    fn show_message(&self, kind: TxKind, message: &StatusMessage);

    fn set_button(&self, kind: TxKind, state: &ButtonState);

    /// Free-form output (help, command errors).
    fn notice(&self, text: &str);
}

/// Plain terminal rendering on stdout. Logs go to stderr.
pub struct ConsoleUi {
    vaults: BTreeMap<NetworkKey, VaultConfig>,
}

impl ConsoleUi {
    pub fn new(vaults: BTreeMap<NetworkKey, VaultConfig>) -> Self {
        Self { vaults }
    }

    fn vault_name(&self, key: NetworkKey) -> &str {
        self.vaults.get(&key).map(|v| v.name.as_str()).unwrap_or(key.as_str())
    }
}

impl Ui for ConsoleUi {
    fn show_view(&self, view: View) {
        match view {
            View::LoggedOut => println!("Wallet disconnected. Connect a wallet to view your vaults."),
            View::LoggedIn => println!("Wallet connected."),
        }
    }

    fn render_dashboard(&self, address: Option<Address>, summary: &PortfolioSummary) {
        let wallet = address.map(|a| short_address(&a)).unwrap_or_else(|| "0x...".to_string());
        println!("──────────────────────────────────────────────");
        println!("Wallet        {}", wallet);
        println!("Total value   {}", format_usd(summary.total_value));
        println!("USDC balance  {:.2}", summary.stablecoin_balance);
        for holding in &summary.holdings {
            println!(
                "  {:<18} shares {:>12.4}  value {:>14}  price ${:.4}  monthly {:.2}%",
                self.vault_name(holding.key),
                holding.shares,
                format_usd(holding.value),
                holding.share_price,
                holding.monthly_return
            );
        }
        println!("──────────────────────────────────────────────");
    }

    fn open_dialog(&self, kind: TxKind, vault: &VaultConfig) {
        println!("[{}] {} on {}", kind, vault.name, vault.network);
    }

    fn close_dialog(&self, kind: TxKind) {
        println!("[{}] closed", kind);
    }

    fn show_message(&self, kind: TxKind, message: &StatusMessage) {
        let tag = match message.level {
            MessageLevel::Info => "info",
            MessageLevel::Success => "ok",
            MessageLevel::Error => "error",
        };
        println!("[{}] {}: {}", kind, tag, message.text);
    }

    fn set_button(&self, kind: TxKind, state: &ButtonState) {
        if state.disabled() {
            println!("[{}] {}", kind, state.label(kind));
        }
    }

    fn notice(&self, text: &str) {
        println!("{}", text);
    }
}

/// One-shot commands render progress straight to the console.
impl ProgressSink for ConsoleUi {
    fn step(&self, kind: TxKind, step: FlowStep) {
        self.set_button(kind, &ButtonState::Busy(step.button_label()));
        if let Some(prompt) = step.prompt() {
            self.show_message(kind, &StatusMessage::info(prompt));
        }
    }
}

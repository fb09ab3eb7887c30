use thiserror::Error;

pub const GENERIC_FAILURE: &str = "Transaction failed";

/// Failures a user-facing flow can end in.
///
/// `Validation` blocks before any on-chain call. `DataFetchFailed` is only
/// ever logged; the refresh cycle that produced it is skipped.
#[derive(Debug , Clone , Error , PartialEq , Eq)]
pub enum DashboardError{
  #[error("{0}")]
  Validation(String),
  #[error("{0}")]
  WalletUnavailable(String),
  #[error("{0}")]
  NetworkMismatch(String),
  #[error("Approval failed: {0}")]
  ApprovalFailed(String),
  #[error("Transaction failed: {0}")]
  TransactionFailed(String),
  #[error("Data fetch failed: {0}")]
  DataFetchFailed(String),
}

impl DashboardError {
  pub fn kind(&self) -> &'static str {
    match self {
        DashboardError::Validation(_) => "validation",
        DashboardError::WalletUnavailable(_) => "wallet_unavailable",
        DashboardError::NetworkMismatch(_) => "network_mismatch",
        DashboardError::ApprovalFailed(_) => "approval_failed",
        DashboardError::TransactionFailed(_) => "transaction_failed",
        DashboardError::DataFetchFailed(_) => "data_fetch_failed",
    }
  }

  /// Text shown in a dialog's status region: the wallet or contract reason
  /// when one was given, otherwise a generic failure.
  pub fn user_message(&self) -> String {
    let reason = match self {
        DashboardError::Validation(msg)
        | DashboardError::WalletUnavailable(msg)
        | DashboardError::NetworkMismatch(msg)
        | DashboardError::ApprovalFailed(msg)
        | DashboardError::TransactionFailed(msg)
        | DashboardError::DataFetchFailed(msg) => msg.trim(),
    };
    if reason.is_empty() {
      GENERIC_FAILURE.to_string()
    } else {
      reason.to_string()
    }
  }
}

pub type DashboardResult<T> = Result<T , DashboardError>;

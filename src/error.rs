//! Error types for the synchronization engine.

use thiserror::Error;

use crate::api::OperationId;

pub type Result<T, E = SyncError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum SyncError {
  /// The remote call itself failed (network, server, or rejected request).
  #[error("remote operation {operation} failed: {cause}")]
  RemoteOperationFailed {
    operation: OperationId,
    #[source]
    cause: Box<dyn std::error::Error + Send + Sync>,
  },

  /// The remote answered, but not with the shape the operation promises.
  #[error("unexpected response from {operation}: {source}")]
  Decode {
    operation: OperationId,
    #[source]
    source: serde_json::Error,
  },

  /// A fetched transaction is missing required fields.
  #[error("invalid transaction record {}: {reason}", .id.as_deref().unwrap_or("<no id>"))]
  InvalidTransactionRecord { id: Option<String>, reason: String },

  /// The requested operation is not allowed in the current mode.
  #[error("{operation} is not allowed while {mode}")]
  InvalidModeTransition {
    operation: &'static str,
    mode: String,
  },
}

impl SyncError {
  pub(crate) fn remote(operation: OperationId, report: color_eyre::Report) -> Self {
    Self::RemoteOperationFailed {
      operation,
      cause: report.into(),
    }
  }

  pub(crate) fn invalid_record(id: Option<&str>, reason: impl Into<String>) -> Self {
    Self::InvalidTransactionRecord {
      id: id.map(String::from),
      reason: reason.into(),
    }
  }

  /// The operation that failed, for remote and decode errors.
  pub fn operation(&self) -> Option<OperationId> {
    match self {
      Self::RemoteOperationFailed { operation, .. } | Self::Decode { operation, .. } => {
        Some(*operation)
      }
      _ => None,
    }
  }
}

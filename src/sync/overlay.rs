use std::collections::HashMap;
use std::sync::Mutex;

use crate::api::{Transaction, TransactionRecord};
use crate::error::SyncError;

use super::lock;

/// Approval flags confirmed by the remote after the records were fetched.
///
/// Overrides are never evicted: an entry is confirmed server state and
/// must not regress to an older fetched value.
#[derive(Debug, Default)]
pub struct ApprovalOverlayStore {
  overrides: Mutex<HashMap<String, bool>>,
}

impl ApprovalOverlayStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Record a confirmed approval change. Does not talk to the remote.
  pub fn record_override(&self, transaction_id: &str, value: bool) {
    lock(&self.overrides).insert(transaction_id.to_string(), value);
  }

  /// The effective approval flag: the override if present, else the fetched flag.
  pub fn merged_approval(&self, transaction: &Transaction) -> bool {
    self
      .override_for(&transaction.id)
      .unwrap_or(transaction.approved)
  }

  pub fn override_for(&self, transaction_id: &str) -> Option<bool> {
    lock(&self.overrides).get(transaction_id).copied()
  }

  pub fn len(&self) -> usize {
    lock(&self.overrides).len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Transactions ready for display plus the records that failed validation.
#[derive(Debug, Default)]
pub struct MergedView {
  pub transactions: Vec<Transaction>,
  pub rejected: Vec<SyncError>,
}

/// Validate fetched records and resolve their approval flags through the overlay.
///
/// Record order is preserved. Invalid records are collected in `rejected`
/// and do not affect the remaining ones.
pub fn merge_records(records: &[TransactionRecord], overlay: &ApprovalOverlayStore) -> MergedView {
  let mut view = MergedView::default();
  for record in records {
    match record.to_transaction() {
      Ok(transaction) => {
        let approved = overlay.merged_approval(&transaction);
        view.transactions.push(Transaction {
          approved,
          ..transaction
        });
      }
      Err(err) => view.rejected.push(err),
    }
  }
  view
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::testing::tx_json;
  use serde_json::json;

  fn record(id: &str, approved: bool) -> TransactionRecord {
    serde_json::from_value(tx_json(id, "e1", approved)).unwrap()
  }

  #[test]
  fn test_override_wins_over_fetched_flag() {
    let overlay = ApprovalOverlayStore::new();
    let fetched = record("t1", false).to_transaction().unwrap();
    assert!(!overlay.merged_approval(&fetched));

    overlay.record_override("t1", true);
    assert!(overlay.merged_approval(&fetched));

    overlay.record_override("t1", false);
    let refetched = record("t1", true).to_transaction().unwrap();
    assert!(!overlay.merged_approval(&refetched));
  }

  #[test]
  fn test_merge_keeps_records_unchanged() {
    let overlay = ApprovalOverlayStore::new();
    overlay.record_override("t2", true);
    let records = vec![record("t1", false), record("t2", false)];

    let view = merge_records(&records, &overlay);

    assert_eq!(
      view.transactions.iter().map(|t| t.approved).collect::<Vec<_>>(),
      vec![false, true]
    );
    assert_eq!(records[1].approved, Some(false));
  }

  #[test]
  fn test_merge_rejects_malformed_records_individually() {
    let overlay = ApprovalOverlayStore::new();
    let broken: TransactionRecord = serde_json::from_value(json!({
      "id": "bad",
      "merchant": "Nowhere",
      "amount": 1,
      "date": "2021-01-01",
      "approved": false
    }))
    .unwrap();
    let records = vec![record("t1", false), broken, record("t3", true)];

    let view = merge_records(&records, &overlay);

    let ids: Vec<&str> = view.transactions.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["t1", "t3"]);
    assert_eq!(view.rejected.len(), 1);
    assert!(matches!(
      &view.rejected[0],
      SyncError::InvalidTransactionRecord { id: Some(id), .. } if id == "bad"
    ));
  }
}

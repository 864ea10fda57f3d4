//! In-memory backend serving the remote operations from a JSON dataset.

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::debug;

use super::remote::{OperationId, ParamValue, Remote};
use super::types::PageResult;
use super::wire::{EmployeeRecord, TransactionRecord};

pub const DEFAULT_PAGE_SIZE: usize = 5;

/// Dataset file contents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
  #[serde(default)]
  pub employees: Vec<EmployeeRecord>,
  #[serde(default)]
  pub transactions: Vec<TransactionRecord>,
}

/// Backend that answers every operation from a dataset held in memory.
///
/// Approval writes update the dataset, so later reads (on cache misses)
/// observe them.
pub struct FixtureBackend {
  dataset: Mutex<Dataset>,
  page_size: usize,
  latency: Duration,
}

impl FixtureBackend {
  pub fn new(dataset: Dataset) -> Self {
    Self {
      dataset: Mutex::new(dataset),
      page_size: DEFAULT_PAGE_SIZE,
      latency: Duration::ZERO,
    }
  }

  /// Load a dataset from a JSON file.
  pub fn load(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read fixture {}: {}", path.display(), e))?;

    Self::from_json(&contents)
      .map_err(|e| eyre!("Failed to parse fixture {}: {}", path.display(), e))
  }

  pub fn from_json(json: &str) -> Result<Self> {
    let dataset: Dataset = serde_json::from_str(json)?;
    Ok(Self::new(dataset))
  }

  pub fn with_page_size(mut self, page_size: usize) -> Self {
    self.page_size = page_size.max(1);
    self
  }

  pub fn with_latency(mut self, latency: Duration) -> Self {
    self.latency = latency;
    self
  }

  fn dataset(&self) -> std::sync::MutexGuard<'_, Dataset> {
    self.dataset.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn employees(&self) -> Result<Value> {
    Ok(serde_json::to_value(&self.dataset().employees)?)
  }

  fn paginated_transactions(&self, params: &ParamValue) -> Result<Value> {
    let page = params
      .get("page")
      .and_then(ParamValue::as_int)
      .ok_or_else(|| eyre!("page cannot be null"))?;
    let page = usize::try_from(page).map_err(|_| eyre!("page must not be negative"))?;

    let dataset = self.dataset();
    let start = page.saturating_mul(self.page_size);
    let end = start.saturating_add(self.page_size);
    let data: Vec<TransactionRecord> = dataset
      .transactions
      .iter()
      .skip(start)
      .take(self.page_size)
      .cloned()
      .collect();
    let next_page = if end < dataset.transactions.len() {
      Some(u32::try_from(page + 1)?)
    } else {
      None
    };

    Ok(serde_json::to_value(PageResult { data, next_page })?)
  }

  fn transactions_by_employee(&self, params: &ParamValue) -> Result<Value> {
    let employee_id = params
      .get("employeeId")
      .and_then(ParamValue::as_str)
      .filter(|id| !id.is_empty())
      .ok_or_else(|| eyre!("employee id cannot be empty"))?;

    let dataset = self.dataset();
    let matching: Vec<&TransactionRecord> = dataset
      .transactions
      .iter()
      .filter(|tx| tx.employee_id() == Some(employee_id))
      .collect();

    Ok(serde_json::to_value(matching)?)
  }

  fn set_transaction_approval(&self, params: &ParamValue) -> Result<Value> {
    let transaction_id = params
      .get("transactionId")
      .and_then(ParamValue::as_str)
      .ok_or_else(|| eyre!("transactionId is required"))?;
    let value = params
      .get("value")
      .and_then(ParamValue::as_bool)
      .ok_or_else(|| eyre!("value is required"))?;

    let mut dataset = self.dataset();
    let tx = dataset
      .transactions
      .iter_mut()
      .find(|tx| tx.id() == Some(transaction_id))
      .ok_or_else(|| eyre!("invalid transaction to approve: {}", transaction_id))?;
    tx.approved = Some(value);

    Ok(Value::Null)
  }
}

#[async_trait]
impl Remote for FixtureBackend {
  async fn call(&self, operation: OperationId, params: &ParamValue) -> Result<Value> {
    debug!(%operation, params = %params.to_json(), "fixture call");
    if !self.latency.is_zero() {
      tokio::time::sleep(self.latency).await;
    }

    match operation {
      OperationId::Employees => self.employees(),
      OperationId::PaginatedTransactions => self.paginated_transactions(params),
      OperationId::TransactionsByEmployee => self.transactions_by_employee(params),
      OperationId::SetTransactionApproval => self.set_transaction_approval(params),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn backend(transactions: usize) -> FixtureBackend {
    let transactions: Vec<Value> = (0..transactions)
      .map(|i| {
        let employee = if i % 2 == 0 { "e1" } else { "e2" };
        json!({
          "id": format!("t{}", i),
          "merchant": "Shop",
          "amount": 10,
          "date": "2021-11-19",
          "approved": false,
          "employee": { "id": employee }
        })
      })
      .collect();
    let dataset = json!({
      "employees": [{ "id": "e1" }, { "id": "e2" }],
      "transactions": transactions
    });
    FixtureBackend::from_json(&dataset.to_string()).unwrap()
  }

  fn page(n: u32) -> ParamValue {
    ParamValue::object([("page", ParamValue::from(n))])
  }

  #[tokio::test]
  async fn test_pages_split_by_page_size() {
    let backend = backend(8);

    let first = backend.call(OperationId::PaginatedTransactions, &page(0)).await.unwrap();
    assert_eq!(first["data"].as_array().unwrap().len(), 5);
    assert_eq!(first["nextPage"], json!(1));

    let second = backend.call(OperationId::PaginatedTransactions, &page(1)).await.unwrap();
    assert_eq!(second["data"].as_array().unwrap().len(), 3);
    assert_eq!(second["nextPage"], Value::Null);
  }

  #[tokio::test]
  async fn test_exact_multiple_has_no_extra_page() {
    let backend = backend(10);
    let second = backend.call(OperationId::PaginatedTransactions, &page(1)).await.unwrap();
    assert_eq!(second["data"].as_array().unwrap().len(), 5);
    assert_eq!(second["nextPage"], Value::Null);
  }

  #[tokio::test]
  async fn test_null_page_is_an_error() {
    let backend = backend(3);
    let params = ParamValue::object([("page", ParamValue::Null)]);
    assert!(backend.call(OperationId::PaginatedTransactions, &params).await.is_err());
  }

  #[tokio::test]
  async fn test_transactions_by_employee() {
    let backend = backend(5);
    let params = ParamValue::object([("employeeId", ParamValue::from("e2"))]);
    let result = backend.call(OperationId::TransactionsByEmployee, &params).await.unwrap();
    let ids: Vec<&str> = result
      .as_array()
      .unwrap()
      .iter()
      .map(|tx| tx["id"].as_str().unwrap())
      .collect();
    assert_eq!(ids, vec!["t1", "t3"]);

    let empty = ParamValue::object([("employeeId", ParamValue::from(""))]);
    assert!(backend.call(OperationId::TransactionsByEmployee, &empty).await.is_err());
  }

  #[tokio::test]
  async fn test_set_approval_updates_dataset() {
    let backend = backend(2);
    let params = ParamValue::object([("transactionId", "t1".into()), ("value", true.into())]);
    backend.call(OperationId::SetTransactionApproval, &params).await.unwrap();

    let first = backend.call(OperationId::PaginatedTransactions, &page(0)).await.unwrap();
    assert_eq!(first["data"][1]["approved"], json!(true));

    let unknown = ParamValue::object([("transactionId", "nope".into()), ("value", true.into())]);
    assert!(backend.call(OperationId::SetTransactionApproval, &unknown).await.is_err());
  }
}

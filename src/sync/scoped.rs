use std::sync::Mutex;
use tracing::debug;

use crate::api::{OperationId, ParamValue, TransactionRecord};
use crate::cache::FetchClient;
use crate::error::Result;

use super::{lock, FetchOutcome};

#[derive(Debug, Default)]
struct ScopedState {
  employee_id: Option<String>,
  transactions: Option<Vec<TransactionRecord>>,
  epoch: u64,
}

/// Holds the complete transaction set of one employee.
pub struct ScopedCollectionLoader {
  client: FetchClient,
  state: Mutex<ScopedState>,
}

impl ScopedCollectionLoader {
  pub fn new(client: FetchClient) -> Self {
    Self {
      client,
      state: Mutex::new(ScopedState::default()),
    }
  }

  /// Load every transaction of `employee_id`, replacing the current set.
  ///
  /// Starting a fetch supersedes any fetch still in flight, so only the
  /// most recently requested employee can be applied.
  pub async fn fetch_for_employee(&self, employee_id: &str) -> Result<FetchOutcome> {
    let epoch = {
      let mut state = lock(&self.state);
      state.epoch += 1;
      state.epoch
    };

    let response: Option<Vec<TransactionRecord>> = self
      .client
      .fetch_cached(OperationId::TransactionsByEmployee, employee_params(employee_id))
      .await?;

    let mut state = lock(&self.state);
    if state.epoch != epoch {
      debug!(employee_id, "discarding superseded employee transactions");
      return Ok(FetchOutcome::Discarded);
    }
    let Some(transactions) = response else {
      debug!(employee_id, "employee transactions returned no data");
      return Ok(FetchOutcome::NoData);
    };

    let count = transactions.len();
    state.employee_id = Some(employee_id.to_string());
    state.transactions = Some(transactions);
    debug!(employee_id, count, "loaded employee transactions");
    Ok(FetchOutcome::Applied { count })
  }

  pub fn reset(&self) {
    let mut state = lock(&self.state);
    state.employee_id = None;
    state.transactions = None;
    state.epoch += 1;
  }

  /// Drop the cached response for one employee.
  pub fn invalidate_cache(&self, employee_id: &str) -> bool {
    self
      .client
      .invalidate(OperationId::TransactionsByEmployee, employee_params(employee_id))
  }

  /// The loaded set, or `None` when nothing is loaded.
  pub fn transactions(&self) -> Option<Vec<TransactionRecord>> {
    lock(&self.state).transactions.clone()
  }

  pub fn employee_id(&self) -> Option<String> {
    lock(&self.state).employee_id.clone()
  }

  pub fn is_loading(&self) -> bool {
    self.client.is_loading()
  }
}

fn employee_params(employee_id: &str) -> ParamValue {
  ParamValue::object([("employeeId", ParamValue::from(employee_id))])
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::testing::{employee_params, tx_json, ScriptedRemote};
  use crate::cache::ResponseCache;
  use serde_json::json;
  use std::sync::Arc;

  fn loader(remote: &Arc<ScriptedRemote>) -> ScopedCollectionLoader {
    ScopedCollectionLoader::new(FetchClient::new(remote.clone(), ResponseCache::in_memory()))
  }

  fn scripted() -> Arc<ScriptedRemote> {
    let remote = ScriptedRemote::new();
    remote.respond(
      OperationId::TransactionsByEmployee,
      employee_params("e7"),
      json!([tx_json("t1", "e7", false), tx_json("t2", "e7", true)]),
    );
    remote.respond(
      OperationId::TransactionsByEmployee,
      employee_params("e8"),
      json!([tx_json("t3", "e8", false)]),
    );
    remote
  }

  #[tokio::test]
  async fn test_fetch_replaces_wholesale() {
    let remote = scripted();
    let loader = loader(&remote);
    assert_eq!(loader.transactions(), None);

    loader.fetch_for_employee("e7").await.unwrap();
    assert_eq!(loader.transactions().unwrap().len(), 2);

    loader.fetch_for_employee("e8").await.unwrap();
    let loaded = loader.transactions().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].id(), Some("t3"));
    assert_eq!(loader.employee_id().as_deref(), Some("e8"));
  }

  #[tokio::test]
  async fn test_repeat_fetch_is_served_from_cache() {
    let remote = scripted();
    let loader = loader(&remote);

    loader.fetch_for_employee("e7").await.unwrap();
    loader.reset();
    loader.fetch_for_employee("e7").await.unwrap();
    assert_eq!(remote.calls(OperationId::TransactionsByEmployee), 1);

    assert!(loader.invalidate_cache("e7"));
    loader.fetch_for_employee("e7").await.unwrap();
    assert_eq!(remote.calls(OperationId::TransactionsByEmployee), 2);
  }

  #[tokio::test]
  async fn test_reset_clears_to_none() {
    let remote = scripted();
    let loader = loader(&remote);

    loader.fetch_for_employee("e7").await.unwrap();
    loader.reset();
    assert_eq!(loader.transactions(), None);
    assert_eq!(loader.employee_id(), None);
  }

  #[tokio::test]
  async fn test_reset_during_fetch_discards_result() {
    let remote = scripted();
    let gate = remote.gate(OperationId::TransactionsByEmployee);
    let loader = loader(&remote);

    let interfere = async {
      tokio::task::yield_now().await;
      loader.reset();
      gate.notify_one();
    };
    let (outcome, ()) = futures::join!(loader.fetch_for_employee("e7"), interfere);

    assert_eq!(outcome.unwrap(), FetchOutcome::Discarded);
    assert_eq!(loader.transactions(), None);
  }

  #[tokio::test]
  async fn test_later_request_supersedes_earlier() {
    let remote = scripted();
    let gate = remote.gate(OperationId::TransactionsByEmployee);
    let loader = loader(&remote);

    let release = async {
      tokio::task::yield_now().await;
      gate.notify_one();
      tokio::task::yield_now().await;
      gate.notify_one();
    };
    let (first, second, ()) = futures::join!(
      loader.fetch_for_employee("e7"),
      loader.fetch_for_employee("e8"),
      release
    );

    assert_eq!(first.unwrap(), FetchOutcome::Discarded);
    assert_eq!(second.unwrap(), FetchOutcome::Applied { count: 1 });
    assert_eq!(loader.employee_id().as_deref(), Some("e8"));
  }
}

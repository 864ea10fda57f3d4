//! Scripted remote used by the engine's unit tests.

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use super::remote::{OperationId, ParamValue, Remote};

#[derive(Default)]
struct Script {
  exact: HashMap<(OperationId, ParamValue), Value>,
  fallback: HashMap<OperationId, Value>,
  failing: HashSet<OperationId>,
  gates: HashMap<OperationId, Arc<Notify>>,
  calls: Vec<(OperationId, ParamValue)>,
}

/// Remote that answers from canned responses and records every call.
#[derive(Default)]
pub struct ScriptedRemote {
  script: Mutex<Script>,
}

impl ScriptedRemote {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  /// Respond to `operation` with exactly these params.
  pub fn respond(&self, operation: OperationId, params: ParamValue, value: Value) {
    self.script.lock().unwrap().exact.insert((operation, params), value);
  }

  /// Respond to `operation` regardless of params.
  pub fn respond_any(&self, operation: OperationId, value: Value) {
    self.script.lock().unwrap().fallback.insert(operation, value);
  }

  pub fn fail(&self, operation: OperationId) {
    self.script.lock().unwrap().failing.insert(operation);
  }

  pub fn recover(&self, operation: OperationId) {
    self.script.lock().unwrap().failing.remove(&operation);
  }

  /// Hold calls to `operation` until the returned notify is signalled
  /// (one permit per call).
  pub fn gate(&self, operation: OperationId) -> Arc<Notify> {
    let notify = Arc::new(Notify::new());
    self
      .script
      .lock()
      .unwrap()
      .gates
      .insert(operation, Arc::clone(&notify));
    notify
  }

  pub fn calls(&self, operation: OperationId) -> usize {
    self
      .script
      .lock()
      .unwrap()
      .calls
      .iter()
      .filter(|(op, _)| *op == operation)
      .count()
  }

  pub fn calls_with(&self, operation: OperationId, params: &ParamValue) -> usize {
    self
      .script
      .lock()
      .unwrap()
      .calls
      .iter()
      .filter(|(op, p)| *op == operation && p == params)
      .count()
  }
}

#[async_trait]
impl Remote for ScriptedRemote {
  async fn call(&self, operation: OperationId, params: &ParamValue) -> Result<Value> {
    let gate = {
      let mut script = self.script.lock().unwrap();
      script.calls.push((operation, params.clone()));
      script.gates.get(&operation).cloned()
    };
    if let Some(gate) = gate {
      gate.notified().await;
    }

    let script = self.script.lock().unwrap();
    if script.failing.contains(&operation) {
      return Err(eyre!("scripted failure for {}", operation));
    }
    script
      .exact
      .get(&(operation, params.clone()))
      .or_else(|| script.fallback.get(&operation))
      .cloned()
      .ok_or_else(|| eyre!("no scripted response for {} {}", operation, params.to_json()))
  }
}

pub fn page_params(page: u32) -> ParamValue {
  ParamValue::object([("page", ParamValue::from(page))])
}

pub fn employee_params(employee_id: &str) -> ParamValue {
  ParamValue::object([("employeeId", ParamValue::from(employee_id))])
}

pub fn tx_json(id: &str, employee_id: &str, approved: bool) -> Value {
  json!({
    "id": id,
    "merchant": "Merchant",
    "amount": 10.5,
    "date": "2021-11-19",
    "approved": approved,
    "employee": { "id": employee_id, "firstName": "First", "lastName": employee_id }
  })
}

/// A page of `count` transactions with ids `{prefix}0..{prefix}{count}`.
pub fn page_json(prefix: &str, count: usize, next_page: Option<u32>) -> Value {
  let data: Vec<Value> = (0..count)
    .map(|i| tx_json(&format!("{}{}", prefix, i), "e1", false))
    .collect();
  json!({ "data": data, "nextPage": next_page })
}

//! Cache storage trait and in-memory implementation.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::api::OperationId;

use super::key::CacheKey;

/// Trait for cache storage backends.
///
/// A key maps to at most one value; `put` replaces, it never merges.
pub trait CacheStorage: Send + Sync {
  fn get(&self, key: &CacheKey) -> Option<Value>;

  fn put(&self, key: CacheKey, value: Value);

  /// Remove one entry, returning whether it existed.
  fn remove(&self, key: &CacheKey) -> bool;

  /// Remove every entry of one operation, returning how many were removed.
  fn remove_operation(&self, operation: OperationId) -> usize;

  fn len(&self) -> usize;
}

/// Storage implementation that doesn't cache anything.
/// Used when caching is disabled - all operations are no-ops.
pub struct NoopStorage;

impl CacheStorage for NoopStorage {
  fn get(&self, _key: &CacheKey) -> Option<Value> {
    None // Always miss
  }

  fn put(&self, _key: CacheKey, _value: Value) {}

  fn remove(&self, _key: &CacheKey) -> bool {
    false
  }

  fn remove_operation(&self, _operation: OperationId) -> usize {
    0
  }

  fn len(&self) -> usize {
    0
  }
}

/// Process-local storage; lives as long as the owning cache handle.
#[derive(Default)]
pub struct MemoryStorage {
  entries: Mutex<HashMap<CacheKey, Value>>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }

  fn entries(&self) -> MutexGuard<'_, HashMap<CacheKey, Value>> {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl CacheStorage for MemoryStorage {
  fn get(&self, key: &CacheKey) -> Option<Value> {
    self.entries().get(key).cloned()
  }

  fn put(&self, key: CacheKey, value: Value) {
    self.entries().insert(key, value);
  }

  fn remove(&self, key: &CacheKey) -> bool {
    self.entries().remove(key).is_some()
  }

  fn remove_operation(&self, operation: OperationId) -> usize {
    let mut entries = self.entries();
    let before = entries.len();
    entries.retain(|key, _| key.operation != operation);
    before - entries.len()
  }

  fn len(&self) -> usize {
    self.entries().len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::ParamValue;
  use serde_json::json;

  fn key(operation: OperationId, id: &str) -> CacheKey {
    CacheKey::new(operation, ParamValue::object([("employeeId", ParamValue::from(id))]))
  }

  #[test]
  fn test_put_replaces() {
    let storage = MemoryStorage::new();
    storage.put(key(OperationId::TransactionsByEmployee, "e1"), json!([1]));
    storage.put(key(OperationId::TransactionsByEmployee, "e1"), json!([2]));
    assert_eq!(storage.len(), 1);
    assert_eq!(
      storage.get(&key(OperationId::TransactionsByEmployee, "e1")),
      Some(json!([2]))
    );
  }

  #[test]
  fn test_remove_operation_leaves_other_operations() {
    let storage = MemoryStorage::new();
    storage.put(key(OperationId::TransactionsByEmployee, "e1"), json!([]));
    storage.put(key(OperationId::TransactionsByEmployee, "e2"), json!([]));
    storage.put(CacheKey::new(OperationId::Employees, ParamValue::Null), json!([]));

    assert_eq!(storage.remove_operation(OperationId::TransactionsByEmployee), 2);
    assert_eq!(storage.len(), 1);
    assert!(storage.get(&CacheKey::new(OperationId::Employees, ParamValue::Null)).is_some());
  }

  #[test]
  fn test_noop_storage_always_misses() {
    let storage = NoopStorage;
    storage.put(key(OperationId::Employees, "x"), json!(1));
    assert_eq!(storage.get(&key(OperationId::Employees, "x")), None);
    assert_eq!(storage.len(), 0);
  }
}

//! Response caching for remote reads.
//!
//! This module provides:
//! - `CacheKey`, a tagged (operation, params) key with structural equality
//! - `CacheStorage` backends (in-memory, or a no-op when caching is disabled)
//! - `ResponseCache`, the explicit handle every fetch client shares
//! - `FetchClient`, which performs cached and uncached remote calls

mod client;
mod key;
mod storage;

pub use client::FetchClient;
pub use key::CacheKey;
pub use storage::{CacheStorage, MemoryStorage, NoopStorage};

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::api::OperationId;

/// Shared response cache.
///
/// Created once at startup and handed to every fetch client; dropping the
/// last handle discards all entries. Entries have no expiry and are only
/// removed through explicit invalidation.
#[derive(Clone)]
pub struct ResponseCache {
  storage: Arc<dyn CacheStorage>,
  /// Per-key locks so at most one remote read per key is in flight.
  in_flight: Arc<LockMap>,
}

impl ResponseCache {
  pub fn new(storage: impl CacheStorage + 'static) -> Self {
    Self {
      storage: Arc::new(storage),
      in_flight: Arc::default(),
    }
  }

  pub fn in_memory() -> Self {
    Self::new(MemoryStorage::new())
  }

  /// A cache that never stores anything.
  pub fn disabled() -> Self {
    Self::new(NoopStorage)
  }

  pub fn get(&self, key: &CacheKey) -> Option<Value> {
    self.storage.get(key)
  }

  pub fn put(&self, key: CacheKey, value: Value) {
    self.storage.put(key, value);
  }

  pub fn invalidate(&self, key: &CacheKey) -> bool {
    self.storage.remove(key)
  }

  pub fn invalidate_operation(&self, operation: OperationId) -> usize {
    self.storage.remove_operation(operation)
  }

  pub fn len(&self) -> usize {
    self.storage.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub(crate) fn key_lock(&self, key: &CacheKey) -> KeyLock {
    let mut locks = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
    KeyLock {
      locks: Arc::clone(&self.in_flight),
      key: key.clone(),
      mutex: Arc::clone(locks.entry(key.clone()).or_default()),
    }
  }

  /// Number of keys with a read in flight or waiting.
  pub(crate) fn pending_keys(&self) -> usize {
    self.in_flight.lock().unwrap_or_else(PoisonError::into_inner).len()
  }
}

type LockMap = Mutex<HashMap<CacheKey, Arc<tokio::sync::Mutex<()>>>>;

/// Handle on one key's in-flight lock. The map entry is removed when the
/// last handle for the key is dropped.
pub(crate) struct KeyLock {
  locks: Arc<LockMap>,
  key: CacheKey,
  mutex: Arc<tokio::sync::Mutex<()>>,
}

impl KeyLock {
  pub(crate) async fn lock(&self) -> tokio::sync::MutexGuard<'_, ()> {
    self.mutex.lock().await
  }
}

impl Drop for KeyLock {
  fn drop(&mut self) {
    let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
    // Release this handle's clone while the map is locked
    self.mutex = Arc::default();
    if locks.get(&self.key).is_some_and(|mutex| Arc::strong_count(mutex) == 1) {
      locks.remove(&self.key);
    }
  }
}

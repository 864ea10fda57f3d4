//! Fetch client performing remote operations through the response cache.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::api::{OperationId, ParamValue, Remote};
use crate::error::{Result, SyncError};

use super::key::CacheKey;
use super::ResponseCache;

/// Loading signal shared by all clones of one client.
struct LoadingFlag {
  in_flight: AtomicUsize,
  tx: watch::Sender<bool>,
}

impl LoadingFlag {
  fn new() -> Self {
    let (tx, _rx) = watch::channel(false);
    Self {
      in_flight: AtomicUsize::new(0),
      tx,
    }
  }

  fn start(&self) -> InFlight<'_> {
    if self.in_flight.fetch_add(1, Ordering::SeqCst) == 0 {
      self.tx.send_replace(true);
    }
    InFlight(self)
  }
}

/// Clears the loading flag when the remote call ends, however it ends.
struct InFlight<'a>(&'a LoadingFlag);

impl Drop for InFlight<'_> {
  fn drop(&mut self) {
    if self.0.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
      self.0.tx.send_replace(false);
    }
  }
}

/// Client for remote operations with optional response caching.
///
/// Each `FetchClient::new` gets its own loading flag; clones share it.
#[derive(Clone)]
pub struct FetchClient {
  remote: Arc<dyn Remote>,
  cache: ResponseCache,
  loading: Arc<LoadingFlag>,
}

impl FetchClient {
  pub fn new(remote: Arc<dyn Remote>, cache: ResponseCache) -> Self {
    Self {
      remote,
      cache,
      loading: Arc::new(LoadingFlag::new()),
    }
  }

  /// Perform a read, serving it from the cache when the same
  /// (operation, params) was fetched successfully before.
  ///
  /// Null responses and responses that fail to decode are not stored.
  pub async fn fetch_cached<T>(&self, operation: OperationId, params: ParamValue) -> Result<T>
  where
    T: DeserializeOwned,
  {
    let key = CacheKey::new(operation, params);
    let lock = self.cache.key_lock(&key);
    let _guard = lock.lock().await;

    if let Some(value) = self.cache.get(&key) {
      debug!(key = %key, fingerprint = %key.fingerprint(), "cache hit");
      return decode(operation, value);
    }

    debug!(key = %key, fingerprint = %key.fingerprint(), "cache miss");
    let value = self.call(operation, &key.params).await?;
    let decoded = decode(operation, value.clone())?;
    if !value.is_null() {
      self.cache.put(key, value);
    }
    Ok(decoded)
  }

  /// Perform an operation without reading or writing the cache.
  pub async fn fetch_uncached<T>(&self, operation: OperationId, params: ParamValue) -> Result<T>
  where
    T: DeserializeOwned,
  {
    let value = self.call(operation, &params).await?;
    decode(operation, value)
  }

  /// Drop one cached response.
  pub fn invalidate(&self, operation: OperationId, params: ParamValue) -> bool {
    self.cache.invalidate(&CacheKey::new(operation, params))
  }

  /// Drop every cached response of one operation.
  pub fn invalidate_operation(&self, operation: OperationId) -> usize {
    self.cache.invalidate_operation(operation)
  }

  pub fn is_loading(&self) -> bool {
    *self.loading.tx.borrow()
  }

  /// Subscribe to changes of the loading flag.
  pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
    self.loading.tx.subscribe()
  }

  async fn call(&self, operation: OperationId, params: &ParamValue) -> Result<Value> {
    let _in_flight = self.loading.start();
    self.remote.call(operation, params).await.map_err(|report| {
      warn!(%operation, error = %report, "remote operation failed");
      SyncError::remote(operation, report)
    })
  }
}

fn decode<T: DeserializeOwned>(operation: OperationId, value: Value) -> Result<T> {
  serde_json::from_value(value).map_err(|source| SyncError::Decode { operation, source })
}

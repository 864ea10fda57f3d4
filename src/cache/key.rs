use sha2::{Digest, Sha256};
use std::fmt;

use crate::api::{OperationId, ParamValue};

/// Cache key: the operation plus its structurally compared parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
  pub operation: OperationId,
  pub params: ParamValue,
}

impl CacheKey {
  pub fn new(operation: OperationId, params: ParamValue) -> Self {
    Self { operation, params }
  }

  /// Stable, fixed-length identifier for this key, used in logs.
  pub fn fingerprint(&self) -> String {
    let input = format!("{}:{}", self.operation, self.params.to_json());

    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..16].to_string()
  }
}

impl fmt::Display for CacheKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.params.is_null() {
      write!(f, "{}", self.operation)
    } else {
      write!(f, "{} {}", self.operation, self.params.to_json())
    }
  }
}

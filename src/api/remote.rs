//! Transport-agnostic contract for the remote operations the engine consumes.

use async_trait::async_trait;
use color_eyre::Result;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Names of the remote operations. These are contract keys, not routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperationId {
  Employees,
  PaginatedTransactions,
  TransactionsByEmployee,
  SetTransactionApproval,
}

impl OperationId {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Employees => "employees",
      Self::PaginatedTransactions => "paginatedTransactions",
      Self::TransactionsByEmployee => "transactionsByEmployee",
      Self::SetTransactionApproval => "setTransactionApproval",
    }
  }
}

impl fmt::Display for OperationId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Parameters of a remote operation.
///
/// Equality and hashing are structural: two values built from the same
/// fields compare equal regardless of construction order, since objects
/// are kept in a `BTreeMap`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamValue {
  #[default]
  Null,
  Bool(bool),
  Int(i64),
  Str(String),
  List(Vec<ParamValue>),
  Object(BTreeMap<String, ParamValue>),
}

impl ParamValue {
  /// Build an object from `(field, value)` pairs.
  pub fn object<K, I>(fields: I) -> Self
  where
    K: Into<String>,
    I: IntoIterator<Item = (K, ParamValue)>,
  {
    Self::Object(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
  }

  /// Look up a field of an object value.
  pub fn get(&self, field: &str) -> Option<&ParamValue> {
    match self {
      Self::Object(fields) => fields.get(field),
      _ => None,
    }
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Self::Str(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_int(&self) -> Option<i64> {
    match self {
      Self::Int(n) => Some(*n),
      _ => None,
    }
  }

  pub fn as_bool(&self) -> Option<bool> {
    match self {
      Self::Bool(b) => Some(*b),
      _ => None,
    }
  }

  pub fn is_null(&self) -> bool {
    matches!(self, Self::Null)
  }

  /// JSON rendering used on the wire and for key fingerprints.
  pub fn to_json(&self) -> Value {
    match self {
      Self::Null => Value::Null,
      Self::Bool(b) => Value::Bool(*b),
      Self::Int(n) => Value::from(*n),
      Self::Str(s) => Value::String(s.clone()),
      Self::List(items) => Value::Array(items.iter().map(ParamValue::to_json).collect()),
      Self::Object(fields) => Value::Object(
        fields
          .iter()
          .map(|(k, v)| (k.clone(), v.to_json()))
          .collect(),
      ),
    }
  }
}

impl From<bool> for ParamValue {
  fn from(value: bool) -> Self {
    Self::Bool(value)
  }
}

impl From<i64> for ParamValue {
  fn from(value: i64) -> Self {
    Self::Int(value)
  }
}

impl From<u32> for ParamValue {
  fn from(value: u32) -> Self {
    Self::Int(i64::from(value))
  }
}

impl From<&str> for ParamValue {
  fn from(value: &str) -> Self {
    Self::Str(value.to_string())
  }
}

impl From<String> for ParamValue {
  fn from(value: String) -> Self {
    Self::Str(value)
  }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
  fn from(value: Option<T>) -> Self {
    value.map(Into::into).unwrap_or(Self::Null)
  }
}

/// A remote endpoint able to perform the named operations.
///
/// Implementations return the raw JSON response; decoding into typed
/// results happens in the fetch client.
#[async_trait]
pub trait Remote: Send + Sync {
  async fn call(&self, operation: OperationId, params: &ParamValue) -> Result<Value>;
}

//! Serde types matching the records the remote operations return.
//!
//! Every field is optional here so a malformed record still decodes and can
//! be rejected individually when the view is built, instead of failing the
//! whole response.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

use super::types::{Employee, Transaction};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRecord {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub id: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub first_name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub last_name: Option<String>,
}

impl EmployeeRecord {
  pub fn into_employee(self) -> Option<Employee> {
    let id = self.id.filter(|id| !id.is_empty())?;
    Some(Employee {
      id,
      first_name: self.first_name.unwrap_or_default(),
      last_name: self.last_name.unwrap_or_default(),
    })
  }
}

impl From<Employee> for EmployeeRecord {
  fn from(employee: Employee) -> Self {
    Self {
      id: Some(employee.id),
      first_name: Some(employee.first_name),
      last_name: Some(employee.last_name),
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub id: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub merchant: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub amount: Option<Decimal>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub date: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub approved: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub employee: Option<EmployeeRecord>,
}

impl TransactionRecord {
  pub fn id(&self) -> Option<&str> {
    self.id.as_deref()
  }

  pub fn employee_id(&self) -> Option<&str> {
    self.employee.as_ref().and_then(|e| e.id.as_deref())
  }

  /// Validate into a domain transaction carrying the fetched approval flag.
  pub fn to_transaction(&self) -> Result<Transaction> {
    let id = self
      .id
      .clone()
      .filter(|id| !id.is_empty())
      .ok_or_else(|| SyncError::invalid_record(None, "missing id"))?;
    let reject = |reason: &str| SyncError::invalid_record(Some(id.as_str()), reason);

    let employee = self
      .employee
      .clone()
      .ok_or_else(|| reject("missing employee"))?
      .into_employee()
      .ok_or_else(|| reject("employee has no id"))?;
    let approved = self.approved.ok_or_else(|| reject("missing approval flag"))?;
    let merchant = self.merchant.clone().ok_or_else(|| reject("missing merchant"))?;
    let amount = self.amount.ok_or_else(|| reject("missing amount"))?;
    let date = self
      .date
      .as_deref()
      .ok_or_else(|| reject("missing date"))
      .and_then(|d| {
        NaiveDate::parse_from_str(d, "%Y-%m-%d")
          .map_err(|e| reject(&format!("bad date '{}': {}", d, e)))
      })?;

    Ok(Transaction {
      id,
      merchant,
      amount,
      date,
      approved,
      employee,
    })
  }
}

impl From<Transaction> for TransactionRecord {
  fn from(tx: Transaction) -> Self {
    Self {
      id: Some(tx.id),
      merchant: Some(tx.merchant),
      amount: Some(tx.amount),
      date: Some(tx.date.format("%Y-%m-%d").to_string()),
      approved: Some(tx.approved),
      employee: Some(tx.employee.into()),
    }
  }
}

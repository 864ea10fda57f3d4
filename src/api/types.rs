use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identifier of the "no filter" employee entry.
pub const EMPTY_EMPLOYEE_ID: &str = "";

/// An employee who owns transactions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
  pub id: String,
  pub first_name: String,
  pub last_name: String,
}

impl Employee {
  /// The sentinel entry meaning "show all transactions".
  pub fn no_filter() -> Self {
    Self {
      id: EMPTY_EMPLOYEE_ID.to_string(),
      first_name: "All".to_string(),
      last_name: "Employees".to_string(),
    }
  }

  pub fn is_no_filter(&self) -> bool {
    is_no_filter_id(&self.id)
  }

  pub fn full_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name)
  }
}

/// Whether an employee id is the "no filter" sentinel rather than a real employee.
pub fn is_no_filter_id(id: &str) -> bool {
  id == EMPTY_EMPLOYEE_ID
}

/// A validated transaction as shown to consumers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
  pub id: String,
  pub merchant: String,
  pub amount: Decimal,
  pub date: NaiveDate,
  pub approved: bool,
  pub employee: Employee,
}

/// Position of the next page in the paginated transaction listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCursor {
  /// Another page exists at this index
  Next(u32),
  /// No further pages
  End,
}

/// One page of a paginated listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult<T> {
  #[serde(default = "Vec::new")]
  pub data: Vec<T>,
  #[serde(default)]
  pub next_page: Option<u32>,
}

impl<T> PageResult<T> {
  pub fn cursor(&self) -> PageCursor {
    match self.next_page {
      Some(page) => PageCursor::Next(page),
      None => PageCursor::End,
    }
  }
}

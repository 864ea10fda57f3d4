use std::sync::Mutex;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::api::{Employee, EmployeeRecord, OperationId, ParamValue};
use crate::cache::FetchClient;
use crate::error::Result;

use super::{lock, FetchOutcome};

/// Loads the employee list used for filtering.
pub struct EmployeeLoader {
  client: FetchClient,
  employees: Mutex<Option<Vec<Employee>>>,
}

impl EmployeeLoader {
  pub fn new(client: FetchClient) -> Self {
    Self {
      client,
      employees: Mutex::new(None),
    }
  }

  /// Fetch all employees. Records without an id are skipped.
  pub async fn fetch_all(&self) -> Result<FetchOutcome> {
    let response: Option<Vec<EmployeeRecord>> = self
      .client
      .fetch_cached(OperationId::Employees, ParamValue::Null)
      .await?;
    let Some(records) = response else {
      debug!("employees returned no data");
      return Ok(FetchOutcome::NoData);
    };

    let total = records.len();
    let employees: Vec<Employee> = records
      .into_iter()
      .filter_map(EmployeeRecord::into_employee)
      .collect();
    if employees.len() < total {
      warn!(skipped = total - employees.len(), "skipped employees without an id");
    }

    let count = employees.len();
    *lock(&self.employees) = Some(employees);
    Ok(FetchOutcome::Applied { count })
  }

  pub fn invalidate(&self) {
    *lock(&self.employees) = None;
  }

  pub fn employees(&self) -> Option<Vec<Employee>> {
    lock(&self.employees).clone()
  }

  pub fn is_loaded(&self) -> bool {
    lock(&self.employees).is_some()
  }

  pub fn is_loading(&self) -> bool {
    self.client.is_loading()
  }

  pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
    self.client.subscribe_loading()
  }
}

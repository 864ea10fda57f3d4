use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::{is_no_filter_id, Employee, OperationId, ParamValue, Remote, Transaction};
use crate::cache::{FetchClient, ResponseCache};
use crate::error::{Result, SyncError};

use super::employees::EmployeeLoader;
use super::overlay::{merge_records, ApprovalOverlayStore, MergedView};
use super::paginated::PaginatedCollectionLoader;
use super::scoped::ScopedCollectionLoader;
use super::{lock, FetchOutcome};

/// Which loader is the source of truth for the view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ActiveMode {
  #[default]
  Uninitialized,
  AllTransactions,
  ScopedToEmployee(String),
}

impl fmt::Display for ActiveMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Uninitialized => f.write_str("uninitialized"),
      Self::AllTransactions => f.write_str("showing all transactions"),
      Self::ScopedToEmployee(id) => write!(f, "scoped to employee {}", id),
    }
  }
}

/// Coordinates the loaders, the approval overlay, and the active mode.
///
/// The mode and the loader resets happen under one lock, and `view` reads
/// under the same lock, so a view never mixes data from both modes.
pub struct SyncOrchestrator {
  mode: Mutex<ActiveMode>,
  employees: EmployeeLoader,
  paginated: PaginatedCollectionLoader,
  scoped: ScopedCollectionLoader,
  transactions: FetchClient,
  approvals: FetchClient,
  overlay: ApprovalOverlayStore,
  cache: ResponseCache,
}

impl SyncOrchestrator {
  pub fn new(remote: Arc<dyn Remote>, cache: ResponseCache) -> Self {
    let transactions = FetchClient::new(Arc::clone(&remote), cache.clone());

    Self {
      mode: Mutex::new(ActiveMode::Uninitialized),
      employees: EmployeeLoader::new(FetchClient::new(Arc::clone(&remote), cache.clone())),
      paginated: PaginatedCollectionLoader::new(transactions.clone()),
      scoped: ScopedCollectionLoader::new(transactions.clone()),
      transactions,
      approvals: FetchClient::new(remote, cache.clone()),
      overlay: ApprovalOverlayStore::new(),
      cache,
    }
  }

  pub fn mode(&self) -> ActiveMode {
    lock(&self.mode).clone()
  }

  /// Startup load: employees, then the first page of all transactions.
  ///
  /// Does nothing once employees are loaded or while they are loading.
  /// Otherwise it starts over from the first page, so a retry after an
  /// empty employee response does not append a second page.
  pub async fn bootstrap(&self) -> Result<()> {
    if self.employees.is_loaded() || self.employees.is_loading() {
      debug!("bootstrap skipped, employees already present");
      return Ok(());
    }
    self.enter_all_transactions(true);
    self.employees.fetch_all().await?;
    self.paginated.fetch_next_page().await?;
    Ok(())
  }

  /// Switch the view to one employee, or to all transactions for `None`
  /// or the "no filter" id.
  pub async fn select_employee(&self, employee_id: Option<&str>) -> Result<()> {
    match employee_id.filter(|id| !is_no_filter_id(id)) {
      None => {
        self.enter_all_transactions(true);
        self.paginated.fetch_next_page().await?;
      }
      Some(id) => {
        self.enter_scoped(id);
        self.scoped.fetch_for_employee(id).await?;
      }
    }
    Ok(())
  }

  /// Append the next page of all transactions.
  ///
  /// Only valid in [`ActiveMode::AllTransactions`]; a no-op when the last
  /// page has already been loaded.
  pub async fn load_more(&self) -> Result<()> {
    let mode = self.mode();
    if mode != ActiveMode::AllTransactions {
      return Err(SyncError::InvalidModeTransition {
        operation: "load_more",
        mode: mode.to_string(),
      });
    }
    if !self.paginated.has_more_pages() {
      debug!("load_more ignored, no further pages");
      return Ok(());
    }

    self.employees.fetch_all().await?;
    if self.paginated.fetch_next_page().await? == FetchOutcome::Discarded {
      debug!("load_more result superseded by a mode change");
    }
    Ok(())
  }

  /// Reload the active mode from the remote, bypassing cached responses.
  ///
  /// Only the active mode's own cache entries are dropped.
  pub async fn refresh(&self) -> Result<()> {
    match self.mode() {
      ActiveMode::Uninitialized => self.bootstrap().await,
      ActiveMode::AllTransactions => {
        let dropped = self.paginated.invalidate_cache();
        debug!(dropped, "refreshing all transactions");
        self.enter_all_transactions(true);
        self.paginated.fetch_next_page().await?;
        Ok(())
      }
      ActiveMode::ScopedToEmployee(id) => {
        self.scoped.invalidate_cache(&id);
        self.scoped.fetch_for_employee(&id).await?;
        Ok(())
      }
    }
  }

  /// Write an approval flag to the remote, then record it locally.
  ///
  /// The override is recorded only after the remote confirms the write.
  pub async fn confirm_approval(&self, transaction_id: &str, value: bool) -> Result<()> {
    let params = ParamValue::object([
      ("transactionId", ParamValue::from(transaction_id)),
      ("value", ParamValue::from(value)),
    ]);
    let _: Value = self
      .approvals
      .fetch_uncached(OperationId::SetTransactionApproval, params)
      .await?;

    self.overlay.record_override(transaction_id, value);
    info!(transaction_id, approved = value, "approval confirmed");
    Ok(())
  }

  /// The active loader's records with approval flags resolved.
  pub fn current_view(&self) -> Vec<Transaction> {
    self.merged_view().transactions
  }

  /// Like [`current_view`](Self::current_view), but also returns the
  /// records that failed validation.
  pub fn merged_view(&self) -> MergedView {
    let mode = lock(&self.mode);
    let records = match &*mode {
      ActiveMode::Uninitialized => Vec::new(),
      ActiveMode::AllTransactions => self.paginated.transactions(),
      ActiveMode::ScopedToEmployee(_) => self.scoped.transactions().unwrap_or_default(),
    };
    drop(mode);

    let view = merge_records(&records, &self.overlay);
    for err in &view.rejected {
      warn!(error = %err, "rejected transaction record");
    }
    view
  }

  /// Employees to offer as filters: the "no filter" entry first, or an
  /// empty list before employees are loaded.
  pub fn employees(&self) -> Vec<Employee> {
    match self.employees.employees() {
      Some(employees) => std::iter::once(Employee::no_filter())
        .chain(employees)
        .collect(),
      None => Vec::new(),
    }
  }

  pub fn is_loading_employees(&self) -> bool {
    self.employees.is_loading()
  }

  /// True while either loader has a transaction read in flight.
  pub fn is_loading_transactions(&self) -> bool {
    self.transactions.is_loading()
  }

  pub fn is_saving_approval(&self) -> bool {
    self.approvals.is_loading()
  }

  pub fn subscribe_employees_loading(&self) -> watch::Receiver<bool> {
    self.employees.subscribe_loading()
  }

  pub fn subscribe_transactions_loading(&self) -> watch::Receiver<bool> {
    self.transactions.subscribe_loading()
  }

  /// Whether `load_more` can fetch another page.
  pub fn has_more_pages(&self) -> bool {
    self.mode() == ActiveMode::AllTransactions
      && self.paginated.is_loaded()
      && self.paginated.has_more_pages()
  }

  pub fn overlay(&self) -> &ApprovalOverlayStore {
    &self.overlay
  }

  pub fn cache(&self) -> &ResponseCache {
    &self.cache
  }

  fn enter_all_transactions(&self, reset_pages: bool) {
    let mut mode = lock(&self.mode);
    self.scoped.reset();
    if reset_pages {
      self.paginated.reset();
    }
    if *mode != ActiveMode::AllTransactions {
      let previous = std::mem::replace(&mut *mode, ActiveMode::AllTransactions);
      info!(from = %previous, "switching to all transactions");
    }
  }

  fn enter_scoped(&self, employee_id: &str) {
    let mut mode = lock(&self.mode);
    self.paginated.reset();
    self.scoped.reset();
    let scoped = ActiveMode::ScopedToEmployee(employee_id.to_string());
    let previous = std::mem::replace(&mut *mode, scoped);
    info!(from = %previous, employee_id, "switching to employee transactions");
  }
}

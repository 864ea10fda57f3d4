//! Data synchronization engine.
//!
//! Two loaders feed the transaction view, one per viewing mode: the
//! paginated loader for all transactions and the scoped loader for a single
//! employee. The orchestrator decides which one is active, resets the other
//! before populating the winner, and merges confirmed approval edits from the
//! overlay store into whatever the active loader holds.

mod employees;
mod orchestrator;
mod overlay;
mod paginated;
mod scoped;

pub use employees::EmployeeLoader;
pub use orchestrator::{ActiveMode, SyncOrchestrator};
pub use overlay::{merge_records, ApprovalOverlayStore, MergedView};
pub use paginated::PaginatedCollectionLoader;
pub use scoped::ScopedCollectionLoader;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// What a loader did with a fetch result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
  /// The result was applied; `count` records arrived.
  Applied { count: usize },
  /// The remote returned no data; state left unchanged.
  NoData,
  /// The paginated listing has no further pages; nothing was requested.
  Exhausted,
  /// The loader was reset or superseded while the call was in flight.
  Discarded,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
  mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

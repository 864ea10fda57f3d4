//! Domain types and the remote operation contract.

mod fixture;
mod remote;
mod types;
mod wire;

#[cfg(test)]
pub(crate) mod testing;

pub use fixture::{Dataset, FixtureBackend, DEFAULT_PAGE_SIZE};
pub use remote::{OperationId, ParamValue, Remote};
pub use types::{is_no_filter_id, Employee, PageCursor, PageResult, Transaction, EMPTY_EMPLOYEE_ID};
pub use wire::{EmployeeRecord, TransactionRecord};

//! Client-side synchronization engine for reviewing transactions.
//!
//! [`sync::SyncOrchestrator`] is the entry point: it loads employees and
//! transactions through a shared [`cache::ResponseCache`], switches between
//! the paginated "all transactions" view and a single employee's view, and
//! overlays confirmed approval changes on the fetched records.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod sync;

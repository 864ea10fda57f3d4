use std::sync::Mutex;
use tracing::debug;

use crate::api::{OperationId, PageCursor, PageResult, ParamValue, TransactionRecord};
use crate::cache::FetchClient;
use crate::error::Result;

use super::{lock, FetchOutcome};

#[derive(Debug, Default)]
struct PageState {
  transactions: Vec<TransactionRecord>,
  /// `None` until the first page arrives
  cursor: Option<PageCursor>,
  /// Bumped on every reset so in-flight results can detect they are stale
  epoch: u64,
}

/// Accumulates the paginated "all transactions" listing page by page.
pub struct PaginatedCollectionLoader {
  client: FetchClient,
  state: Mutex<PageState>,
}

impl PaginatedCollectionLoader {
  pub fn new(client: FetchClient) -> Self {
    Self {
      client,
      state: Mutex::new(PageState::default()),
    }
  }

  /// Fetch the page after the last one accumulated and append it.
  ///
  /// The result is dropped if the loader was reset, or another page was
  /// applied, while the call was in flight.
  pub async fn fetch_next_page(&self) -> Result<FetchOutcome> {
    let (epoch, cursor) = {
      let state = lock(&self.state);
      (state.epoch, state.cursor)
    };
    let page = match cursor {
      None => 0,
      Some(PageCursor::Next(page)) => page,
      Some(PageCursor::End) => return Ok(FetchOutcome::Exhausted),
    };

    let response: Option<PageResult<TransactionRecord>> = self
      .client
      .fetch_cached(OperationId::PaginatedTransactions, page_params(page))
      .await?;

    let mut state = lock(&self.state);
    if state.epoch != epoch || state.cursor != cursor {
      debug!(page, "discarding superseded page");
      return Ok(FetchOutcome::Discarded);
    }
    let Some(response) = response else {
      debug!(page, "page returned no data");
      return Ok(FetchOutcome::NoData);
    };

    let count = response.data.len();
    state.cursor = Some(response.cursor());
    state.transactions.extend(response.data);
    debug!(page, count, total = state.transactions.len(), "appended page");
    Ok(FetchOutcome::Applied { count })
  }

  /// Clear accumulated pages and the cursor.
  pub fn reset(&self) {
    let mut state = lock(&self.state);
    state.transactions.clear();
    state.cursor = None;
    state.epoch += 1;
  }

  /// Drop this loader's cached pages so the next fetch goes remote.
  pub fn invalidate_cache(&self) -> usize {
    self.client.invalidate_operation(OperationId::PaginatedTransactions)
  }

  pub fn transactions(&self) -> Vec<TransactionRecord> {
    lock(&self.state).transactions.clone()
  }

  pub fn len(&self) -> usize {
    lock(&self.state).transactions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn cursor(&self) -> Option<PageCursor> {
    lock(&self.state).cursor
  }

  /// Whether at least one page has been applied since the last reset.
  pub fn is_loaded(&self) -> bool {
    self.cursor().is_some()
  }

  pub fn has_more_pages(&self) -> bool {
    self.cursor() != Some(PageCursor::End)
  }

  pub fn is_loading(&self) -> bool {
    self.client.is_loading()
  }
}

fn page_params(page: u32) -> ParamValue {
  ParamValue::object([("page", ParamValue::from(page))])
}

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::api::TransportError;

/// Lifecycle state of a query entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
  /// Known key, nothing requested yet
  Idle,
  /// First request in flight, no data yet
  Loading,
  /// Latest applied response succeeded
  Success,
  /// Latest applied response failed
  Error,
}

/// Snapshot of one cache entry.
///
/// `data` survives failed refetches, so a view can keep showing the last good
/// value next to the error.
#[derive(Debug)]
pub struct QueryEntry<T> {
  pub status: QueryStatus,
  pub data: Option<Arc<T>>,
  pub error: Option<TransportError>,
  pub last_fetched_at: Option<DateTime<Utc>>,
  /// A request for this key is in flight
  pub is_fetching: bool,
  /// Invalidated or older than the stale time
  pub is_stale: bool,
}

impl<T> QueryEntry<T> {
  pub(crate) fn idle() -> Self {
    Self {
      status: QueryStatus::Idle,
      data: None,
      error: None,
      last_fetched_at: None,
      is_fetching: false,
      is_stale: true,
    }
  }

  pub fn is_loading(&self) -> bool {
    self.status == QueryStatus::Loading
  }

  pub fn is_success(&self) -> bool {
    self.status == QueryStatus::Success
  }

  pub fn is_error(&self) -> bool {
    self.status == QueryStatus::Error
  }

  pub fn data(&self) -> Option<&T> {
    self.data.as_deref()
  }
}

// Manual impl so snapshots clone without requiring `T: Clone`.
impl<T> Clone for QueryEntry<T> {
  fn clone(&self) -> Self {
    Self {
      status: self.status,
      data: self.data.clone(),
      error: self.error.clone(),
      last_fetched_at: self.last_fetched_at,
      is_fetching: self.is_fetching,
      is_stale: self.is_stale,
    }
  }
}

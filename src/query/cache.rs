//! Keyed query cache with request deduplication and initiation-order writes.
//!
//! Every key owns one slot that is created on first use and then mutated in
//! place for the life of the cache. A slot holds:
//! - the last successful value and the last error, side by side
//! - the loader most recently registered for the key
//! - at most one live in-flight request
//! - per-key sequence numbers used to drop superseded responses
//!
//! Loaders run on spawned tasks, so a caller that stops waiting does not cancel
//! a request other callers are attached to. The state lock is never held
//! across an `.await`.

use chrono::Utc;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::entry::{QueryEntry, QueryStatus};
use super::key::QueryKey;
use crate::api::TransportError;

type AnyData = Arc<dyn Any + Send + Sync>;
type LoaderFn = Arc<dyn Fn() -> BoxFuture<'static, Result<AnyData, TransportError>> + Send + Sync>;

const UPDATE_CHANNEL_CAPACITY: usize = 64;

struct InFlight {
  seq: u64,
  done: Shared<BoxFuture<'static, ()>>,
}

struct Slot {
  status: QueryStatus,
  data: Option<AnyData>,
  error: Option<TransportError>,
  last_fetched_at: Option<chrono::DateTime<Utc>>,
  fetched_at: Option<Instant>,
  /// Set by `invalidate` to the last sequence issued before it; cleared by a
  /// successful response issued after that point.
  invalidated_through: Option<u64>,
  issued_seq: u64,
  applied_seq: u64,
  in_flight: Option<InFlight>,
  loader: Option<LoaderFn>,
}

impl Slot {
  fn new() -> Self {
    Self {
      status: QueryStatus::Idle,
      data: None,
      error: None,
      last_fetched_at: None,
      fetched_at: None,
      invalidated_through: None,
      issued_seq: 0,
      applied_seq: 0,
      in_flight: None,
      loader: None,
    }
  }

  fn is_stale(&self, stale_time: Duration) -> bool {
    self.invalidated_through.is_some()
      || self
        .fetched_at
        .map(|t| t.elapsed() >= stale_time)
        .unwrap_or(true)
  }

  fn snapshot<T: Send + Sync + 'static>(&self, key: &QueryKey, stale_time: Duration) -> QueryEntry<T> {
    let data = self.data.clone().and_then(|data| match data.downcast::<T>() {
      Ok(typed) => Some(typed),
      Err(_) => {
        warn!(%key, "cached value has a different type than requested");
        None
      }
    });

    QueryEntry {
      status: self.status,
      data,
      error: self.error.clone(),
      last_fetched_at: self.last_fetched_at,
      is_fetching: self.in_flight.is_some(),
      is_stale: self.is_stale(stale_time),
    }
  }
}

#[derive(Default)]
struct CacheState {
  slots: HashMap<QueryKey, Slot>,
  /// Invalidations received before any loader was registered for the key
  pending_invalidations: HashSet<QueryKey>,
}

/// Process-wide query cache. Cloning shares the same state.
#[derive(Clone)]
pub struct QueryCache {
  state: Arc<Mutex<CacheState>>,
  stale_time: Duration,
  updates: broadcast::Sender<QueryKey>,
}

impl Default for QueryCache {
  fn default() -> Self {
    Self::new()
  }
}

impl QueryCache {
  pub fn new() -> Self {
    let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
    Self {
      state: Arc::new(Mutex::new(CacheState::default())),
      stale_time: Duration::from_secs(60),
      updates,
    }
  }

  /// Set how long a successful value stays fresh.
  pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
    self.stale_time = stale_time;
    self
  }

  pub fn stale_time(&self) -> Duration {
    self.stale_time
  }

  /// Keys whose entries changed. Lagging receivers miss intermediate keys.
  pub fn subscribe(&self) -> broadcast::Receiver<QueryKey> {
    self.updates.subscribe()
  }

  /// Register `loader` for `key`, request if needed, and wait for the result.
  ///
  /// A request starts only when none is in flight and the value is missing,
  /// stale or invalidated. Otherwise the caller attaches to the in-flight
  /// request, so concurrent fetches of one key run the loader once.
  pub async fn fetch<T, F, Fut>(&self, key: &QueryKey, loader: F) -> QueryEntry<T>
  where
    T: Send + Sync + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, TransportError>> + Send + 'static,
  {
    self.prefetch(key, loader);
    self.settled(key).await
  }

  /// Same as [`fetch`](Self::fetch) without waiting for the result.
  pub fn prefetch<T, F, Fut>(&self, key: &QueryKey, loader: F)
  where
    T: Send + Sync + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, TransportError>> + Send + 'static,
  {
    let loader: LoaderFn = Arc::new(move || {
      loader()
        .map(|result| result.map(|data| Arc::new(data) as AnyData))
        .boxed()
    });

    let mut guard = self.lock();
    let state = &mut *guard;

    let forced = state.pending_invalidations.remove(key);
    let slot = state.slots.entry(key.clone()).or_insert_with(Slot::new);
    slot.loader = Some(loader);

    if forced {
      debug!(%key, "applying deferred invalidation");
      slot.invalidated_through = Some(slot.issued_seq);
    }

    if slot.in_flight.is_none() && (slot.data.is_none() || slot.is_stale(self.stale_time)) {
      self.start_request(key, slot);
    }
  }

  /// Wait until no request for `key` is in flight and return the entry.
  pub async fn settled<T>(&self, key: &QueryKey) -> QueryEntry<T>
  where
    T: Send + Sync + 'static,
  {
    let mut last_awaited = None;
    loop {
      let pending = {
        let state = self.lock();
        state
          .slots
          .get(key)
          .and_then(|slot| slot.in_flight.as_ref())
          .map(|flight| (flight.seq, flight.done.clone()))
      };

      match pending {
        // Same request still registered after completing: its task died
        // before applying a result.
        Some((seq, _)) if last_awaited == Some(seq) => break,
        Some((seq, done)) => {
          done.await;
          last_awaited = Some(seq);
        }
        None => break,
      }
    }

    self.get(key).unwrap_or_else(QueryEntry::idle)
  }

  /// Mark `key` stale, keep its value, and request it again right away.
  ///
  /// Without a registered loader the invalidation is remembered and applied
  /// when the next loader for `key` arrives.
  pub fn invalidate(&self, key: &QueryKey) {
    let mut guard = self.lock();
    let state = &mut *guard;

    match state.slots.get_mut(key) {
      Some(slot) if slot.loader.is_some() => {
        debug!(%key, "invalidating query");
        slot.invalidated_through = Some(slot.issued_seq);
        self.start_request(key, slot);
      }
      _ => {
        debug!(%key, "no loader registered, deferring invalidation");
        state.pending_invalidations.insert(key.clone());
      }
    }
  }

  /// Read-only snapshot of `key`.
  pub fn get<T>(&self, key: &QueryKey) -> Option<QueryEntry<T>>
  where
    T: Send + Sync + 'static,
  {
    let state = self.lock();
    state
      .slots
      .get(key)
      .map(|slot| slot.snapshot(key, self.stale_time))
  }

  pub fn keys(&self) -> Vec<QueryKey> {
    self.lock().slots.keys().cloned().collect()
  }

  fn lock(&self) -> MutexGuard<'_, CacheState> {
    self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  /// Issue a new request for `slot`, superseding any request in flight.
  fn start_request(&self, key: &QueryKey, slot: &mut Slot) {
    let Some(loader) = slot.loader.clone() else {
      return;
    };

    slot.issued_seq += 1;
    let seq = slot.issued_seq;
    if slot.data.is_none() && slot.status != QueryStatus::Error {
      slot.status = QueryStatus::Loading;
    }

    debug!(%key, seq, "starting query request");
    let cache = self.clone();
    let task_key = key.clone();
    let handle = tokio::spawn(async move {
      let result = loader().await;
      cache.apply(&task_key, seq, result);
    });

    slot.in_flight = Some(InFlight {
      seq,
      done: handle.map(|_| ()).boxed().shared(),
    });
    let _ = self.updates.send(key.clone());
  }

  /// Record a finished request unless a later-initiated one was already applied.
  fn apply(&self, key: &QueryKey, seq: u64, result: Result<AnyData, TransportError>) {
    {
      let mut state = self.lock();
      let Some(slot) = state.slots.get_mut(key) else {
        return;
      };

      if slot.in_flight.as_ref().is_some_and(|flight| flight.seq == seq) {
        slot.in_flight = None;
      }

      if seq < slot.applied_seq {
        debug!(%key, seq, applied = slot.applied_seq, "discarding superseded response");
        return;
      }
      slot.applied_seq = seq;

      match result {
        Ok(data) => {
          slot.status = QueryStatus::Success;
          slot.data = Some(data);
          slot.error = None;
          slot.fetched_at = Some(Instant::now());
          slot.last_fetched_at = Some(Utc::now());
          if slot.invalidated_through.is_some_and(|through| seq > through) {
            slot.invalidated_through = None;
          }
          debug!(%key, seq, "query succeeded");
        }
        Err(e) => {
          debug!(%key, seq, error = %e, "query failed");
          slot.status = QueryStatus::Error;
          slot.error = Some(e);
        }
      }
    }

    let _ = self.updates.send(key.clone());
  }
}

impl std::fmt::Debug for QueryCache {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("QueryCache")
      .field("keys", &self.keys())
      .field("stale_time", &self.stale_time)
      .finish_non_exhaustive()
  }
}

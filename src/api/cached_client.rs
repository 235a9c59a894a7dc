//! Backend client with cached reads.

use color_eyre::{eyre::eyre, Result};
use std::future::Future;

use crate::config::Config;
use crate::jobs::JobCoordinator;
use crate::query::{QueryCache, QueryEntry, QueryKey};

use super::client::BackendClient;
use super::error::TransportError;
use super::keys;
use super::transport::Transport;
use super::types::{Company, Health, ReportLog};

/// Backend client whose reads go through the shared [`QueryCache`].
///
/// `load_*` registers the loader and requests the value if it is missing or
/// stale; the matching accessor returns the current snapshot without side
/// effects.
#[derive(Clone, Debug)]
pub struct CachedBackend {
  inner: BackendClient,
  cache: QueryCache,
}

impl CachedBackend {
  pub fn new(config: &Config) -> Result<Self> {
    let inner = BackendClient::new(&config.api)
      .map_err(|e| eyre!("Failed to create backend client: {}", e))?;
    let cache = QueryCache::new().with_stale_time(config.cache.stale_time());

    Ok(Self { inner, cache })
  }

  pub fn cache(&self) -> &QueryCache {
    &self.cache
  }

  /// A job coordinator bound to this client's cache.
  ///
  /// Each view owns its own so that leaving the view cancels its pending
  /// refreshes.
  pub fn jobs(&self) -> JobCoordinator<Transport> {
    JobCoordinator::new(self.inner.transport().clone(), self.cache.clone())
  }

  pub fn load_health(&self) {
    self.load(keys::health(), |client| async move { client.health().await });
  }

  pub fn health(&self) -> QueryEntry<Health> {
    self.snapshot(&keys::health())
  }

  pub fn load_companies(&self) {
    self.load(keys::companies(), |client| async move {
      client.list_companies().await
    });
  }

  pub fn companies(&self) -> QueryEntry<Vec<Company>> {
    self.snapshot(&keys::companies())
  }

  pub fn load_report_logs(&self) {
    self.load(keys::report_logs(), |client| async move {
      client.list_report_logs().await
    });
  }

  pub fn report_logs(&self) -> QueryEntry<Vec<ReportLog>> {
    self.snapshot(&keys::report_logs())
  }

  /// Force a refetch of `key`, keeping the current value visible meanwhile.
  pub fn refresh(&self, key: &QueryKey) {
    self.cache.invalidate(key);
  }

  fn load<T, F, Fut>(&self, key: QueryKey, fetch: F)
  where
    T: Send + Sync + 'static,
    F: Fn(BackendClient) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, TransportError>> + Send + 'static,
  {
    let client = self.inner.clone();
    self.cache.prefetch(&key, move || fetch(client.clone()));
  }

  fn snapshot<T: Send + Sync + 'static>(&self, key: &QueryKey) -> QueryEntry<T> {
    self.cache.get(key).unwrap_or_else(QueryEntry::idle)
  }
}

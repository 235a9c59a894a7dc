//! Fire-and-forget backend jobs and the delayed refresh of their results.
//!
//! The backend acknowledges a job immediately and offers no way to ask whether
//! it finished. After a successful trigger the coordinator therefore waits the
//! request's `invalidation_delay` and invalidates one query key, which makes the
//! cache refetch it. The delay is a guess, not a completion guarantee.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::api::error::Method;
use crate::api::{Params, Transport, TransportError};
use crate::query::{QueryCache, QueryKey};

/// One job trigger.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRequest {
  pub endpoint: String,
  pub params: Params,
  pub body: Option<Value>,
  /// Query refetched once the delay has passed
  pub target: QueryKey,
  pub invalidation_delay: Duration,
}

impl JobRequest {
  pub fn new(endpoint: impl Into<String>, target: QueryKey, invalidation_delay: Duration) -> Self {
    Self {
      endpoint: endpoint.into(),
      params: Params::new(),
      body: None,
      target,
      invalidation_delay,
    }
  }

  pub fn with_params(mut self, params: Params) -> Self {
    self.params = params;
    self
  }
}

/// Backend acknowledgement of a triggered job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobAck {
  pub endpoint: String,
  pub body: Value,
  pub triggered_at: DateTime<Utc>,
}

impl JobAck {
  /// Decode the acknowledgement into an endpoint-specific type.
  pub fn decode<T: DeserializeOwned>(&self) -> Result<T, TransportError> {
    serde_json::from_value(self.body.clone()).map_err(|e| TransportError::Decode {
      method: Method::Post,
      path: self.endpoint.clone(),
      message: e.to_string(),
    })
  }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum JobError {
  #[error(transparent)]
  Transport(#[from] TransportError),
  #[error("job coordinator has been disposed")]
  Disposed,
}

/// The one transport call a job needs.
pub trait JobTransport: Send + Sync + 'static {
  fn post_job(
    &self,
    endpoint: &str,
    params: &Params,
    body: Option<&Value>,
  ) -> impl Future<Output = Result<Value, TransportError>> + Send;
}

impl JobTransport for Transport {
  async fn post_job(
    &self,
    endpoint: &str,
    params: &Params,
    body: Option<&Value>,
  ) -> Result<Value, TransportError> {
    self.post(endpoint, Some(params), body).await
  }
}

struct Inner<P> {
  transport: P,
  cache: QueryCache,
  scheduled: Mutex<JoinSet<()>>,
  disposed: AtomicBool,
}

/// Triggers jobs and owns their scheduled invalidations.
///
/// Clones share state. Scheduled invalidations are aborted by
/// [`dispose`](Self::dispose) or when the last clone is dropped, so they never
/// outlive the view that owns the coordinator.
pub struct JobCoordinator<P = Transport> {
  inner: Arc<Inner<P>>,
}

impl<P> Clone for JobCoordinator<P> {
  fn clone(&self) -> Self {
    Self {
      inner: Arc::clone(&self.inner),
    }
  }
}

impl<P: JobTransport> JobCoordinator<P> {
  pub fn new(transport: P, cache: QueryCache) -> Self {
    Self {
      inner: Arc::new(Inner {
        transport,
        cache,
        scheduled: Mutex::new(JoinSet::new()),
        disposed: AtomicBool::new(false),
      }),
    }
  }

  /// POST the job and, on success, schedule one invalidation of its target.
  ///
  /// Failures are returned as-is and schedule nothing. Triggers are never
  /// merged: two successful triggers for one key schedule two invalidations.
  pub async fn trigger(&self, request: JobRequest) -> Result<JobAck, JobError> {
    if self.is_disposed() {
      return Err(JobError::Disposed);
    }

    info!(endpoint = %request.endpoint, target = %request.target, "triggering job");
    let body = self
      .inner
      .transport
      .post_job(&request.endpoint, &request.params, request.body.as_ref())
      .await
      .map_err(|e| {
        warn!(endpoint = %request.endpoint, error = %e, "job trigger failed");
        e
      })?;

    let ack = JobAck {
      endpoint: request.endpoint,
      body,
      triggered_at: Utc::now(),
    };
    self.schedule_invalidation(request.target, request.invalidation_delay);

    Ok(ack)
  }

  /// Cancel every invalidation that has not fired yet and refuse new triggers.
  pub fn dispose(&self) {
    self.inner.disposed.store(true, Ordering::SeqCst);
    let mut scheduled = self.scheduled();
    if !scheduled.is_empty() {
      debug!(count = scheduled.len(), "cancelling scheduled invalidations");
    }
    scheduled.abort_all();
  }

  pub fn is_disposed(&self) -> bool {
    self.inner.disposed.load(Ordering::SeqCst)
  }

  /// Invalidations scheduled but not yet fired.
  pub fn pending(&self) -> usize {
    let mut scheduled = self.scheduled();
    while scheduled.try_join_next().is_some() {}
    scheduled.len()
  }

  fn schedule_invalidation(&self, target: QueryKey, delay: Duration) {
    let mut scheduled = self.scheduled();

    // Checked under the lock so a concurrent dispose cannot miss this task.
    if self.is_disposed() {
      debug!(%target, "coordinator disposed while job was in flight, not scheduling refresh");
      return;
    }

    while scheduled.try_join_next().is_some() {}

    let deadline = Instant::now() + delay;
    let cache = self.inner.cache.clone();
    debug!(%target, delay_ms = delay.as_millis() as u64, "scheduling invalidation");
    scheduled.spawn(async move {
      tokio::time::sleep_until(deadline).await;
      debug!(%target, "job refresh delay elapsed");
      cache.invalidate(&target);
    });
  }

  fn scheduled(&self) -> MutexGuard<'_, JoinSet<()>> {
    self
      .inner
      .scheduled
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::keys;
  use crate::api::types::{ReportLog, SyncAck};
  use crate::api::{test_server, BackendClient, CachedBackend};
  use crate::config::{ApiConfig, Config};
  use serde_json::json;
  use std::sync::atomic::AtomicU32;

  /// Records job posts and answers instantly.
  #[derive(Default)]
  struct FakeTransport {
    posts: Mutex<Vec<(String, Params)>>,
    fail: AtomicBool,
  }

  impl JobTransport for Arc<FakeTransport> {
    async fn post_job(
      &self,
      endpoint: &str,
      params: &Params,
      _body: Option<&Value>,
    ) -> Result<Value, TransportError> {
      self
        .posts
        .lock()
        .unwrap()
        .push((endpoint.to_string(), params.clone()));
      if self.fail.load(Ordering::SeqCst) {
        Err(TransportError::Http {
          status: 500,
          method: Method::Post,
          path: endpoint.to_string(),
        })
      } else {
        Ok(json!({ "task_id": "task-1" }))
      }
    }
  }

  /// Cache with `key` loaded once; returns the cache and the load timestamps.
  async fn loaded_cache(key: &QueryKey) -> (QueryCache, Arc<Mutex<Vec<Instant>>>) {
    let cache = QueryCache::new();
    let loads = Arc::new(Mutex::new(Vec::new()));

    let loader = {
      let loads = loads.clone();
      move || {
        let loads = loads.clone();
        async move {
          let mut loads = loads.lock().unwrap();
          loads.push(Instant::now());
          Ok::<_, TransportError>(loads.len())
        }
      }
    };
    cache.fetch(key, loader).await;

    (cache, loads)
  }

  fn report_job(delay_ms: u64) -> JobRequest {
    BackendClient::generate_report_job("abc-123", Duration::from_millis(delay_ms))
  }

  #[tokio::test(start_paused = true)]
  async fn test_success_schedules_one_delayed_invalidation() {
    let key = keys::report_logs();
    let (cache, loads) = loaded_cache(&key).await;
    let transport = Arc::new(FakeTransport::default());
    let jobs = JobCoordinator::new(transport.clone(), cache.clone());

    let ack = jobs.trigger(report_job(1500)).await.unwrap();
    let resolved = Instant::now();
    assert_eq!(ack.body["task_id"], "task-1");
    assert_eq!(jobs.pending(), 1);

    let posts = transport.posts.lock().unwrap().clone();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].0, "/reports/generate");
    assert_eq!(
      posts[0].1.iter().collect::<Vec<_>>(),
      vec![("company_guid", "abc-123")]
    );

    tokio::time::sleep(Duration::from_millis(1499)).await;
    assert_eq!(loads.lock().unwrap().len(), 1);

    tokio::time::sleep(Duration::from_millis(2)).await;
    {
      let loads = loads.lock().unwrap();
      assert_eq!(loads.len(), 2);
      assert!(loads[1] - resolved >= Duration::from_millis(1500));
    }

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(loads.lock().unwrap().len(), 2);
    assert_eq!(jobs.pending(), 0);
    assert_eq!(cache.get::<usize>(&key).unwrap().data(), Some(&2));
  }

  #[tokio::test(start_paused = true)]
  async fn test_failed_trigger_schedules_nothing() {
    let key = keys::report_logs();
    let (cache, loads) = loaded_cache(&key).await;
    let transport = Arc::new(FakeTransport::default());
    transport.fail.store(true, Ordering::SeqCst);
    let jobs = JobCoordinator::new(transport.clone(), cache.clone());

    let err = jobs.trigger(report_job(1500)).await.unwrap_err();
    assert_eq!(
      err,
      JobError::Transport(TransportError::Http {
        status: 500,
        method: Method::Post,
        path: "/reports/generate".to_string(),
      })
    );
    assert_eq!(jobs.pending(), 0);

    tokio::time::sleep(Duration::from_millis(1600)).await;
    assert_eq!(loads.lock().unwrap().len(), 1);
    assert!(!cache.get::<usize>(&key).unwrap().is_stale);
  }

  #[tokio::test(start_paused = true)]
  async fn test_dispose_cancels_scheduled_invalidation() {
    let key = keys::report_logs();
    let (cache, loads) = loaded_cache(&key).await;
    let transport = Arc::new(FakeTransport::default());
    let jobs = JobCoordinator::new(transport.clone(), cache);

    jobs.trigger(report_job(1500)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1000)).await;
    jobs.dispose();

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(loads.lock().unwrap().len(), 1);

    assert_eq!(jobs.trigger(report_job(1500)).await, Err(JobError::Disposed));
    assert_eq!(transport.posts.lock().unwrap().len(), 1);
  }

  /// Acknowledges every job after a fixed latency.
  struct SlowTransport;

  impl JobTransport for SlowTransport {
    async fn post_job(
      &self,
      _endpoint: &str,
      _params: &Params,
      _body: Option<&Value>,
    ) -> Result<Value, TransportError> {
      tokio::time::sleep(Duration::from_millis(300)).await;
      Ok(json!({ "task_id": "slow" }))
    }
  }

  #[tokio::test(start_paused = true)]
  async fn test_ack_after_dispose_schedules_nothing() {
    let key = keys::report_logs();
    let (cache, loads) = loaded_cache(&key).await;
    let jobs = JobCoordinator::new(SlowTransport, cache);

    let in_flight = tokio::spawn({
      let jobs = jobs.clone();
      async move { jobs.trigger(report_job(1500)).await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    jobs.dispose();

    let ack = in_flight.await.unwrap().unwrap();
    assert_eq!(ack.body["task_id"], "slow");
    assert_eq!(jobs.pending(), 0);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(loads.lock().unwrap().len(), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_dropping_coordinator_cancels_scheduled_invalidation() {
    let key = keys::report_logs();
    let (cache, loads) = loaded_cache(&key).await;
    let jobs = JobCoordinator::new(Arc::new(FakeTransport::default()), cache);

    jobs.trigger(report_job(1500)).await.unwrap();
    drop(jobs);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(loads.lock().unwrap().len(), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_triggers_for_same_key_are_not_merged() {
    let key = keys::report_logs();
    let (cache, loads) = loaded_cache(&key).await;
    let transport = Arc::new(FakeTransport::default());
    let jobs = JobCoordinator::new(transport.clone(), cache);

    jobs.trigger(report_job(1500)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    jobs.trigger(report_job(1500)).await.unwrap();
    assert_eq!(jobs.pending(), 2);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(transport.posts.lock().unwrap().len(), 2);
    assert_eq!(loads.lock().unwrap().len(), 3);
  }

  #[tokio::test(start_paused = true)]
  async fn test_jobs_for_different_keys_are_independent() {
    let logs = keys::report_logs();
    let companies = keys::companies();
    let (cache, log_loads) = loaded_cache(&logs).await;

    let company_loads = Arc::new(AtomicU32::new(0));
    let loader = {
      let company_loads = company_loads.clone();
      move || {
        let company_loads = company_loads.clone();
        async move { Ok::<_, TransportError>(company_loads.fetch_add(1, Ordering::SeqCst)) }
      }
    };
    cache.fetch(&companies, loader).await;

    let jobs = JobCoordinator::new(Arc::new(FakeTransport::default()), cache);
    jobs
      .trigger(BackendClient::sync_events_job(
        "abc-123",
        Duration::from_millis(500),
      ))
      .await
      .unwrap();
    jobs.trigger(report_job(3000)).await.unwrap();

    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert_eq!(company_loads.load(Ordering::SeqCst), 2);
    assert_eq!(log_loads.lock().unwrap().len(), 1);

    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(log_loads.lock().unwrap().len(), 2);
  }

  #[test]
  fn test_ack_decode() {
    let ack = JobAck {
      endpoint: "/events/sync".to_string(),
      body: json!({ "status": "ok", "count": 12 }),
      triggered_at: Utc::now(),
    };
    let sync: SyncAck = ack.decode().unwrap();
    assert_eq!(sync.count, 12);

    let err = ack.decode::<Vec<ReportLog>>().unwrap_err();
    assert!(matches!(err, TransportError::Decode { .. }));
  }

  #[tokio::test]
  async fn test_report_generation_refreshes_logs() {
    use axum::extract::{Query, State};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use std::collections::HashMap;

    #[derive(Clone, Default)]
    struct Backend {
      logs: Arc<Mutex<Vec<Value>>>,
      generated_for: Arc<Mutex<Vec<String>>>,
    }

    let backend = Backend::default();
    let app = Router::new()
      .route(
        "/reports/logs",
        get(|State(backend): State<Backend>| async move {
          Json(Value::Array(backend.logs.lock().unwrap().clone()))
        }),
      )
      .route(
        "/reports/generate",
        post(
          |State(backend): State<Backend>, Query(params): Query<HashMap<String, String>>| async move {
            let guid = params.get("company_guid").cloned().unwrap_or_default();
            backend.generated_for.lock().unwrap().push(guid.clone());
            let mut logs = backend.logs.lock().unwrap();
            let id = logs.len() as i64 + 1;
            logs.insert(
              0,
              json!({
                "id": id,
                "company_guid": guid,
                "total_sales": 1250.0,
                "total_refunds": 40.0,
                "created_at": "2026-10-18T09:30:00+00:00"
              }),
            );
            Json(json!({ "task_id": format!("task-{id}") }))
          },
        ),
      )
      .with_state(backend.clone());
    let (addr, _shutdown) = test_server::spawn(app).await;

    let config = Config {
      api: ApiConfig {
        base_url: format!("http://{addr}"),
        request_timeout_ms: 2_000,
      },
      ..Config::default()
    };
    let cached = CachedBackend::new(&config).unwrap();
    let key = keys::report_logs();

    cached.load_report_logs();
    let entry = cached.cache().settled::<Vec<ReportLog>>(&key).await;
    assert_eq!(entry.data().map(Vec::len), Some(0));

    let mut updates = cached.cache().subscribe();
    let jobs = cached.jobs();
    jobs
      .trigger(BackendClient::generate_report_job(
        "abc-123",
        config.jobs.report_refresh_delay(),
      ))
      .await
      .unwrap();
    let resolved = Instant::now();
    assert_eq!(*backend.generated_for.lock().unwrap(), vec!["abc-123"]);

    // The job already ran server-side, but nothing is refetched early.
    assert_eq!(cached.report_logs().data().map(Vec::len), Some(0));

    let entry = tokio::time::timeout(Duration::from_secs(5), async {
      loop {
        if updates.recv().await.unwrap() != key {
          continue;
        }
        let entry = cached.report_logs();
        if !entry.is_fetching && entry.data().is_some_and(|logs| logs.len() == 1) {
          return entry;
        }
      }
    })
    .await
    .expect("report logs were not refreshed");

    assert!(resolved.elapsed() >= Duration::from_millis(1500));
    let logs = entry.data().unwrap();
    assert_eq!(logs[0].company_guid, "abc-123");
    assert_eq!(logs[0].total_sales, 1250.0);
  }
}

use std::time::Duration;

use super::error::TransportError;
use super::keys;
use super::transport::{Params, Transport};
use super::types::{Company, Health, ReportLog};
use crate::config::ApiConfig;
use crate::jobs::JobRequest;

/// Typed wrapper over the backend's endpoints
#[derive(Clone, Debug)]
pub struct BackendClient {
  transport: Transport,
}

impl BackendClient {
  pub fn new(config: &ApiConfig) -> Result<Self, TransportError> {
    Ok(Self {
      transport: Transport::new(config)?,
    })
  }

  pub fn transport(&self) -> &Transport {
    &self.transport
  }

  /// Liveness probe
  pub async fn health(&self) -> Result<Health, TransportError> {
    self.transport.get("/health", None).await
  }

  /// All companies known to the backend
  pub async fn list_companies(&self) -> Result<Vec<Company>, TransportError> {
    self.transport.get("/companies/", None).await
  }

  /// Report run history, newest first
  pub async fn list_report_logs(&self) -> Result<Vec<ReportLog>, TransportError> {
    self.transport.get("/reports/logs", None).await
  }

  /// Job that pulls a company's events from the ticketing provider.
  ///
  /// Synced events feed the company overview, so the companies list is
  /// refetched afterwards.
  pub fn sync_events_job(company_guid: &str, refresh_after: Duration) -> JobRequest {
    JobRequest::new("/events/sync", keys::companies(), refresh_after)
      .with_params(Params::new().with("company_guid", company_guid))
  }

  /// Job that generates a sales report for a company.
  pub fn generate_report_job(company_guid: &str, refresh_after: Duration) -> JobRequest {
    JobRequest::new("/reports/generate", keys::report_logs(), refresh_after)
      .with_params(Params::new().with("company_guid", company_guid))
  }

  /// Job that pulls a company's fees, refunds and invoices from the ticketing
  /// provider.
  ///
  /// Finance snapshots are not readable through the API; they feed the report
  /// totals, so the report logs are refetched afterwards.
  pub fn fetch_finance_job(company_guid: &str, refresh_after: Duration) -> JobRequest {
    JobRequest::new("/finance/fetch", keys::report_logs(), refresh_after)
      .with_params(Params::new().with("company_guid", company_guid))
  }
}

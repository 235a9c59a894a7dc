//! Query keys for backend reads.

use crate::query::QueryKey;

pub fn health() -> QueryKey {
  QueryKey::new("health")
}

pub fn companies() -> QueryKey {
  QueryKey::new("companies")
}

pub fn report_logs() -> QueryKey {
  QueryKey::new("reportLogs")
}

//! Serde types matching the backend's JSON responses.

use serde::{Deserialize, Serialize};
use std::fmt;

/// `GET /health`
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Health {
  pub status: String,
  #[serde(default)]
  pub app: Option<String>,
  #[serde(default)]
  pub timestamp: Option<String>,
}

/// Row identifier. The backend has served both integer and string ids.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum RecordId {
  Int(i64),
  Text(String),
}

impl fmt::Display for RecordId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RecordId::Int(id) => write!(f, "{}", id),
      RecordId::Text(id) => f.write_str(id),
    }
  }
}

/// Entry of `GET /companies/`
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Company {
  pub id: RecordId,
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default)]
  pub company_guid: Option<String>,
  #[serde(default)]
  pub is_active: Option<bool>,
}

/// Entry of `GET /reports/logs`
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ReportLog {
  pub id: RecordId,
  pub company_guid: String,
  pub total_sales: f64,
  pub total_refunds: f64,
  #[serde(default)]
  pub created_at: Option<String>,
}

impl ReportLog {
  /// `created_at` rendered in local time, or the raw value if it does not parse.
  pub fn created_at_display(&self) -> String {
    match &self.created_at {
      Some(raw) => chrono::DateTime::parse_from_rfc3339(raw)
        .map(|ts| {
          ts.with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
        })
        .unwrap_or_else(|_| raw.clone()),
      None => "-".to_string(),
    }
  }
}

/// `POST /reports/generate` and `POST /finance/fetch`
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct TaskAck {
  pub task_id: String,
}

/// `POST /events/sync`
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SyncAck {
  pub status: String,
  pub count: u64,
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_company_optional_fields() {
    let companies: Vec<Company> = serde_json::from_value(json!([
      { "id": "c1", "name": "Acme", "company_guid": "abc-123", "is_active": true },
      { "id": 7 }
    ]))
    .unwrap();

    assert_eq!(companies[0].id, RecordId::Text("c1".to_string()));
    assert_eq!(companies[0].company_guid.as_deref(), Some("abc-123"));
    assert_eq!(companies[1].id.to_string(), "7");
    assert_eq!(companies[1].name, None);
    assert_eq!(companies[1].is_active, None);
  }

  #[test]
  fn test_report_log_created_at_fallback() {
    let log: ReportLog = serde_json::from_value(json!({
      "id": 1,
      "company_guid": "abc-123",
      "total_sales": 120.5,
      "total_refunds": 3.0,
      "created_at": "yesterday"
    }))
    .unwrap();

    assert_eq!(log.created_at_display(), "yesterday");
  }
}

//! Typed failures raised by the transport.
//!
//! Errors are `Clone` so the query cache can store them per key and hand
//! the same failure to every caller attached to a request.

use std::fmt;

/// HTTP method of the failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
  Get,
  Post,
}

impl fmt::Display for Method {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Method::Get => f.write_str("GET"),
      Method::Post => f.write_str("POST"),
    }
  }
}

/// Why a request could not be completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkErrorKind {
  /// The request exceeded its timeout
  Timeout,
  /// DNS or connection failure
  Connect,
  /// Anything else reqwest reports before a status line arrives
  Other,
}

impl fmt::Display for NetworkErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      NetworkErrorKind::Timeout => f.write_str("timeout"),
      NetworkErrorKind::Connect => f.write_str("connection failed"),
      NetworkErrorKind::Other => f.write_str("request failed"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
  /// The backend answered with a non-2xx status
  #[error("{method} {path} failed: {status}")]
  Http {
    status: u16,
    method: Method,
    path: String,
  },

  /// The request never produced a response
  #[error("{method} {path}: {kind}: {message}")]
  Network {
    kind: NetworkErrorKind,
    method: Method,
    path: String,
    message: String,
  },

  /// The response body was not the expected JSON
  #[error("{method} {path}: invalid response body: {message}")]
  Decode {
    method: Method,
    path: String,
    message: String,
  },

  /// The path is not a resource path relative to the base address
  #[error("invalid resource path {path:?}: {reason}")]
  InvalidPath { path: String, reason: String },

  /// The transport could not be built from configuration
  #[error("transport configuration error: {0}")]
  Config(String),
}

impl TransportError {
  pub fn is_timeout(&self) -> bool {
    matches!(
      self,
      TransportError::Network {
        kind: NetworkErrorKind::Timeout,
        ..
      }
    )
  }

  /// Status code for `Http` failures.
  pub fn status(&self) -> Option<u16> {
    match self {
      TransportError::Http { status, .. } => Some(*status),
      _ => None,
    }
  }

  pub(crate) fn network(method: Method, path: &str, err: &reqwest::Error) -> Self {
    let kind = if err.is_timeout() {
      NetworkErrorKind::Timeout
    } else if err.is_connect() {
      NetworkErrorKind::Connect
    } else {
      NetworkErrorKind::Other
    };

    TransportError::Network {
      kind,
      method,
      path: path.to_string(),
      message: err.to_string(),
    }
  }
}

//! HTTP transport for the WeezMon backend.
//!
//! Issues GET/POST requests against the configured base address and maps every
//! failure onto [`TransportError`]. No caching and no retries happen here.

use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;
use url::Url;

use super::error::{Method, TransportError};
use crate::config::ApiConfig;

/// URL query parameters, encoded when the request URL is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.0.push((key.into(), value.into()));
    self
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }
}

/// JSON-over-HTTP client bound to one backend.
#[derive(Clone, Debug)]
pub struct Transport {
  client: reqwest::Client,
  base_url: Url,
  timeout: Duration,
}

impl Transport {
  pub fn new(config: &ApiConfig) -> Result<Self, TransportError> {
    let base_url = Url::parse(&config.base_url).map_err(|e| {
      TransportError::Config(format!("invalid base url {:?}: {}", config.base_url, e))
    })?;

    if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
      return Err(TransportError::Config(format!(
        "base url {:?} must be an http(s) address",
        config.base_url
      )));
    }

    let client = reqwest::Client::builder()
      .build()
      .map_err(|e| TransportError::Config(format!("failed to build HTTP client: {}", e)))?;

    Ok(Self {
      client,
      base_url,
      timeout: Duration::from_millis(config.request_timeout_ms),
    })
  }

  /// Copy of this transport whose requests give up after `timeout`.
  ///
  /// Expiry surfaces as a `Network` error of kind `Timeout`.
  pub fn with_timeout(&self, timeout: Duration) -> Self {
    Self {
      timeout,
      ..self.clone()
    }
  }

  /// GET `path` and decode the JSON response.
  pub async fn get<T>(&self, path: &str, params: Option<&Params>) -> Result<T, TransportError>
  where
    T: DeserializeOwned,
  {
    self.send::<T, ()>(Method::Get, path, params, None).await
  }

  /// POST to `path` with an optional JSON body and decode the JSON response.
  pub async fn post<T, B>(
    &self,
    path: &str,
    params: Option<&Params>,
    body: Option<&B>,
  ) -> Result<T, TransportError>
  where
    T: DeserializeOwned,
    B: Serialize + ?Sized,
  {
    self.send(Method::Post, path, params, body).await
  }

  async fn send<T, B>(
    &self,
    method: Method,
    path: &str,
    params: Option<&Params>,
    body: Option<&B>,
  ) -> Result<T, TransportError>
  where
    T: DeserializeOwned,
    B: Serialize + ?Sized,
  {
    let url = self.resolve(path, params)?;
    debug!(%method, %url, "sending request");

    let mut request = match method {
      Method::Get => self.client.get(url),
      Method::Post => self.client.post(url),
    }
    .timeout(self.timeout);

    if let Some(body) = body {
      request = request.json(body);
    }

    let response = request
      .send()
      .await
      .map_err(|e| TransportError::network(method, path, &e))?;

    let status = response.status();
    if !status.is_success() {
      debug!(%method, path, status = status.as_u16(), "request failed");
      return Err(TransportError::Http {
        status: status.as_u16(),
        method,
        path: path.to_string(),
      });
    }

    let bytes = response
      .bytes()
      .await
      .map_err(|e| TransportError::network(method, path, &e))?;

    serde_json::from_slice(&bytes).map_err(|e| TransportError::Decode {
      method,
      path: path.to_string(),
      message: e.to_string(),
    })
  }

  /// Join a resource path onto the base address and append encoded params.
  fn resolve(&self, path: &str, params: Option<&Params>) -> Result<Url, TransportError> {
    validate_path(path)?;

    let joined = format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path);
    let mut url = Url::parse(&joined).map_err(|e| TransportError::InvalidPath {
      path: path.to_string(),
      reason: e.to_string(),
    })?;

    if let Some(params) = params.filter(|p| !p.is_empty()) {
      url.query_pairs_mut().extend_pairs(params.iter());
    }

    Ok(url)
  }
}

fn validate_path(path: &str) -> Result<(), TransportError> {
  let reason = if !path.starts_with('/') {
    Some("must start with '/'")
  } else if path.starts_with("//") || path.contains("://") {
    Some("must be relative to the base address")
  } else if path.contains('?') || path.contains('#') {
    Some("query parameters must be passed separately")
  } else if path.split('/').any(|segment| segment == "..") {
    Some("must not contain '..' segments")
  } else {
    None
  };

  match reason {
    Some(reason) => Err(TransportError::InvalidPath {
      path: path.to_string(),
      reason: reason.to_string(),
    }),
    None => Ok(()),
  }
}

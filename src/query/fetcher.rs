//! Resource fetcher: one HTTP round trip, classified into [`FetchError`].
//!
//! The fetcher never caches and never retries. The wire is behind the
//! [`Transport`] trait so the query layer can be exercised without a network.

use futures::future::BoxFuture;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::status::FetchError;

/// An outgoing request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
  pub method: Method,
  pub url: Url,
  pub body: Option<Value>,
}

impl HttpRequest {
  pub fn get(url: Url) -> Self {
    Self {
      method: Method::GET,
      url,
      body: None,
    }
  }
}

/// Status and raw body of a completed response.
#[derive(Debug, Clone)]
pub struct RawResponse {
  pub status: u16,
  pub body: Vec<u8>,
}

/// Sends a request and returns whatever the server answered.
///
/// Implementations report only transport-level failures as errors; status
/// and body classification happens in [`classify_response`].
pub trait Transport: Send + Sync {
  fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<RawResponse, FetchError>>;
}

/// Production transport backed by `reqwest`.
pub struct ReqwestTransport {
  client: reqwest::Client,
}

impl ReqwestTransport {
  /// Build a transport. `timeout` of `None` leaves reqwest's default (no timeout).
  pub fn new(timeout: Option<Duration>) -> color_eyre::Result<Self> {
    let mut builder =
      reqwest::Client::builder().user_agent(concat!("shelf/", env!("CARGO_PKG_VERSION")));
    if let Some(timeout) = timeout {
      builder = builder.timeout(timeout);
    }
    let client = builder
      .build()
      .map_err(|e| color_eyre::eyre::eyre!("Failed to create HTTP client: {}", e))?;
    Ok(Self { client })
  }
}

impl Transport for ReqwestTransport {
  fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<RawResponse, FetchError>> {
    Box::pin(async move {
      let mut builder = self
        .client
        .request(request.method, request.url)
        .header(ACCEPT, "application/json");
      if let Some(body) = request.body {
        builder = builder
          .header(CONTENT_TYPE, "application/json")
          .body(body.to_string());
      }

      let response = builder
        .send()
        .await
        .map_err(|e| FetchError::Network(e.to_string()))?;
      let status = response.status().as_u16();
      let body = response
        .bytes()
        .await
        .map_err(|e| FetchError::Network(e.to_string()))?;

      Ok(RawResponse {
        status,
        body: body.to_vec(),
      })
    })
  }
}

/// Turn a status code and body into a JSON value or a classified error.
pub fn classify_response(status: u16, body: &[u8]) -> Result<Value, FetchError> {
  if !(200..=299).contains(&status) {
    return Err(FetchError::HttpStatus { status });
  }
  serde_json::from_slice(body).map_err(|e| FetchError::Decode(e.to_string()))
}

/// Cheaply cloneable handle that performs single JSON requests.
#[derive(Clone)]
pub struct Fetcher {
  transport: Arc<dyn Transport>,
}

impl Fetcher {
  pub fn new(transport: impl Transport + 'static) -> Self {
    Self {
      transport: Arc::new(transport),
    }
  }

  /// GET `url` and parse the body as JSON.
  pub async fn get_json(&self, url: &Url) -> Result<Value, FetchError> {
    self.execute(HttpRequest::get(url.clone())).await
  }

  /// Send `body` as JSON with the given method (PUT, POST, PATCH...).
  pub async fn send_json(
    &self,
    method: Method,
    url: &Url,
    body: Value,
  ) -> Result<Value, FetchError> {
    self
      .execute(HttpRequest {
        method,
        url: url.clone(),
        body: Some(body),
      })
      .await
  }

  async fn execute(&self, request: HttpRequest) -> Result<Value, FetchError> {
    let method = request.method.clone();
    let url = request.url.to_string();
    debug!(%method, %url, "sending request");

    let response = match self.transport.send(request).await {
      Ok(response) => response,
      Err(e) => {
        warn!(%method, %url, error = %e, "request failed");
        return Err(e);
      }
    };

    debug!(%method, %url, status = response.status, "received response");
    classify_response(response.status, &response.body)
  }
}

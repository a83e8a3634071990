//! Scripted transport for tests. Nothing here touches the network.

use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::fetcher::{HttpRequest, RawResponse, Transport};
use super::status::FetchError;

enum Script {
  Respond { status: u16, body: Vec<u8> },
  Fail(String),
}

#[derive(Debug, Clone)]
struct Call {
  method: String,
  path: String,
  body: Option<Value>,
}

/// Shared record of requests seen by a [`ScriptedTransport`].
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
  pub fn count(&self, method: &str, path: &str) -> usize {
    self
      .0
      .lock()
      .unwrap()
      .iter()
      .filter(|c| c.method == method && c.path == path)
      .count()
  }

  pub fn total(&self) -> usize {
    self.0.lock().unwrap().len()
  }

  pub fn last_body(&self) -> Option<Value> {
    self.0.lock().unwrap().last().and_then(|c| c.body.clone())
  }
}

/// Transport answering from a fixed table keyed by URL path.
/// Unscripted paths answer 404 with an empty body.
#[derive(Default)]
pub struct ScriptedTransport {
  routes: HashMap<String, Script>,
  calls: CallLog,
}

impl ScriptedTransport {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn respond(self, path: &str, status: u16, body: Value) -> Self {
    self.respond_raw(path, status, body.to_string().into_bytes())
  }

  pub fn respond_raw(mut self, path: &str, status: u16, body: impl Into<Vec<u8>>) -> Self {
    self.routes.insert(
      path.to_string(),
      Script::Respond {
        status,
        body: body.into(),
      },
    );
    self
  }

  pub fn fail(mut self, path: &str, message: &str) -> Self {
    self
      .routes
      .insert(path.to_string(), Script::Fail(message.to_string()));
    self
  }

  pub fn calls(&self) -> CallLog {
    self.calls.clone()
  }
}

impl Transport for ScriptedTransport {
  fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<RawResponse, FetchError>> {
    let path = request.url.path().to_string();
    self.calls.0.lock().unwrap().push(Call {
      method: request.method.to_string(),
      path: path.clone(),
      body: request.body.clone(),
    });

    let result = match self.routes.get(&path) {
      Some(Script::Respond { status, body }) => Ok(RawResponse {
        status: *status,
        body: body.clone(),
      }),
      Some(Script::Fail(message)) => Err(FetchError::Network(message.clone())),
      None => Ok(RawResponse {
        status: 404,
        body: Vec::new(),
      }),
    };
    Box::pin(async move { result })
  }
}

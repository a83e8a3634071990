//! On-demand writes with the same `{status, data, error}` shape as queries.
//!
//! A [`MutationRunner`] belongs to the view that created it. One request may be
//! in flight at a time; `run` while loading is rejected. The runner never
//! updates the query cache, callers invalidate what they need.

use futures::future::BoxFuture;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, info};

use super::status::{FetchError, MutationState};

/// Endpoint invoked with the request body.
pub type EndpointFn =
  Arc<dyn Fn(Value) -> BoxFuture<'static, Result<Value, FetchError>> + Send + Sync>;

pub struct MutationRunner {
  endpoint: EndpointFn,
  state: MutationState,
  receiver: Option<oneshot::Receiver<Result<Value, FetchError>>>,
}

impl MutationRunner {
  pub fn new<F, Fut>(endpoint: F) -> Self
  where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, FetchError>> + Send + 'static,
  {
    Self {
      endpoint: Arc::new(
        move |body| -> BoxFuture<'static, Result<Value, FetchError>> { Box::pin(endpoint(body)) },
      ),
      state: MutationState::default(),
      receiver: None,
    }
  }

  pub fn state(&self) -> &MutationState {
    &self.state
  }

  pub fn is_loading(&self) -> bool {
    self.state.is_loading()
  }

  /// Send `body`. Returns `false` without doing anything if a request is
  /// already in flight.
  pub fn run(&mut self, body: Value) -> bool {
    if self.state.is_loading() {
      debug!("mutation already in flight, ignoring run");
      return false;
    }

    let (tx, rx) = oneshot::channel();
    self.receiver = Some(rx);
    self.state = MutationState::loading(None);

    let future = (self.endpoint)(body);
    tokio::spawn(async move {
      // Receiver may have been dropped with its view
      let _ = tx.send(future.await);
    });
    true
  }

  /// Apply a finished request, if any.
  ///
  /// Returns `true` if the state changed. Call this in the event loop tick.
  pub fn poll(&mut self) -> bool {
    let Some(receiver) = &mut self.receiver else {
      return false;
    };

    let result = match receiver.try_recv() {
      Ok(result) => result,
      Err(oneshot::error::TryRecvError::Empty) => return false,
      Err(oneshot::error::TryRecvError::Closed) => Err(FetchError::Network(
        "mutation task ended without a result".to_string(),
      )),
    };
    self.receiver = None;

    self.state = match result {
      Ok(value) => {
        info!("mutation succeeded");
        MutationState::success(value)
      }
      Err(error) => {
        info!(%error, "mutation failed");
        MutationState::failure(error, None)
      }
    };
    true
  }

  /// Back to `Idle`. Ignored while a request is in flight.
  pub fn reset(&mut self) {
    if !self.state.is_loading() {
      self.state = MutationState::default();
    }
  }
}

impl std::fmt::Debug for MutationRunner {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("MutationRunner")
      .field("state", &self.state)
      .finish_non_exhaustive()
  }
}

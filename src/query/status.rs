//! Status types shared by cached queries and mutations.

use serde_json::Value;
use thiserror::Error;

/// Lifecycle status of a query entry or mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
  /// Nothing has been requested yet
  #[default]
  Idle,
  /// A request is in flight
  Loading,
  /// The last request completed successfully
  Success,
  /// The last request failed
  Error,
}

impl Status {
  pub fn label(&self) -> &'static str {
    match self {
      Status::Idle => "idle",
      Status::Loading => "loading",
      Status::Success => "success",
      Status::Error => "error",
    }
  }
}

/// Classified failure of a single HTTP round trip.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
  /// DNS, connection or timeout failure before a response arrived
  #[error("network error: {0}")]
  Network(String),

  /// The server answered with a status outside 200..=299
  #[error("server returned HTTP {status}")]
  HttpStatus { status: u16 },

  /// The response body was not the JSON we expected
  #[error("could not decode response: {0}")]
  Decode(String),
}

impl FetchError {
  /// Whether a caller may reasonably try again. Nothing in this crate retries on its own.
  pub fn is_retryable(&self) -> bool {
    matches!(self, FetchError::Network(_))
  }

  /// HTTP status attached to the error, if any.
  pub fn status(&self) -> Option<u16> {
    match self {
      FetchError::HttpStatus { status } => Some(*status),
      _ => None,
    }
  }
}

impl From<serde_json::Error> for FetchError {
  fn from(err: serde_json::Error) -> Self {
    FetchError::Decode(err.to_string())
  }
}

/// Typed view of a query or mutation: `{status, data, error}`.
///
/// `data` may be present alongside `Status::Error` (last-known-good value) and
/// alongside `Status::Loading` (value being refreshed).
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState<T> {
  pub status: Status,
  pub data: Option<T>,
  pub error: Option<FetchError>,
}

impl<T> Default for QueryState<T> {
  fn default() -> Self {
    Self {
      status: Status::Idle,
      data: None,
      error: None,
    }
  }
}

impl<T> QueryState<T> {
  pub fn loading(data: Option<T>) -> Self {
    Self {
      status: Status::Loading,
      data,
      error: None,
    }
  }

  pub fn success(data: T) -> Self {
    Self {
      status: Status::Success,
      data: Some(data),
      error: None,
    }
  }

  pub fn failure(error: FetchError, data: Option<T>) -> Self {
    Self {
      status: Status::Error,
      data,
      error: Some(error),
    }
  }

  pub fn is_loading(&self) -> bool {
    self.status == Status::Loading
  }

  pub fn is_success(&self) -> bool {
    self.status == Status::Success
  }

  pub fn is_error(&self) -> bool {
    self.status == Status::Error
  }

  pub fn data(&self) -> Option<&T> {
    self.data.as_ref()
  }

  pub fn error(&self) -> Option<&FetchError> {
    self.error.as_ref()
  }
}

/// State of a mutation runner. Same shape as a query, holding the server's reply.
pub type MutationState = QueryState<Value>;

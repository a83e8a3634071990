//! Process-wide query cache with coalescing and last-initiated-wins updates.
//!
//! Inspired by TanStack Query. A [`QueryClient`] owns one entry per
//! [`QueryKey`]; views hold a [`Subscription`] and never the entry itself.
//!
//! # Example
//!
//! ```ignore
//! let catalog = catalog.clone();
//! let mut product: Subscription<Product> = queries.subscribe(
//!     QueryKey::new().push("product").push(1u64),
//!     QueryOptions::default(),
//!     move || {
//!         let catalog = catalog.clone();
//!         async move { catalog.get_product(1).await }
//!     },
//! );
//!
//! // In event loop tick
//! if product.poll() {
//!     // State changed, trigger re-render
//! }
//! ```
//!
//! Policies:
//! - Entries are never evicted within the process lifetime.
//! - A failed refetch keeps the last successful data (stale-while-error).
//! - Only the most recently started fetch for a key may update it.
//! - Nothing retries automatically.

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info};

use super::key::QueryKey;
use super::mutation::MutationRunner;
use super::status::{FetchError, QueryState, Status};

/// Default freshness window for cached data.
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(15);

/// Factory producing one fetch of a key's resource.
pub type FetchFn = Arc<dyn Fn() -> BoxFuture<'static, Result<Value, FetchError>> + Send + Sync>;

/// Per-subscription query options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
  /// How long successful data is served without refetching.
  pub stale_time: Duration,
}

impl Default for QueryOptions {
  fn default() -> Self {
    Self {
      stale_time: DEFAULT_STALE_TIME,
    }
  }
}

impl QueryOptions {
  pub const fn with_stale_time(stale_time: Duration) -> Self {
    Self { stale_time }
  }
}

/// Point-in-time copy of one cache entry.
#[derive(Debug, Clone)]
pub struct Snapshot {
  pub key: QueryKey,
  pub status: Status,
  pub data: Option<Arc<Value>>,
  pub error: Option<FetchError>,
  pub fetched_at: Option<Instant>,
  pub stale_time: Duration,
  /// Set by `invalidate`, cleared by the next successful fetch
  pub invalidated: bool,
}

impl Snapshot {
  fn idle(key: QueryKey, stale_time: Duration) -> Self {
    Self {
      key,
      status: Status::Idle,
      data: None,
      error: None,
      fetched_at: None,
      stale_time,
      invalidated: false,
    }
  }

  /// Successful, not invalidated, and younger than `stale_time`.
  pub fn is_fresh(&self, now: Instant) -> bool {
    self.status == Status::Success
      && !self.invalidated
      && self
        .fetched_at
        .is_some_and(|at| now.saturating_duration_since(at) < self.stale_time)
  }

  /// Time since the last successful fetch.
  pub fn age(&self, now: Instant) -> Option<Duration> {
    self.fetched_at.map(|at| now.saturating_duration_since(at))
  }
}

/// Cache inspector row.
#[derive(Debug, Clone)]
pub struct EntryInfo {
  pub snapshot: Snapshot,
  pub subscribers: usize,
}

struct Entry {
  /// Current state; every receiver is a live subscriber.
  tx: watch::Sender<Snapshot>,
  /// Most recently supplied fetch function, reused by invalidate/refetch.
  fetch: Option<FetchFn>,
  /// Id of the most recently started fetch.
  latest_fetch: u64,
}

impl Entry {
  fn new(key: QueryKey, stale_time: Duration) -> Self {
    let (tx, _rx) = watch::channel(Snapshot::idle(key, stale_time));
    Self {
      tx,
      fetch: None,
      latest_fetch: 0,
    }
  }

  fn snapshot(&self) -> Snapshot {
    self.tx.borrow().clone()
  }

  /// Move to `Loading` and hand out a new fetch id. Data is kept for display.
  fn begin_fetch(&mut self) -> Option<(u64, FetchFn)> {
    let fetch = self.fetch.clone()?;
    self.latest_fetch += 1;
    self.tx.send_modify(|s| {
      s.status = Status::Loading;
      s.error = None;
    });
    Some((self.latest_fetch, fetch))
  }
}

/// Shared query cache. Clones share the same storage.
#[derive(Clone, Default)]
pub struct QueryClient {
  entries: Arc<Mutex<HashMap<QueryKey, Entry>>>,
}

impl QueryClient {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> MutexGuard<'_, HashMap<QueryKey, Entry>> {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Subscribe to `key`, fetching with `fetch` when there is no fresh data.
  ///
  /// - fresh entry: served from cache, no request
  /// - entry already loading: joins the in-flight request
  /// - otherwise: starts exactly one request
  pub fn subscribe<T, F, Fut>(
    &self,
    key: QueryKey,
    options: QueryOptions,
    fetch: F,
  ) -> Subscription<T>
  where
    T: DeserializeOwned,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, FetchError>> + Send + 'static,
  {
    let fetch: FetchFn = Arc::new(move || -> BoxFuture<'static, Result<Value, FetchError>> {
      Box::pin(fetch())
    });

    let (rx, start) = {
      let mut entries = self.lock();
      let entry = entries
        .entry(key.clone())
        .or_insert_with(|| Entry::new(key.clone(), options.stale_time));
      entry.fetch = Some(fetch);
      entry.tx.send_if_modified(|s| {
        let changed = s.stale_time != options.stale_time;
        s.stale_time = options.stale_time;
        changed
      });

      let rx = entry.tx.subscribe();
      let snapshot = entry.snapshot();
      let start = if snapshot.status == Status::Loading {
        debug!(%key, "joining in-flight fetch");
        None
      } else if snapshot.is_fresh(Instant::now()) {
        debug!(%key, "cache hit");
        None
      } else {
        entry.begin_fetch()
      };
      (rx, start)
    };

    if let Some((id, fetch)) = start {
      self.spawn_fetch(key.clone(), id, fetch);
    }

    Subscription::new(self.clone(), key, rx)
  }

  /// Current snapshot of `key` without subscribing.
  pub fn snapshot(&self, key: &QueryKey) -> Option<Snapshot> {
    self.lock().get(key).map(Entry::snapshot)
  }

  /// Mark `key` stale. Refetches right away if anyone is subscribed,
  /// otherwise the next subscriber triggers the fetch.
  pub fn invalidate(&self, key: &QueryKey) {
    let start = {
      let mut entries = self.lock();
      let Some(entry) = entries.get_mut(key) else {
        return;
      };
      entry.tx.send_if_modified(|s| {
        let changed = !s.invalidated;
        s.invalidated = true;
        changed
      });
      info!(%key, subscribers = entry.tx.receiver_count(), "invalidated");
      if entry.tx.receiver_count() > 0 {
        entry.begin_fetch()
      } else {
        None
      }
    };

    if let Some((id, fetch)) = start {
      self.spawn_fetch(key.clone(), id, fetch);
    }
  }

  /// Start a new fetch for `key` regardless of freshness or in-flight requests.
  pub fn refetch(&self, key: &QueryKey) {
    let start = self.lock().get_mut(key).and_then(Entry::begin_fetch);
    if let Some((id, fetch)) = start {
      self.spawn_fetch(key.clone(), id, fetch);
    }
  }

  /// All entries, ordered by key.
  pub fn entries(&self) -> Vec<EntryInfo> {
    let mut infos: Vec<EntryInfo> = self
      .lock()
      .values()
      .map(|entry| EntryInfo {
        snapshot: entry.snapshot(),
        subscribers: entry.tx.receiver_count(),
      })
      .collect();
    infos.sort_by(|a, b| a.snapshot.key.cmp(&b.snapshot.key));
    infos
  }

  /// Runner for an on-demand write. The runner never touches this cache;
  /// call [`QueryClient::invalidate`] after it succeeds if needed.
  pub fn create_mutation_runner<F, Fut>(&self, endpoint: F) -> MutationRunner
  where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, FetchError>> + Send + 'static,
  {
    MutationRunner::new(endpoint)
  }

  fn spawn_fetch(&self, key: QueryKey, id: u64, fetch: FetchFn) {
    debug!(%key, fetch = id, "starting fetch");
    let client = self.clone();
    let future = fetch();
    tokio::spawn(async move {
      let result = future.await;
      client.apply_result(&key, id, result);
    });
  }

  /// Single serialized write of a fetch result into its entry.
  fn apply_result(&self, key: &QueryKey, id: u64, result: Result<Value, FetchError>) {
    let mut entries = self.lock();
    let Some(entry) = entries.get_mut(key) else {
      return;
    };

    if id != entry.latest_fetch {
      debug!(%key, fetch = id, latest = entry.latest_fetch, "discarding superseded result");
      return;
    }

    entry.tx.send_modify(|s| match result {
      Ok(value) => {
        debug!(%key, fetch = id, "fetch succeeded");
        s.status = Status::Success;
        s.data = Some(Arc::new(value));
        s.error = None;
        s.fetched_at = Some(Instant::now());
        s.invalidated = false;
      }
      Err(error) => {
        info!(%key, fetch = id, %error, "fetch failed");
        s.status = Status::Error;
        s.error = Some(error);
      }
    });
  }
}

/// A consumer's handle on one cache entry, decoded as `T`.
///
/// Dropping the subscription removes interest only; the entry and any
/// in-flight fetch stay alive.
pub struct Subscription<T> {
  client: QueryClient,
  key: QueryKey,
  rx: watch::Receiver<Snapshot>,
  state: QueryState<T>,
  /// Raw value `state.data` was decoded from, to skip redundant decodes
  decoded_from: Option<Arc<Value>>,
}

impl<T: DeserializeOwned> Subscription<T> {
  fn new(client: QueryClient, key: QueryKey, mut rx: watch::Receiver<Snapshot>) -> Self {
    let snapshot = rx.borrow_and_update().clone();
    let mut subscription = Self {
      client,
      key,
      rx,
      state: QueryState::default(),
      decoded_from: None,
    };
    subscription.apply(snapshot);
    subscription
  }

  /// Pick up a new snapshot if one was published.
  ///
  /// Returns `true` if the state changed. Call this in the event loop tick.
  pub fn poll(&mut self) -> bool {
    match self.rx.has_changed() {
      Ok(true) => {
        let snapshot = self.rx.borrow_and_update().clone();
        self.apply(snapshot);
        true
      }
      _ => false,
    }
  }

  /// Wait until the entry leaves `Loading`.
  pub async fn settled(&mut self) -> &QueryState<T> {
    self.poll();
    if matches!(self.state.status, Status::Loading | Status::Idle) {
      let settled = self
        .rx
        .wait_for(|s| !matches!(s.status, Status::Loading | Status::Idle))
        .await
        .map(|snapshot| (*snapshot).clone());
      // Err means the entry's sender is gone; keep the last applied state
      if let Ok(snapshot) = settled {
        self.apply(snapshot);
      }
    }
    &self.state
  }

  fn apply(&mut self, snapshot: Snapshot) {
    let mut decode_error = None;

    match &snapshot.data {
      None => {
        self.state.data = None;
        self.decoded_from = None;
      }
      Some(raw) if self.decoded_from.as_ref().is_some_and(|d| Arc::ptr_eq(d, raw)) => {}
      Some(raw) => match T::deserialize(&**raw) {
        Ok(data) => {
          self.state.data = Some(data);
          self.decoded_from = Some(Arc::clone(raw));
        }
        Err(e) => decode_error = Some(FetchError::from(e)),
      },
    }

    match decode_error {
      Some(error) if snapshot.status == Status::Success => {
        self.state.status = Status::Error;
        self.state.error = Some(error);
      }
      _ => {
        self.state.status = snapshot.status;
        self.state.error = snapshot.error;
      }
    }
  }

  pub fn key(&self) -> &QueryKey {
    &self.key
  }

  pub fn state(&self) -> &QueryState<T> {
    &self.state
  }

  pub fn data(&self) -> Option<&T> {
    self.state.data()
  }

  pub fn error(&self) -> Option<&FetchError> {
    self.state.error()
  }

  pub fn is_loading(&self) -> bool {
    self.state.is_loading()
  }

  /// Force a refetch of this key.
  pub fn refetch(&self) {
    self.client.refetch(&self.key);
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Subscription<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Subscription")
      .field("key", &self.key)
      .field("state", &self.state)
      .finish_non_exhaustive()
  }
}

//! Query layer: resource fetching, a shared cache with subscriptions, and
//! mutation runners. Similar in spirit to TanStack Query.

mod client;
mod fetcher;
mod key;
mod mutation;
mod status;
#[cfg(test)]
pub mod testing;

pub use client::{EntryInfo, QueryClient, QueryOptions, Subscription, DEFAULT_STALE_TIME};
pub use fetcher::{Fetcher, ReqwestTransport};
pub use key::QueryKey;
pub use mutation::MutationRunner;
pub use status::{FetchError, QueryState, Status};

//! Products REST API: endpoints, query keys and payload types.

mod client;
mod types;

pub use client::CatalogClient;
pub use types::Product;

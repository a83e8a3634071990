use reqwest::Method;
use serde_json::Value;
use url::Url;

use crate::query::{
  FetchError, Fetcher, MutationRunner, QueryClient, QueryKey, QueryOptions, Subscription,
};

use super::types::Product;

/// Products API endpoints plus the query keys they are cached under.
#[derive(Clone)]
pub struct CatalogClient {
  fetcher: Fetcher,
  base_url: Url,
}

impl CatalogClient {
  pub fn new(fetcher: Fetcher, base_url: Url) -> Self {
    Self { fetcher, base_url }
  }

  pub fn base_url(&self) -> &Url {
    &self.base_url
  }

  /// Key for the product list: `["products"]`
  pub fn products_key() -> QueryKey {
    QueryKey::new().push("products")
  }

  /// Key for one product: `["product", id]`
  pub fn product_key(id: u64) -> QueryKey {
    QueryKey::new().push("product").push(id)
  }

  fn endpoint(&self, segments: &[&str]) -> Url {
    let mut url = self.base_url.clone();
    if let Ok(mut path) = url.path_segments_mut() {
      path.pop_if_empty().extend(segments);
    }
    url
  }

  /// `GET /products`, unwrapped from its `{ "products": [...] }` envelope.
  pub async fn list_products(&self) -> Result<Value, FetchError> {
    let mut body = self.fetcher.get_json(&self.endpoint(&["products"])).await?;
    body
      .get_mut("products")
      .map(Value::take)
      .ok_or_else(|| FetchError::Decode("response has no `products` field".to_string()))
  }

  /// `GET /products/{id}`
  pub async fn get_product(&self, id: u64) -> Result<Value, FetchError> {
    let url = self.endpoint(&["products", &id.to_string()]);
    self.fetcher.get_json(&url).await
  }

  /// `PUT /products/{id}` with a partial product body.
  pub async fn update_product(&self, id: u64, patch: Value) -> Result<Value, FetchError> {
    let url = self.endpoint(&["products", &id.to_string()]);
    self.fetcher.send_json(Method::PUT, &url, patch).await
  }

  pub fn subscribe_products(
    &self,
    queries: &QueryClient,
    options: QueryOptions,
  ) -> Subscription<Vec<Product>> {
    let catalog = self.clone();
    queries.subscribe(Self::products_key(), options, move || {
      let catalog = catalog.clone();
      async move { catalog.list_products().await }
    })
  }

  pub fn subscribe_product(
    &self,
    queries: &QueryClient,
    id: u64,
    options: QueryOptions,
  ) -> Subscription<Product> {
    let catalog = self.clone();
    queries.subscribe(Self::product_key(id), options, move || {
      let catalog = catalog.clone();
      async move { catalog.get_product(id).await }
    })
  }

  /// Runner that PUTs its body to `/products/{id}`.
  pub fn update_runner(&self, queries: &QueryClient, id: u64) -> MutationRunner {
    let catalog = self.clone();
    queries.create_mutation_runner(move |patch| {
      let catalog = catalog.clone();
      async move { catalog.update_product(id, patch).await }
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::query::testing::ScriptedTransport;
  use crate::query::Status;
  use serde_json::json;

  fn catalog(transport: ScriptedTransport, base: &str) -> CatalogClient {
    CatalogClient::new(Fetcher::new(transport), Url::parse(base).unwrap())
  }

  #[test]
  fn test_endpoint_joins_segments() {
    let c = catalog(ScriptedTransport::new(), "https://dummyjson.com");
    assert_eq!(
      c.endpoint(&["products", "1"]).as_str(),
      "https://dummyjson.com/products/1"
    );

    let c = catalog(ScriptedTransport::new(), "https://shop.test/api/");
    assert_eq!(
      c.endpoint(&["products"]).as_str(),
      "https://shop.test/api/products"
    );

    let c = catalog(ScriptedTransport::new(), "https://shop.test/api");
    assert_eq!(
      c.endpoint(&["products"]).as_str(),
      "https://shop.test/api/products"
    );
  }

  #[test]
  fn test_keys() {
    assert_eq!(CatalogClient::products_key().to_string(), r#"["products"]"#);
    assert_eq!(
      CatalogClient::product_key(1),
      QueryKey::new().push("product").push(1i64)
    );
  }

  #[tokio::test]
  async fn test_list_products_unwraps_envelope() {
    let transport = ScriptedTransport::new().respond(
      "/products",
      200,
      json!({"products": [{"id": 1}, {"id": 2}], "total": 2}),
    );
    let c = catalog(transport, "https://dummyjson.com");

    let products = c.list_products().await.unwrap();
    assert_eq!(products, json!([{"id": 1}, {"id": 2}]));
  }

  #[tokio::test]
  async fn test_list_products_missing_envelope() {
    let transport = ScriptedTransport::new().respond("/products", 200, json!({"items": []}));
    let c = catalog(transport, "https://dummyjson.com");

    assert!(matches!(
      c.list_products().await,
      Err(FetchError::Decode(_))
    ));
  }

  #[tokio::test]
  async fn test_product_found() {
    let transport = ScriptedTransport::new().respond(
      "/products/1",
      200,
      json!({"id": 1, "title": "Essence Mascara", "price": 9.99}),
    );
    let calls = transport.calls();
    let c = catalog(transport, "https://dummyjson.com");
    let queries = QueryClient::new();

    let mut sub = c.subscribe_product(&queries, 1, QueryOptions::default());
    let state = sub.settled().await;
    assert_eq!(state.status, Status::Success);
    let product = state.data.as_ref().unwrap();
    assert_eq!(product.title.as_deref(), Some("Essence Mascara"));
    assert_eq!(product.price, Some(9.99));

    // Second subscription within stale time is a cache hit
    let again = c.subscribe_product(&queries, 1, QueryOptions::default());
    assert_eq!(again.state().status, Status::Success);
    assert_eq!(calls.count("GET", "/products/1"), 1);
  }

  #[tokio::test]
  async fn test_product_not_found() {
    let transport = ScriptedTransport::new().respond(
      "/products/999999",
      404,
      json!({"message": "Product with id '999999' not found"}),
    );
    let c = catalog(transport, "https://dummyjson.com");
    let queries = QueryClient::new();

    let mut sub = c.subscribe_product(&queries, 999999, QueryOptions::default());
    let state = sub.settled().await;
    assert_eq!(state.status, Status::Error);
    assert_eq!(state.error, Some(FetchError::HttpStatus { status: 404 }));
    assert!(state.data.is_none());
  }

  #[tokio::test]
  async fn test_update_leaves_cache_until_invalidated() {
    let transport = ScriptedTransport::new().respond(
      "/products/1",
      200,
      json!({"id": 1, "title": "Essence Mascara"}),
    );
    let calls = transport.calls();
    let c = catalog(transport, "https://dummyjson.com");
    let queries = QueryClient::new();

    let mut sub = c.subscribe_product(&queries, 1, QueryOptions::default());
    sub.settled().await;
    let before = queries.snapshot(&CatalogClient::product_key(1)).unwrap();

    let mut runner = c.update_runner(&queries, 1);
    assert!(runner.run(json!({"title": "Updated product"})));
    while !runner.poll() {
      tokio::task::yield_now().await;
    }
    assert_eq!(runner.state().status, Status::Success);
    assert_eq!(calls.count("PUT", "/products/1"), 1);
    assert_eq!(calls.last_body(), Some(json!({"title": "Updated product"})));

    // Cache entry untouched by the mutation
    let after = queries.snapshot(&CatalogClient::product_key(1)).unwrap();
    assert_eq!(after.status, Status::Success);
    assert_eq!(after.data, before.data);
    assert_eq!(after.fetched_at, before.fetched_at);
    assert!(!sub.poll());
    assert_eq!(calls.count("GET", "/products/1"), 1);

    // Explicit invalidation triggers the refetch
    queries.invalidate(&CatalogClient::product_key(1));
    sub.settled().await;
    assert_eq!(calls.count("GET", "/products/1"), 2);
    assert_eq!(calls.total(), 3);
  }
}

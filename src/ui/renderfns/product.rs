//! Pure mapping from a product query's `{status, data, error}` to what the
//! terminal shows. No fetching happens here; views only draw the result.

use crate::catalog::Product;
use crate::query::{FetchError, QueryState, Status};

const MISSING: &str = "n/a";

/// Displayable fields of one product.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductCard {
  pub id: u64,
  pub title: String,
  pub description: String,
  pub price: String,
  pub rating: String,
  pub brand: String,
  pub availability: String,
  pub low_stock: bool,
  pub category: String,
  pub thumbnail: String,
}

impl ProductCard {
  /// Labelled fields in display order.
  pub fn fields(&self) -> Vec<(&'static str, &str)> {
    vec![
      ("Price", self.price.as_str()),
      ("Rating", self.rating.as_str()),
      ("Brand", self.brand.as_str()),
      ("Category", self.category.as_str()),
      ("Availability", self.availability.as_str()),
      ("Image", self.thumbnail.as_str()),
    ]
  }
}

/// What the product detail area shows.
#[derive(Debug, Clone, PartialEq)]
pub enum ProductPanel {
  /// Nothing requested yet
  Empty,
  Loading,
  /// Failed request; `stale` carries the last good product if there is one
  Error {
    message: String,
    status: Option<u16>,
    stale: Option<Box<ProductCard>>,
  },
  Card(ProductCard),
}

/// One row of the product list.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRow {
  pub id: u64,
  pub title: String,
  pub category: String,
  pub price: String,
}

pub fn product_panel(state: &QueryState<Product>) -> ProductPanel {
  match state.status {
    Status::Idle => ProductPanel::Empty,
    Status::Loading => ProductPanel::Loading,
    Status::Error => ProductPanel::Error {
      message: state
        .error
        .as_ref()
        .map(error_message)
        .unwrap_or_else(|| "Unknown error".to_string()),
      status: state.error.as_ref().and_then(FetchError::status),
      stale: state.data.as_ref().map(|p| Box::new(product_card(p))),
    },
    Status::Success => match &state.data {
      Some(product) => ProductPanel::Card(product_card(product)),
      None => ProductPanel::Empty,
    },
  }
}

pub fn product_card(product: &Product) -> ProductCard {
  let availability = product.availability_status.clone();
  ProductCard {
    id: product.id,
    title: product.display_title(),
    description: or_missing(&product.description),
    price: format_price(product.price),
    rating: format_rating(product.rating),
    brand: or_missing(&product.brand),
    low_stock: availability.as_deref().is_some_and(is_low_stock),
    availability: availability.unwrap_or_else(|| MISSING.to_string()),
    category: or_missing(&product.category),
    thumbnail: or_missing(&product.thumbnail),
  }
}

pub fn product_row(product: &Product) -> ProductRow {
  ProductRow {
    id: product.id,
    title: product.display_title(),
    category: or_missing(&product.category),
    price: format_price(product.price),
  }
}

/// User-facing message, distinct per error kind.
pub fn error_message(error: &FetchError) -> String {
  match error {
    FetchError::Network(detail) => format!("Could not reach the server: {}", detail),
    FetchError::HttpStatus { status: 404 } => "Not found (HTTP 404)".to_string(),
    FetchError::HttpStatus { status } => format!("Server rejected the request (HTTP {})", status),
    FetchError::Decode(detail) => format!("Unexpected response from server: {}", detail),
  }
}

pub fn format_price(price: Option<f64>) -> String {
  match price {
    Some(price) => format!("${:.2}", price),
    None => MISSING.to_string(),
  }
}

pub fn format_rating(rating: Option<f64>) -> String {
  match rating {
    Some(rating) => format!("{} ⭐", rating),
    None => MISSING.to_string(),
  }
}

fn is_low_stock(status: &str) -> bool {
  status.eq_ignore_ascii_case("low stock")
}

fn or_missing(value: &Option<String>) -> String {
  value.clone().unwrap_or_else(|| MISSING.to_string())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::CatalogClient;
  use crate::query::testing::ScriptedTransport;
  use crate::query::{Fetcher, QueryClient, QueryOptions};
  use serde_json::json;
  use url::Url;

  fn mascara() -> Product {
    Product {
      id: 1,
      title: Some("Essence Mascara".to_string()),
      price: Some(9.99),
      rating: Some(4.94),
      brand: Some("Essence".to_string()),
      availability_status: Some("Low Stock".to_string()),
      category: Some("beauty".to_string()),
      ..Default::default()
    }
  }

  #[test]
  fn test_loading_panel() {
    let state: QueryState<Product> = QueryState::loading(Some(mascara()));
    assert_eq!(product_panel(&state), ProductPanel::Loading);
  }

  #[test]
  fn test_success_card() {
    let ProductPanel::Card(card) = product_panel(&QueryState::success(mascara())) else {
      panic!("expected card");
    };
    assert_eq!(card.title, "Essence Mascara");
    assert_eq!(card.price, "$9.99");
    assert_eq!(card.rating, "4.94 ⭐");
    assert!(card.low_stock);
    assert_eq!(card.description, "n/a");
  }

  #[test]
  fn test_in_stock_not_flagged() {
    let product = Product {
      availability_status: Some("In Stock".to_string()),
      ..mascara()
    };
    assert!(!product_card(&product).low_stock);
  }

  #[test]
  fn test_error_panel_keeps_stale_card() {
    let state = QueryState::failure(FetchError::Network("timed out".into()), Some(mascara()));
    let ProductPanel::Error {
      message,
      status,
      stale,
    } = product_panel(&state)
    else {
      panic!("expected error panel");
    };
    assert!(message.contains("timed out"));
    assert_eq!(status, None);
    assert_eq!(stale.unwrap().title, "Essence Mascara");
  }

  #[test]
  fn test_error_messages_distinct_per_kind() {
    let messages = [
      error_message(&FetchError::Network("x".into())),
      error_message(&FetchError::HttpStatus { status: 500 }),
      error_message(&FetchError::Decode("x".into())),
    ];
    assert_ne!(messages[0], messages[1]);
    assert_ne!(messages[1], messages[2]);
    assert_ne!(messages[0], messages[2]);
  }

  #[test]
  fn test_row_for_sparse_product() {
    let row = product_row(&Product {
      id: 9,
      ..Default::default()
    });
    assert_eq!(row.title, "Product 9");
    assert_eq!(row.price, "n/a");
  }

  fn catalog(transport: ScriptedTransport) -> CatalogClient {
    CatalogClient::new(
      Fetcher::new(transport),
      Url::parse("https://dummyjson.com").unwrap(),
    )
  }

  #[tokio::test]
  async fn test_product_page_end_to_end() {
    let transport = ScriptedTransport::new().respond(
      "/products/1",
      200,
      json!({
        "id": 1,
        "title": "Essence Mascara",
        "description": "Lash Princess",
        "price": 9.99,
        "rating": 4.94,
        "availabilityStatus": "In Stock"
      }),
    );
    let queries = QueryClient::new();
    let mut sub = catalog(transport).subscribe_product(&queries, 1, QueryOptions::default());

    let state = sub.settled().await;
    assert_eq!(state.status, Status::Success);
    let ProductPanel::Card(card) = product_panel(state) else {
      panic!("expected card");
    };
    assert_eq!(card.title, "Essence Mascara");
    assert_eq!(card.price, "$9.99");
  }

  #[tokio::test]
  async fn test_missing_product_end_to_end() {
    let transport = ScriptedTransport::new().respond(
      "/products/999999",
      404,
      json!({"message": "Product with id '999999' not found"}),
    );
    let queries = QueryClient::new();
    let mut sub = catalog(transport).subscribe_product(&queries, 999999, QueryOptions::default());

    let panel = product_panel(sub.settled().await);
    assert_eq!(
      panel,
      ProductPanel::Error {
        message: "Not found (HTTP 404)".to_string(),
        status: Some(404),
        stale: None,
      }
    );
  }
}

use serde::Deserialize;

/// A product as returned by the catalog API.
///
/// Every field except `id` is optional; the API contract is not validated.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Product {
  pub id: u64,
  pub title: Option<String>,
  pub description: Option<String>,
  pub thumbnail: Option<String>,
  pub price: Option<f64>,
  pub rating: Option<f64>,
  pub brand: Option<String>,
  pub availability_status: Option<String>,
  pub category: Option<String>,
}

impl Product {
  /// Title for display, falling back to the id.
  pub fn display_title(&self) -> String {
    match &self.title {
      Some(title) if !title.is_empty() => title.clone(),
      _ => format!("Product {}", self.id),
    }
  }
}

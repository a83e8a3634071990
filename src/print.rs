//! Non-interactive output for `--print`: resolve one route through the same
//! query pipeline the TUI uses and write plain text lines.

use color_eyre::{eyre::eyre, Result};

use crate::app::Services;
use crate::route::Route;
use crate::ui::renderfns::{product_panel, product_row, ProductPanel};

/// Text lines for `route`, or an error if its query failed
pub async fn render(services: &Services, route: Route) -> Result<Vec<String>> {
  let Services {
    catalog,
    queries,
    options,
  } = services;

  match route {
    Route::Home => Ok(vec![format!("shelf: catalog at {}", catalog.base_url())]),
    Route::Products => {
      let mut products = catalog.subscribe_products(queries, *options);
      let state = products.settled().await;
      if let Some(error) = &state.error {
        return Err(eyre!("Failed to load products: {}", error));
      }
      Ok(
        state
          .data()
          .map(|list| list.as_slice())
          .unwrap_or_default()
          .iter()
          .map(|product| {
            let row = product_row(product);
            format!("{}\t{}\t{}\t{}", row.id, row.title, row.category, row.price)
          })
          .collect(),
      )
    }
    Route::Product(id) => {
      let mut product = catalog.subscribe_product(queries, id, *options);
      match product_panel(product.settled().await) {
        ProductPanel::Card(card) => {
          let mut lines = vec![card.title.clone(), card.description.clone()];
          lines.extend(
            card
              .fields()
              .into_iter()
              .map(|(label, value)| format!("{}: {}", label, value)),
          );
          Ok(lines)
        }
        ProductPanel::Error { message, .. } => {
          Err(eyre!("Failed to load product {}: {}", id, message))
        }
        ProductPanel::Empty | ProductPanel::Loading => {
          Err(eyre!("Product {} did not load", id))
        }
      }
    }
  }
}

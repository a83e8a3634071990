//! Path router: `/`, `/products`, `/products/:productId`.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
  Home,
  Products,
  Product(u64),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
  #[error("no route matches '{0}'")]
  NotFound(String),
  #[error("invalid product id '{0}'")]
  InvalidId(String),
}

impl FromStr for Route {
  type Err = RouteError;

  fn from_str(path: &str) -> Result<Self, Self::Err> {
    let trimmed = path.trim();
    let segments: Vec<&str> = trimmed
      .split('/')
      .filter(|segment| !segment.is_empty())
      .collect();

    match segments.as_slice() {
      [] => Ok(Route::Home),
      ["products"] => Ok(Route::Products),
      ["products", id] => id
        .parse()
        .map(Route::Product)
        .map_err(|_| RouteError::InvalidId(id.to_string())),
      _ => Err(RouteError::NotFound(trimmed.to_string())),
    }
  }
}

impl fmt::Display for Route {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Route::Home => write!(f, "/"),
      Route::Products => write!(f, "/products"),
      Route::Product(id) => write!(f, "/products/{}", id),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_known_routes() {
    assert_eq!("/".parse::<Route>(), Ok(Route::Home));
    assert_eq!("".parse::<Route>(), Ok(Route::Home));
    assert_eq!("/products".parse::<Route>(), Ok(Route::Products));
    assert_eq!("/products/".parse::<Route>(), Ok(Route::Products));
    assert_eq!("/products/1".parse::<Route>(), Ok(Route::Product(1)));
  }

  #[test]
  fn test_parse_errors() {
    assert_eq!(
      "/products/abc".parse::<Route>(),
      Err(RouteError::InvalidId("abc".into()))
    );
    assert_eq!(
      "/carts".parse::<Route>(),
      Err(RouteError::NotFound("/carts".into()))
    );
    assert!("/products/1/reviews".parse::<Route>().is_err());
  }

  #[test]
  fn test_display_round_trips() {
    for route in [Route::Home, Route::Products, Route::Product(42)] {
      assert_eq!(route.to_string().parse::<Route>(), Ok(route));
    }
  }
}

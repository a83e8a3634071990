use std::fmt;

/// One primitive element of a [`QueryKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyPart {
  Str(String),
  Int(i64),
}

impl From<&str> for KeyPart {
  fn from(s: &str) -> Self {
    KeyPart::Str(s.to_string())
  }
}

impl From<String> for KeyPart {
  fn from(s: String) -> Self {
    KeyPart::Str(s)
  }
}

impl From<i64> for KeyPart {
  fn from(n: i64) -> Self {
    KeyPart::Int(n)
  }
}

impl From<u64> for KeyPart {
  fn from(n: u64) -> Self {
    i64::try_from(n)
      .map(KeyPart::Int)
      .unwrap_or_else(|_| KeyPart::Str(n.to_string()))
  }
}

impl fmt::Display for KeyPart {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      KeyPart::Str(s) => write!(f, "{:?}", s),
      KeyPart::Int(n) => write!(f, "{}", n),
    }
  }
}

/// Ordered sequence of primitives identifying one cache slot, e.g. `["product", 1]`.
///
/// Two keys are equal iff their parts are element-wise equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Vec<KeyPart>);

impl QueryKey {
  pub fn new() -> Self {
    Self::default()
  }

  /// Append a part, builder style.
  pub fn push(mut self, part: impl Into<KeyPart>) -> Self {
    self.0.push(part.into());
    self
  }
}

impl fmt::Display for QueryKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "[")?;
    for (i, part) in self.0.iter().enumerate() {
      if i > 0 {
        write!(f, ",")?;
      }
      write!(f, "{}", part)?;
    }
    write!(f, "]")
  }
}

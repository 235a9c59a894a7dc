//! Structural query keys.

use std::fmt;

/// One primitive component of a [`QueryKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyPart {
  Str(String),
  Int(i64),
  Bool(bool),
}

impl fmt::Display for KeyPart {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      KeyPart::Str(s) => write!(f, "{:?}", s),
      KeyPart::Int(i) => write!(f, "{}", i),
      KeyPart::Bool(b) => write!(f, "{}", b),
    }
  }
}

impl From<&str> for KeyPart {
  fn from(value: &str) -> Self {
    KeyPart::Str(value.to_string())
  }
}

impl From<String> for KeyPart {
  fn from(value: String) -> Self {
    KeyPart::Str(value)
  }
}

impl From<i64> for KeyPart {
  fn from(value: i64) -> Self {
    KeyPart::Int(value)
  }
}

impl From<bool> for KeyPart {
  fn from(value: bool) -> Self {
    KeyPart::Bool(value)
  }
}

/// Identifies a logical query. Equal sequences are the same query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Vec<KeyPart>);

impl QueryKey {
  pub fn new(root: impl Into<KeyPart>) -> Self {
    Self(vec![root.into()])
  }
}

impl<P: Into<KeyPart>> FromIterator<P> for QueryKey {
  fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
    Self(iter.into_iter().map(Into::into).collect())
  }
}

impl fmt::Display for QueryKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("[")?;
    for (i, part) in self.0.iter().enumerate() {
      if i > 0 {
        f.write_str(", ")?;
      }
      write!(f, "{}", part)?;
    }
    f.write_str("]")
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashSet;

  #[test]
  fn test_structural_equality() {
    let a: QueryKey = [KeyPart::from("reportLogs"), KeyPart::Int(42)]
      .into_iter()
      .collect();
    let b: QueryKey = vec![KeyPart::Str("reportLogs".to_string()), 42i64.into()]
      .into_iter()
      .collect();
    assert_eq!(a, b);
    assert_eq!(QueryKey::new("health"), ["health"].into_iter().collect::<QueryKey>());

    let mut set = HashSet::new();
    set.insert(a);
    assert!(set.contains(&b));
  }

  #[test]
  fn test_order_matters() {
    let a: QueryKey = ["a", "b"].into_iter().collect();
    let b: QueryKey = ["b", "a"].into_iter().collect();
    assert_ne!(a, b);
  }

  #[test]
  fn test_display() {
    let key: QueryKey = [KeyPart::from("companies"), true.into(), 3i64.into()]
      .into_iter()
      .collect();
    assert_eq!(key.to_string(), r#"["companies", true, 3]"#);
  }
}

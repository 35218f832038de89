//! Exclusion categories and their engine fields.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the three fixed exclusion groups.
///
/// Declaration order is emission order: predicates for `Price` always come
/// before `Duration`, which come before `Volume`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Price,
    Duration,
    Volume,
}

impl Category {
    /// All categories in emission order.
    pub const ALL: [Category; 3] = [Category::Price, Category::Duration, Category::Volume];

    /// Column name the backtest engine filters on.
    pub fn field(self) -> &'static str {
        match self {
            Category::Price => "close",
            Category::Duration => "left_years",
            Category::Volume => "amount",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Price => "price",
            Category::Duration => "duration",
            Category::Volume => "volume",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Category::Price => 0,
            Category::Duration => 1,
            Category::Volume => 2,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when parsing an unknown category name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category '{0}' (expected price, duration or volume)")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "price" => Ok(Category::Price),
            "duration" => Ok(Category::Duration),
            "volume" => Ok(Category::Volume),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_mapping_is_fixed() {
        assert_eq!(Category::Price.field(), "close");
        assert_eq!(Category::Duration.field(), "left_years");
        assert_eq!(Category::Volume.field(), "amount");
    }

    #[test]
    fn all_is_in_index_order() {
        for (i, c) in Category::ALL.iter().enumerate() {
            assert_eq!(c.index(), i);
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("Volume".parse::<Category>().unwrap(), Category::Volume);
        assert!("yield".parse::<Category>().is_err());
    }
}

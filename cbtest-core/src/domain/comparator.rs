//! Comparator vocabulary for exclusion conditions.

use std::fmt;
use std::str::FromStr;

/// The five comparators the engine understands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Comparator {
    #[default]
    Lt,
    Gt,
    Eq,
    Le,
    Ge,
}

impl Comparator {
    pub const ALL: [Comparator; 5] = [
        Comparator::Lt,
        Comparator::Gt,
        Comparator::Eq,
        Comparator::Le,
        Comparator::Ge,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Comparator::Lt => "<",
            Comparator::Gt => ">",
            Comparator::Eq => "==",
            Comparator::Le => "<=",
            Comparator::Ge => ">=",
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A token outside the comparator vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid comparator '{0}' (expected one of <, >, ==, <=, >=)")]
pub struct InvalidComparator(pub String);

impl FromStr for Comparator {
    type Err = InvalidComparator;

    /// Exact match only; surrounding whitespace is not accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Comparator::ALL
            .into_iter()
            .find(|c| c.symbol() == s)
            .ok_or_else(|| InvalidComparator(s.to_string()))
    }
}

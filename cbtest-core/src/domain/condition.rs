//! Exclusion conditions and the fixed set of condition groups.

use serde::{Deserialize, Serialize};

use super::category::Category;
use super::comparator::Comparator;

/// A `{comparator, threshold}` pair as edited.
///
/// The comparator is kept in its editable token form. Documents loaded from
/// disk may carry tokens outside the vocabulary; the compiler rejects those.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub comparator: String,
    #[serde(alias = "value")]
    pub threshold: f64,
}

impl Condition {
    pub fn new(comparator: Comparator, threshold: f64) -> Self {
        Self {
            comparator: comparator.symbol().to_string(),
            threshold,
        }
    }
}

impl Default for Condition {
    /// `< 0`, the row appended by "add condition".
    fn default() -> Self {
        Self::new(Comparator::default(), 0.0)
    }
}

/// One category's gate plus its ordered conditions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionGroup {
    pub enabled: bool,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl ConditionGroup {
    pub fn new(enabled: bool, conditions: Vec<Condition>) -> Self {
        Self {
            enabled,
            conditions,
        }
    }
}

/// The three condition groups, addressed by [`Category`].
///
/// Every category always has exactly one group; there is no way to add or
/// drop a category at runtime.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExclusionGroups {
    #[serde(default)]
    pub price: ConditionGroup,
    #[serde(default)]
    pub duration: ConditionGroup,
    #[serde(default)]
    pub volume: ConditionGroup,
}

impl ExclusionGroups {
    pub fn group(&self, category: Category) -> &ConditionGroup {
        match category {
            Category::Price => &self.price,
            Category::Duration => &self.duration,
            Category::Volume => &self.volume,
        }
    }

    pub fn group_mut(&mut self, category: Category) -> &mut ConditionGroup {
        match category {
            Category::Price => &mut self.price,
            Category::Duration => &mut self.duration,
            Category::Volume => &mut self.volume,
        }
    }

    /// Groups in emission order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &ConditionGroup)> + '_ {
        Category::ALL.into_iter().map(move |c| (c, self.group(c)))
    }
}

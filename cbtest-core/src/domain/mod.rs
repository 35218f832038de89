//! Domain types for the editable strategy configuration.

pub mod category;
pub mod comparator;
pub mod condition;
pub mod dates;
pub mod factors;

pub use category::{Category, UnknownCategory};
pub use comparator::{Comparator, InvalidComparator};
pub use condition::{Condition, ConditionGroup, ExclusionGroups};
pub use dates::{DateField, DateRange};
pub use factors::ScoreFactorSet;

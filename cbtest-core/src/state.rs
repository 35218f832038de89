//! Strategy state store — the editable backtest configuration.
//!
//! All mutation goes through the named operations below. A failed operation
//! returns an error and leaves the state exactly as it was, so every state
//! reachable through the store satisfies the data-model invariants:
//! - each date is empty or a valid `YYYY-MM-DD` calendar date
//! - every category has exactly one condition group
//! - factor and weight lists have equal length
//!
//! Numeric validity (NaN thresholds, weights, rates) is deliberately *not*
//! enforced here; the compiler rejects those.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{
    dates, Category, Comparator, Condition, ConditionGroup, DateField, DateRange, ExclusionGroups,
    InvalidComparator, ScoreFactorSet,
};
use crate::input::coerce_number;

/// Errors from state-store operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StateError {
    #[error("invalid {field} '{value}': expected YYYY-MM-DD or empty")]
    InvalidDate { field: DateField, value: String },

    #[error(transparent)]
    InvalidComparator(#[from] InvalidComparator),

    #[error("{category} condition index {index} out of range (len {len})")]
    ConditionIndexOutOfRange {
        category: Category,
        index: usize,
        len: usize,
    },

    #[error("weight index {index} out of range (len {len})")]
    WeightIndexOutOfRange { index: usize, len: usize },

    #[error("{factors} score factors but {weights} weights")]
    FactorWeightMismatch { factors: usize, weights: usize },
}

/// Which part of a condition an edit targets.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionEdit {
    /// Comparator token; rejected unless it is in the vocabulary.
    Comparator(String),
    Threshold(f64),
    /// Raw text from an input box, coerced with [`coerce_number`].
    ThresholdText(String),
}

/// A scalar strategy setting. Rates are fractions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    HoldNum(u32),
    StopProfit(f64),
    FeeRate(f64),
}

/// Scalar settings of the strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySettings {
    pub hold_num: u32,
    pub stop_profit: f64,
    pub fee_rate: f64,
}

impl Default for StrategySettings {
    fn default() -> Self {
        Self {
            hold_num: 5,
            stop_profit: 0.03,
            fee_rate: 0.002,
        }
    }
}

/// The `strategy` block of the editable state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditableStrategy {
    exclude_conditions: ExclusionGroups,
    #[serde(flatten)]
    factors: ScoreFactorSet,
    #[serde(flatten)]
    settings: StrategySettings,
}

/// Complete editable configuration: date range plus strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyState {
    data: DateRange,
    strategy: EditableStrategy,
}

impl Default for StrategyState {
    /// The fixed default snapshot the editor starts from.
    fn default() -> Self {
        let lt = |v| Condition::new(Comparator::Lt, v);
        let gt = |v| Condition::new(Comparator::Gt, v);
        Self {
            data: DateRange::new("2022-08-01", "2025-12-31"),
            strategy: EditableStrategy {
                exclude_conditions: ExclusionGroups {
                    price: ConditionGroup::new(true, vec![lt(102.0), gt(155.0)]),
                    duration: ConditionGroup::new(true, vec![lt(0.7)]),
                    volume: ConditionGroup::new(true, vec![lt(1000.0)]),
                },
                factors: ScoreFactorSet::convertible_bond_defaults(),
                settings: StrategySettings::default(),
            },
        }
    }
}

impl StrategyState {
    /// Assemble a state from parts, checking the date invariant.
    pub fn from_parts(
        data: DateRange,
        exclude_conditions: ExclusionGroups,
        factors: ScoreFactorSet,
        settings: StrategySettings,
    ) -> Result<Self, StateError> {
        let state = Self {
            data,
            strategy: EditableStrategy {
                exclude_conditions,
                factors,
                settings,
            },
        };
        state.check_invariants()?;
        Ok(state)
    }

    /// Check invariants that deserialization alone cannot guarantee.
    ///
    /// Used after loading a state document from disk.
    pub fn check_invariants(&self) -> Result<(), StateError> {
        for field in [DateField::Start, DateField::End] {
            let value = self.data.get(field);
            if !dates::is_valid_field(value) {
                return Err(StateError::InvalidDate {
                    field,
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn dates(&self) -> &DateRange {
        &self.data
    }

    pub fn groups(&self) -> &ExclusionGroups {
        &self.strategy.exclude_conditions
    }

    pub fn group(&self, category: Category) -> &ConditionGroup {
        self.strategy.exclude_conditions.group(category)
    }

    pub fn factors(&self) -> &ScoreFactorSet {
        &self.strategy.factors
    }

    pub fn settings(&self) -> &StrategySettings {
        &self.strategy.settings
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Replace the start or end date. `value` must be empty or `YYYY-MM-DD`.
    pub fn set_date_field(&mut self, field: DateField, value: &str) -> Result<(), StateError> {
        if !dates::is_valid_field(value) {
            return Err(StateError::InvalidDate {
                field,
                value: value.to_string(),
            });
        }
        *self.data.get_mut(field) = value.to_string();
        Ok(())
    }

    /// Flip a group's gate. Conditions are kept, so re-enabling restores them.
    pub fn toggle_group(&mut self, category: Category, enabled: bool) {
        self.group_mut(category).enabled = enabled;
    }

    pub fn set_condition(
        &mut self,
        category: Category,
        index: usize,
        edit: ConditionEdit,
    ) -> Result<(), StateError> {
        let condition = self.condition_mut(category, index)?;
        match edit {
            ConditionEdit::Comparator(token) => {
                let comparator: Comparator = token.parse()?;
                condition.comparator = comparator.symbol().to_string();
            }
            ConditionEdit::Threshold(value) => condition.threshold = value,
            ConditionEdit::ThresholdText(text) => condition.threshold = coerce_number(&text),
        }
        Ok(())
    }

    /// Append `< 0` to the group.
    pub fn add_condition(&mut self, category: Category) {
        self.group_mut(category).conditions.push(Condition::default());
    }

    /// Remove one condition, keeping the relative order of the rest.
    ///
    /// Emptying a group does not disable it.
    pub fn remove_condition(&mut self, category: Category, index: usize) -> Result<(), StateError> {
        let conditions = &mut self.group_mut(category).conditions;
        if index >= conditions.len() {
            return Err(StateError::ConditionIndexOutOfRange {
                category,
                index,
                len: conditions.len(),
            });
        }
        conditions.remove(index);
        Ok(())
    }

    pub fn set_weight(&mut self, index: usize, value: f64) -> Result<(), StateError> {
        self.strategy.factors.set_weight(index, value)
    }

    /// Weight edit from an input box; non-numeric text becomes NaN.
    pub fn set_weight_text(&mut self, index: usize, text: &str) -> Result<(), StateError> {
        self.set_weight(index, coerce_number(text))
    }

    pub fn set_scalar(&mut self, scalar: Scalar) {
        let settings = &mut self.strategy.settings;
        match scalar {
            Scalar::HoldNum(n) => settings.hold_num = n,
            Scalar::StopProfit(rate) => settings.stop_profit = rate,
            Scalar::FeeRate(rate) => settings.fee_rate = rate,
        }
    }

    /// Restore the default snapshot.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn group_mut(&mut self, category: Category) -> &mut ConditionGroup {
        self.strategy.exclude_conditions.group_mut(category)
    }

    fn condition_mut(
        &mut self,
        category: Category,
        index: usize,
    ) -> Result<&mut Condition, StateError> {
        let conditions = &mut self.group_mut(category).conditions;
        let len = conditions.len();
        conditions
            .get_mut(index)
            .ok_or(StateError::ConditionIndexOutOfRange {
                category,
                index,
                len,
            })
    }
}

//! Configuration compiler — state snapshot in, engine payload out.
//!
//! `compile()` is a pure function of the state: it validates everything
//! first and only then assembles the payload, so a failed compile never
//! yields a partial or garbled body.
//!
//! Four steps:
//! 1. Date normalization: `YYYY-MM-DD` → `YYYYMMDD`, empty stays empty.
//! 2. Predicate compilation: enabled groups in category order, conditions
//!    in edit order, each rendered as `"<field> <comparator> <threshold>"`.
//! 3. Scalar passthrough: factors, weights, hold count and rates verbatim.
//! 4. Payload assembly: one strategy plus the fixed output path.

use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::domain::{dates, Category, Comparator, DateField, DateRange};
use crate::payload::{CompiledPayload, DataSection, StrategySection};
use crate::state::{StrategySettings, StrategyState};

/// Why a state could not be compiled. Each variant names the offending spot.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("date range is half set (start '{start}', end '{end}'): set both or neither")]
    IncompleteDateRange { start: String, end: String },

    #[error("invalid {field} '{value}': expected YYYY-MM-DD")]
    InvalidDate { field: DateField, value: String },

    #[error("{category} condition {index}: invalid comparator '{token}'")]
    InvalidComparator {
        category: Category,
        index: usize,
        token: String,
    },

    #[error("{category} condition {index}: threshold is not a finite number")]
    NonFiniteThreshold { category: Category, index: usize },

    #[error("weight {index} ({factor}) is not a finite number")]
    NonFiniteWeight { index: usize, factor: String },

    #[error("hold_num must be greater than 0")]
    InvalidHoldNum,

    #[error("{name} must be a finite number >= 0 (got {value})")]
    InvalidRate { name: &'static str, value: f64 },
}

/// A single compiled exclusion predicate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Predicate {
    pub category: Category,
    pub comparator: Comparator,
    pub threshold: f64,
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.category.field(),
            self.comparator,
            render_threshold(self.threshold)
        )
    }
}

/// Shortest decimal that round-trips: `102`, `0.7`, never `102.0` or `1e3`.
pub fn render_threshold(value: f64) -> String {
    // -0.0 would print as "-0".
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{value}")
}

/// Compile a state snapshot into the engine payload.
pub fn compile(state: &StrategyState) -> Result<CompiledPayload, CompileError> {
    let data = normalize_dates(state.dates())?;
    let predicates = compile_predicates(state)?;
    check_weights(state)?;
    check_settings(state.settings())?;

    let factors = state.factors();
    let settings = state.settings();
    let strategy = StrategySection {
        exclude_conditions: predicates.iter().map(ToString::to_string).collect(),
        score_factors: factors.factors().to_vec(),
        weights: factors.weights().to_vec(),
        hold_num: settings.hold_num,
        stop_profit: settings.stop_profit,
        fee_rate: settings.fee_rate,
    };

    let payload = CompiledPayload::new(data, strategy);
    let fingerprint = payload.fingerprint();
    debug!(
        predicates = predicates.len(),
        fingerprint = fingerprint.short(),
        "compiled strategy payload"
    );
    Ok(payload)
}

/// Date section with separators stripped.
///
/// Both empty or both valid; a half-set range is an error.
pub fn normalize_dates(range: &DateRange) -> Result<DataSection, CompileError> {
    for field in [DateField::Start, DateField::End] {
        let value = range.get(field);
        if !dates::is_valid_field(value) {
            return Err(CompileError::InvalidDate {
                field,
                value: value.to_string(),
            });
        }
    }
    if range.start_date.is_empty() != range.end_date.is_empty() {
        return Err(CompileError::IncompleteDateRange {
            start: range.start_date.clone(),
            end: range.end_date.clone(),
        });
    }
    Ok(DataSection {
        start_date: dates::compact(&range.start_date),
        end_date: dates::compact(&range.end_date),
    })
}

/// Predicates of all enabled groups, price first, then duration, then volume.
///
/// Disabled groups are skipped without validation: their conditions are
/// kept for re-enabling but never reach the engine.
pub fn compile_predicates(state: &StrategyState) -> Result<Vec<Predicate>, CompileError> {
    let mut out = Vec::new();
    for (category, group) in state.groups().iter() {
        if !group.enabled {
            continue;
        }
        for (index, condition) in group.conditions.iter().enumerate() {
            let comparator = condition.comparator.parse::<Comparator>().map_err(|_| {
                CompileError::InvalidComparator {
                    category,
                    index,
                    token: condition.comparator.clone(),
                }
            })?;
            if !condition.threshold.is_finite() {
                return Err(CompileError::NonFiniteThreshold { category, index });
            }
            out.push(Predicate {
                category,
                comparator,
                threshold: condition.threshold,
            });
        }
    }
    Ok(out)
}

fn check_weights(state: &StrategyState) -> Result<(), CompileError> {
    match state
        .factors()
        .pairs()
        .enumerate()
        .find(|(_, (_, w))| !w.is_finite())
    {
        Some((index, (factor, _))) => Err(CompileError::NonFiniteWeight {
            index,
            factor: factor.to_string(),
        }),
        None => Ok(()),
    }
}

fn check_settings(settings: &StrategySettings) -> Result<(), CompileError> {
    if settings.hold_num == 0 {
        return Err(CompileError::InvalidHoldNum);
    }
    for (name, value) in [
        ("stop_profit", settings.stop_profit),
        ("fee_rate", settings.fee_rate),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(CompileError::InvalidRate { name, value });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ConditionEdit, Scalar};

    #[test]
    fn render_threshold_is_canonical() {
        assert_eq!(render_threshold(102.0), "102");
        assert_eq!(render_threshold(0.7), "0.7");
        assert_eq!(render_threshold(1000.0), "1000");
        assert_eq!(render_threshold(-0.0), "0");
        assert_eq!(render_threshold(-2.5), "-2.5");
        assert_eq!(render_threshold(1e21), "1000000000000000000000");
    }

    #[test]
    fn default_state_compiles_every_group() {
        let payload = compile(&StrategyState::default()).unwrap();
        assert_eq!(
            payload.exclude_conditions(),
            &["close < 102", "close > 155", "left_years < 0.7", "amount < 1000"]
        );
        assert_eq!(payload.data().start_date, "20220801");
        assert_eq!(payload.data().end_date, "20251231");
        assert_eq!(payload.output_path(), "result/backtest_output.xlsx");
        assert_eq!(payload.strategies().len(), 1);
    }

    #[test]
    fn empty_dates_pass_through() {
        let mut state = StrategyState::default();
        state.set_date_field(DateField::Start, "").unwrap();
        state.set_date_field(DateField::End, "").unwrap();
        let payload = compile(&state).unwrap();
        assert_eq!(payload.data().start_date, "");
        assert_eq!(payload.data().end_date, "");
    }

    #[test]
    fn half_set_range_is_rejected() {
        let mut state = StrategyState::default();
        state.set_date_field(DateField::End, "").unwrap();
        assert!(matches!(
            compile(&state),
            Err(CompileError::IncompleteDateRange { .. })
        ));
    }

    #[test]
    fn nan_threshold_blocks_compilation() {
        let mut state = StrategyState::default();
        state
            .set_condition(Category::Volume, 0, ConditionEdit::ThresholdText("lots".into()))
            .unwrap();
        assert_eq!(
            compile(&state),
            Err(CompileError::NonFiniteThreshold {
                category: Category::Volume,
                index: 0
            })
        );
    }

    #[test]
    fn nan_in_disabled_group_is_ignored() {
        let mut state = StrategyState::default();
        state
            .set_condition(Category::Volume, 0, ConditionEdit::ThresholdText("lots".into()))
            .unwrap();
        state.toggle_group(Category::Volume, false);
        assert!(compile(&state).is_ok());
    }

    #[test]
    fn nan_weight_blocks_compilation() {
        let mut state = StrategyState::default();
        state.set_weight_text(1, "ten").unwrap();
        assert_eq!(
            compile(&state),
            Err(CompileError::NonFiniteWeight {
                index: 1,
                factor: "ytm".into()
            })
        );
    }

    #[test]
    fn zero_hold_num_and_negative_rates_are_rejected() {
        let mut state = StrategyState::default();
        state.set_scalar(Scalar::HoldNum(0));
        assert_eq!(compile(&state), Err(CompileError::InvalidHoldNum));

        let mut state = StrategyState::default();
        state.set_scalar(Scalar::FeeRate(-0.001));
        assert!(matches!(
            compile(&state),
            Err(CompileError::InvalidRate { name: "fee_rate", .. })
        ));

        let mut state = StrategyState::default();
        state.set_scalar(Scalar::StopProfit(f64::NAN));
        assert!(matches!(
            compile(&state),
            Err(CompileError::InvalidRate { name: "stop_profit", .. })
        ));
    }

    #[test]
    fn scalars_pass_through_verbatim() {
        let mut state = StrategyState::default();
        state.set_scalar(Scalar::StopProfit(0.05));
        let payload = compile(&state).unwrap();
        let strategy = &payload.strategies()[0];
        assert_eq!(strategy.stop_profit, 0.05);
        assert_eq!(strategy.fee_rate, 0.002);
        assert_eq!(strategy.hold_num, 5);
        assert_eq!(strategy.score_factors, vec!["bond_prem", "ytm", "turnover_5"]);
        assert_eq!(strategy.weights, vec![-10.0, 10.0, 5.0]);
    }

    #[test]
    fn predicate_display_uses_engine_field() {
        let p = Predicate {
            category: Category::Duration,
            comparator: Comparator::Ge,
            threshold: 1.5,
        };
        assert_eq!(p.to_string(), "left_years >= 1.5");
    }
}

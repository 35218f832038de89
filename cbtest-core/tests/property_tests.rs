//! Property tests for compiler invariants.
//!
//! Uses proptest to verify:
//! 1. Category order — predicates always come out price, duration, volume
//! 2. Disabled groups — contribute nothing, and re-enabling restores them exactly
//! 3. Date normalization — 8-digit output, injective over valid dates
//! 4. Idempotence — same state, byte-identical JSON
//! 5. Positional weights — only explicit index edits change the mapping

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

use cbtest_core::domain::{dates, ExclusionGroups, ScoreFactorSet};
use cbtest_core::{
    compile, Category, Comparator, Condition, ConditionGroup, DateRange, StrategySettings,
    StrategyState,
};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_condition() -> impl Strategy<Value = Condition> {
    (
        prop::sample::select(Comparator::ALL.to_vec()),
        (-1.0e6..1.0e6_f64).prop_map(|v| (v * 1000.0).round() / 1000.0),
    )
        .prop_map(|(c, v)| Condition::new(c, v))
}

fn arb_group() -> impl Strategy<Value = ConditionGroup> {
    (any::<bool>(), prop::collection::vec(arb_condition(), 0..5))
        .prop_map(|(enabled, conditions)| ConditionGroup::new(enabled, conditions))
}

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    let base = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
    (0i64..20_000).prop_map(move |d| base + Duration::days(d))
}

fn arb_factors() -> impl Strategy<Value = ScoreFactorSet> {
    prop::collection::vec(("[a-z_]{2,10}", -50.0..50.0_f64), 1..6).prop_map(|pairs| {
        let (factors, weights): (Vec<String>, Vec<f64>) = pairs.into_iter().unzip();
        ScoreFactorSet::new(factors, weights).unwrap()
    })
}

fn arb_state() -> impl Strategy<Value = StrategyState> {
    (arb_group(), arb_group(), arb_group(), arb_date(), arb_date(), arb_factors()).prop_map(
        |(price, duration, volume, a, b, factors)| {
            let range = DateRange::new(
                a.format("%Y-%m-%d").to_string(),
                b.format("%Y-%m-%d").to_string(),
            );
            StrategyState::from_parts(
                range,
                ExclusionGroups {
                    price,
                    duration,
                    volume,
                },
                factors,
                StrategySettings::default(),
            )
            .unwrap()
        },
    )
}

fn category_of(predicate: &str) -> usize {
    let field = predicate.split(' ').next().unwrap();
    Category::ALL
        .iter()
        .find(|c| c.field() == field)
        .map(|c| c.index())
        .unwrap_or_else(|| panic!("unknown field in {predicate}"))
}

// ── 1. Category order ────────────────────────────────────────────────

proptest! {
    #[test]
    fn predicates_follow_category_order(state in arb_state()) {
        let payload = compile(&state).unwrap();
        let order: Vec<usize> = payload.exclude_conditions().iter().map(|p| category_of(p)).collect();
        prop_assert!(order.windows(2).all(|w| w[0] <= w[1]), "out of order: {:?}", order);

        let expected: usize = state
            .groups()
            .iter()
            .filter(|(_, g)| g.enabled)
            .map(|(_, g)| g.conditions.len())
            .sum();
        prop_assert_eq!(payload.exclude_conditions().len(), expected);
    }

    /// Toggle history doesn't matter, only the final flags.
    #[test]
    fn toggle_sequence_does_not_change_order(
        state in arb_state(),
        toggles in prop::collection::vec((0usize..3, any::<bool>()), 0..10),
    ) {
        let mut edited = state.clone();
        for (i, enabled) in toggles {
            edited.toggle_group(Category::ALL[i], enabled);
        }
        for c in Category::ALL {
            edited.toggle_group(c, state.group(c).enabled);
        }
        prop_assert_eq!(compile(&edited).unwrap(), compile(&state).unwrap());
    }
}

// ── 2. Disabled groups ───────────────────────────────────────────────

proptest! {
    #[test]
    fn disabling_removes_and_reenabling_restores(state in arb_state(), i in 0usize..3) {
        let category = Category::ALL[i];
        let mut state = state;
        state.toggle_group(category, true);
        let before = compile(&state).unwrap();

        state.toggle_group(category, false);
        let disabled = compile(&state).unwrap();
        prop_assert!(disabled.exclude_conditions().iter().all(|p| category_of(p) != i));

        state.toggle_group(category, true);
        let restored = compile(&state).unwrap();
        prop_assert_eq!(restored.exclude_conditions(), before.exclude_conditions());
    }
}

// ── 3. Date normalization ────────────────────────────────────────────

proptest! {
    #[test]
    fn compact_dates_are_eight_digits(d in arb_date()) {
        let iso = d.format("%Y-%m-%d").to_string();
        prop_assert!(dates::is_valid_field(&iso));
        let compact = dates::compact(&iso);
        prop_assert_eq!(compact.len(), 8);
        prop_assert!(compact.bytes().all(|b| b.is_ascii_digit()));
        prop_assert_eq!(compact, d.format("%Y%m%d").to_string());
    }

    #[test]
    fn compact_is_injective(a in arb_date(), b in arb_date()) {
        prop_assume!(a != b);
        let ca = dates::compact(&a.format("%Y-%m-%d").to_string());
        let cb = dates::compact(&b.format("%Y-%m-%d").to_string());
        prop_assert_ne!(ca, cb);
    }
}

// ── 4. Idempotence ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn compile_is_idempotent(state in arb_state()) {
        let first = compile(&state).unwrap();
        let second = compile(&state).unwrap();
        prop_assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
        prop_assert_eq!(first.fingerprint(), second.fingerprint());
    }
}

// ── 5. Positional weights ────────────────────────────────────────────

proptest! {
    #[test]
    fn weights_stay_aligned_with_factors(
        state in arb_state(),
        edits in prop::collection::vec((0usize..8, -100.0..100.0_f64), 0..12),
    ) {
        let mut state = state;
        let factors = state.factors().factors().to_vec();
        let mut expected = state.factors().weights().to_vec();

        for (index, value) in edits {
            let result = state.set_weight(index, value);
            if index < expected.len() {
                prop_assert!(result.is_ok());
                expected[index] = value;
            } else {
                prop_assert!(result.is_err());
            }
        }

        let payload = compile(&state).unwrap();
        let strategy = &payload.strategies()[0];
        prop_assert_eq!(&strategy.score_factors, &factors);
        prop_assert_eq!(&strategy.weights, &expected);
    }
}

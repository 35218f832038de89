//! cbtest core — editable strategy state and the configuration compiler.
//!
//! This crate is pure: no I/O, no clocks, no globals.
//! - Domain types (categories, comparators, conditions, factors, dates)
//! - Strategy state store with named, invariant-preserving edits
//! - Edit-boundary conversions (percent ↔ fraction, text → number)
//! - Compiler producing the engine payload

pub mod compiler;
pub mod domain;
pub mod input;
pub mod payload;
pub mod state;

pub use compiler::{compile, CompileError, Predicate};
pub use domain::{Category, Comparator, Condition, ConditionGroup, DateField, DateRange};
pub use payload::{CompiledPayload, DataSection, PayloadFingerprint, StrategySection, OUTPUT_PATH};
pub use state::{ConditionEdit, Scalar, StateError, StrategySettings, StrategyState};

//! Compiled payload — the engine-ready request body.
//!
//! Built only by the compiler and never mutated afterwards: fields are
//! private and exposed through accessors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the engine writes its workbook. Fixed; the editor never changes it.
pub const OUTPUT_PATH: &str = "result/backtest_output.xlsx";

/// Normalized date section: `YYYYMMDD` or empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSection {
    pub start_date: String,
    pub end_date: String,
}

/// One compiled strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySection {
    pub exclude_conditions: Vec<String>,
    pub score_factors: Vec<String>,
    pub weights: Vec<f64>,
    pub hold_num: u32,
    pub stop_profit: f64,
    pub fee_rate: f64,
}

/// The request body posted to the backtest engine.
///
/// The wire format allows several strategies per request; the compiler
/// always produces exactly one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledPayload {
    data: DataSection,
    strategies: Vec<StrategySection>,
    output_path: String,
}

impl CompiledPayload {
    pub(crate) fn new(data: DataSection, strategy: StrategySection) -> Self {
        Self {
            data,
            strategies: vec![strategy],
            output_path: OUTPUT_PATH.to_string(),
        }
    }

    pub fn data(&self) -> &DataSection {
        &self.data
    }

    pub fn strategies(&self) -> &[StrategySection] {
        &self.strategies
    }

    pub fn output_path(&self) -> &str {
        &self.output_path
    }

    /// Predicate strings of the first (only) strategy.
    pub fn exclude_conditions(&self) -> &[String] {
        self.strategies
            .first()
            .map(|s| s.exclude_conditions.as_slice())
            .unwrap_or(&[])
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// BLAKE3 of the compact JSON body.
    ///
    /// Field order is fixed by the struct definitions, so equal payloads always
    /// hash equal. Used to correlate compiles and submissions in logs.
    pub fn fingerprint(&self) -> PayloadFingerprint {
        let json = serde_json::to_vec(self).expect("CompiledPayload must serialize");
        PayloadFingerprint(blake3::hash(&json).to_hex().to_string())
    }
}

/// Hex digest identifying a payload's exact content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PayloadFingerprint(pub String);

impl PayloadFingerprint {
    /// First 12 hex characters, enough for log lines.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for PayloadFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

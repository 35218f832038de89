//! State documents — the editable configuration on disk.
//!
//! A document has the same shape the editor keeps in memory:
//!
//! ```toml
//! [data]
//! start_date = "2022-08-01"
//! end_date = "2025-12-31"
//!
//! [strategy]
//! score_factors = ["bond_prem", "ytm", "turnover_5"]
//! weights = [-10, 10, 5]
//! hold_num = 5
//! stop_profit = 0.03
//! fee_rate = 0.002
//!
//! [strategy.exclude_conditions.price]
//! enabled = true
//! conditions = [{ comparator = "<", value = 102 }, { comparator = ">", value = 155 }]
//! ```
//!
//! Loading checks the store invariants (dates, factor/weight lengths).
//! Comparator tokens and numeric ranges are left to the compiler.

use std::path::{Path, PathBuf};

use cbtest_core::{StateError, StrategyState};
use thiserror::Error;

/// Errors from loading or writing state documents and environment config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse state document: {0}")]
    Parse(String),

    #[error("invalid state document: {0}")]
    Invalid(#[from] StateError),

    #[error("serialize state document: {0}")]
    Serialize(String),

    #[error("invalid environment: {0}")]
    Env(String),
}

/// Load/save for [`StrategyState`] documents.
pub trait StateDocument: Sized {
    fn from_toml(content: &str) -> Result<Self, ConfigError>;
    fn from_json(content: &str) -> Result<Self, ConfigError>;

    /// `.json` files are read as JSON, everything else as TOML.
    fn from_file(path: &Path) -> Result<Self, ConfigError>;

    fn to_toml(&self) -> Result<String, ConfigError>;
}

impl StateDocument for StrategyState {
    fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let state: StrategyState =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        state.check_invariants()?;
        Ok(state)
    }

    fn from_json(content: &str) -> Result<Self, ConfigError> {
        let state: StrategyState =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        state.check_invariants()?;
        Ok(state)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json(&content)
        } else {
            Self::from_toml(&content)
        }
    }

    fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cbtest_core::{Category, DateField};

    const SAMPLE: &str = r#"
[data]
start_date = "2023-01-03"
end_date = "2024-06-28"

[strategy]
score_factors = ["bond_prem", "ytm"]
weights = [-10, 10]
hold_num = 8
stop_profit = 0.05
fee_rate = 0.001

[strategy.exclude_conditions.price]
enabled = true
conditions = [{ comparator = "<", value = 100 }]

[strategy.exclude_conditions.duration]
enabled = false
conditions = [{ comparator = "<", threshold = 0.5 }]
"#;

    #[test]
    fn parses_toml_document() {
        let state = StrategyState::from_toml(SAMPLE).unwrap();
        assert_eq!(state.dates().start_date, "2023-01-03");
        assert_eq!(state.settings().hold_num, 8);
        assert_eq!(state.factors().weights(), &[-10.0, 10.0]);
        assert!(!state.group(Category::Duration).enabled);
        assert_eq!(state.group(Category::Duration).conditions[0].threshold, 0.5);
        // Missing groups default to disabled and empty.
        assert!(!state.group(Category::Volume).enabled);
        assert!(state.group(Category::Volume).conditions.is_empty());
    }

    #[test]
    fn rejects_invalid_dates() {
        let doc = SAMPLE.replace("2023-01-03", "2023-13-03");
        let err = StrategyState::from_toml(&doc).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid(StateError::InvalidDate {
                field: DateField::Start,
                ..
            })
        ));
    }

    #[test]
    fn rejects_mismatched_weights() {
        let doc = SAMPLE.replace("weights = [-10, 10]", "weights = [-10]");
        assert!(matches!(
            StrategyState::from_toml(&doc),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn default_state_round_trips_through_toml() {
        let state = StrategyState::default();
        let text = state.to_toml().unwrap();
        assert_eq!(StrategyState::from_toml(&text).unwrap(), state);
    }

    #[test]
    fn json_document_parses() {
        let json = serde_json::to_string(&StrategyState::default()).unwrap();
        assert_eq!(
            StrategyState::from_json(&json).unwrap(),
            StrategyState::default()
        );
    }
}
